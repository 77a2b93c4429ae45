//! Tests for the built-in library as script code sees it.

extern crate just_vm;

use just_vm::runner::ds::operations::object::get;
use just_vm::runner::ds::value::{JsNumberType, JsValue};
use just_vm::Isolate;

fn run_js(code: &str) -> Result<JsValue, JsValue> {
    let isolate = Isolate::new();
    let program = isolate
        .compile(code, "std_lib.js")
        .map_err(|d| JsValue::String(d.message))?;
    let mut scope = isolate.enter(&isolate.main_realm());
    scope.execute(&program, "std_lib.js")
}

fn eval(code: &str) -> JsValue {
    match run_js(code) {
        Ok(v) => v,
        Err(e) => panic!("{} threw {:?}", code, e),
    }
}

fn eval_str(code: &str) -> String {
    match eval(code) {
        JsValue::String(s) => s,
        other => panic!("{} evaluated to {:?}, not a string", code, other),
    }
}

/// `"Name: message"` of the Error object `code` throws.
fn eval_error(code: &str) -> String {
    let isolate = Isolate::new();
    let program = isolate.compile(code, "std_lib.js").unwrap();
    let mut scope = isolate.enter(&isolate.main_realm());
    match scope.execute(&program, "std_lib.js") {
        Err(JsValue::Object(e)) => format!(
            "{}: {}",
            get(&e, "name").unwrap().as_str().unwrap_or(""),
            get(&e, "message").unwrap().as_str().unwrap_or("")
        ),
        other => panic!("{} did not throw an Error object: {:?}", code, other),
    }
}

fn int(i: i64) -> JsValue {
    JsValue::Number(JsNumberType::Integer(i))
}

// ============================================================================
// Object Tests
// ============================================================================

#[test]
fn test_object_keys_in_insertion_order() {
    assert_eq!(eval_str("Object.keys({b: 1, a: 2, c: 3}).join(',')"), "b,a,c");
}

#[test]
fn test_object_keys_skips_non_enumerable() {
    let code = "var o = {a: 1}; Object.defineProperty(o, 'h', {value: 2}); Object.keys(o).length";
    assert_eq!(eval(code), int(1));
    let code = "var o = {a: 1}; Object.defineProperty(o, 'h', {value: 2}); Object.getOwnPropertyNames(o).join(',')";
    assert_eq!(eval_str(code), "a,h");
}

#[test]
fn test_define_property_read_only() {
    let code = "var o = {}; Object.defineProperty(o, 'k', {value: 1}); o.k = 2; o.k";
    assert_eq!(eval(code), int(1));
}

#[test]
fn test_define_property_cannot_redefine() {
    let code = "var o = {}; Object.defineProperty(o, 'k', {value: 1}); Object.defineProperty(o, 'k', {value: 2});";
    assert_eq!(eval_error(code), "TypeError: Cannot redefine property: k");
}

#[test]
fn test_define_property_rejects_accessors() {
    let code = "Object.defineProperty({}, 'k', {get: function () { return 1; }})";
    assert_eq!(eval_error(code), "TypeError: Accessor properties are not supported");
}

#[test]
fn test_get_own_property_descriptor() {
    let code = "var d = Object.getOwnPropertyDescriptor({a: 1}, 'a'); d.value + ':' + d.writable + ':' + d.enumerable";
    assert_eq!(eval_str(code), "1:true:true");
    assert_eq!(eval("Object.getOwnPropertyDescriptor({}, 'zz')"), JsValue::Undefined);
}

#[test]
fn test_object_create_and_get_prototype_of() {
    let code = "var proto = {greet: 'hi'}; var o = Object.create(proto); o.greet + (Object.getPrototypeOf(o) === proto)";
    assert_eq!(eval_str(code), "hitrue");
    assert_eq!(eval("Object.getPrototypeOf(Object.create(null))"), JsValue::Null);
}

#[test]
fn test_has_own_property() {
    assert_eq!(eval("({a: 1}).hasOwnProperty('a')"), JsValue::Boolean(true));
    assert_eq!(eval("({a: 1}).hasOwnProperty('toString')"), JsValue::Boolean(false));
}

#[test]
fn test_object_to_string_tags() {
    assert_eq!(eval_str("({}).toString()"), "[object Object]");
    assert_eq!(eval_str("Object.prototype.toString.call([])"), "[object Array]");
    assert_eq!(eval_str("Object.prototype.toString.call(function () {})"), "[object Function]");
}

// ============================================================================
// Function Tests
// ============================================================================

#[test]
fn test_function_call_and_apply() {
    let code = "function f(a, b) { return this.v + a + b; } f.call({v: 1}, 2, 3) + f.apply({v: 10}, [20, 30])";
    assert_eq!(eval(code), int(66));
}

#[test]
fn test_function_constructor_is_refused() {
    assert_eq!(
        eval_error("new Function('return 1')"),
        "TypeError: Function constructor is not supported"
    );
}

#[test]
fn test_function_to_string_of_native() {
    assert_eq!(eval_str("Math.max.toString()"), "function max() { [native code] }");
}

// ============================================================================
// Array Tests
// ============================================================================

#[test]
fn test_array_push_pop_and_length() {
    assert_eq!(eval("var a = [1, 2]; a.push(3, 4); a.pop(); a.length"), int(3));
}

#[test]
fn test_array_length_constructor() {
    assert_eq!(eval("new Array(3).length"), int(3));
    assert_eq!(eval("new Array(1, 2).length"), int(2));
    assert_eq!(eval_error("new Array(-1)"), "RangeError: Invalid array length");
}

#[test]
fn test_array_is_array() {
    assert_eq!(eval("Array.isArray([])"), JsValue::Boolean(true));
    assert_eq!(eval("Array.isArray({length: 0})"), JsValue::Boolean(false));
}

#[test]
fn test_array_join_and_to_string() {
    assert_eq!(eval_str("[1, null, 'x', undefined].join('-')"), "1--x-");
    assert_eq!(eval_str("String([1, [2, 3]])"), "1,2,3");
}

#[test]
fn test_array_index_of_and_includes() {
    assert_eq!(eval("[1, 2, 3, 2].indexOf(2)"), int(1));
    assert_eq!(eval("[1, 2, 3, 2].indexOf(2, 2)"), int(3));
    assert_eq!(eval("[1, 2].indexOf(5)"), int(-1));
    assert_eq!(eval("[NaN].indexOf(NaN)"), int(-1));
    assert_eq!(eval("[NaN].includes(NaN)"), JsValue::Boolean(true));
}

#[test]
fn test_array_slice_and_concat() {
    assert_eq!(eval_str("[1, 2, 3, 4].slice(1, -1).join()"), "2,3");
    assert_eq!(eval_str("[1].concat([2, 3], 4).join()"), "1,2,3,4");
}

#[test]
fn test_array_map_filter_for_each() {
    assert_eq!(eval_str("[1, 2, 3].map(x => x * 10).join()"), "10,20,30");
    assert_eq!(eval_str("[1, 2, 3, 4].filter(x => x % 2 === 0).join()"), "2,4");
    assert_eq!(eval("var s = 0; [1, 2, 3].forEach(function (x, i) { s += x * i; }); s"), int(8));
}

#[test]
fn test_array_callback_must_be_callable() {
    assert_eq!(eval_error("[1].map(5)"), "TypeError: 5 is not a function");
}

// ============================================================================
// String Tests
// ============================================================================

#[test]
fn test_string_length_and_index() {
    assert_eq!(eval("'hello'.length"), int(5));
    assert_eq!(eval_str("'hello'[1]"), "e");
}

#[test]
fn test_string_char_at_and_code() {
    assert_eq!(eval_str("'abc'.charAt(2)"), "c");
    assert_eq!(eval_str("'abc'.charAt(9)"), "");
    assert_eq!(eval("'abc'.charCodeAt(0)"), int(97));
    assert_eq!(eval_str("String.fromCharCode(104, 105)"), "hi");
}

#[test]
fn test_string_search() {
    assert_eq!(eval("'hello world'.indexOf('o')"), int(4));
    assert_eq!(eval("'hello world'.indexOf('o', 5)"), int(7));
    assert_eq!(eval("'hello'.includes('ell')"), JsValue::Boolean(true));
    assert_eq!(eval("'hello'.startsWith('he')"), JsValue::Boolean(true));
    assert_eq!(eval("'hello'.endsWith('lo')"), JsValue::Boolean(true));
}

#[test]
fn test_string_slice_and_substring() {
    assert_eq!(eval_str("'hello'.slice(1, 3)"), "el");
    assert_eq!(eval_str("'hello'.slice(-3)"), "llo");
    assert_eq!(eval_str("'hello'.substring(3, 1)"), "el");
}

#[test]
fn test_string_split() {
    assert_eq!(eval("'a,b,c'.split(',').length"), int(3));
    assert_eq!(eval_str("'abc'.split('').join('|')"), "a|b|c");
    assert_eq!(eval_str("'a,b,c'.split(',', 2).join()"), "a,b");
}

#[test]
fn test_string_case_and_trim() {
    assert_eq!(eval_str("'  MiXed  '.trim().toUpperCase()"), "MIXED");
    assert_eq!(eval_str("'ABC'.toLowerCase()"), "abc");
}

#[test]
fn test_string_constructor_converts() {
    assert_eq!(eval_str("String(12)"), "12");
    assert_eq!(eval_str("String(true)"), "true");
    assert_eq!(eval_str("String(null)"), "null");
}

// ============================================================================
// Number and Boolean Tests
// ============================================================================

#[test]
fn test_number_constructor_and_statics() {
    assert_eq!(eval("Number('42')"), int(42));
    assert_eq!(eval("Number.isInteger(5)"), JsValue::Boolean(true));
    assert_eq!(eval("Number.isInteger(5.5)"), JsValue::Boolean(false));
    assert_eq!(eval("Number.isNaN('x')"), JsValue::Boolean(false));
    assert_eq!(eval("isNaN('x')"), JsValue::Boolean(true));
    assert_eq!(eval("Number.MAX_SAFE_INTEGER"), int(9007199254740991));
}

#[test]
fn test_parse_int_and_float() {
    assert_eq!(eval("parseInt('42px')"), int(42));
    assert_eq!(eval("parseInt('ff', 16)"), int(255));
    assert_eq!(eval("parseInt('0x1A')"), int(26));
    assert_eq!(eval("parseFloat('3.5e1abc')"), int(35));
    assert_eq!(eval("isNaN(parseInt('abc'))"), JsValue::Boolean(true));
}

#[test]
fn test_number_to_string_and_fixed() {
    assert_eq!(eval_str("(255).toString(16)"), "ff");
    assert_eq!(eval_str("(5).toString(2)"), "101");
    assert_eq!(eval_str("(3.14159).toFixed(2)"), "3.14");
    assert_eq!(eval_error("(1).toString(1)"), "RangeError: toString() radix must be between 2 and 36");
}

#[test]
fn test_boolean() {
    assert_eq!(eval("Boolean('')"), JsValue::Boolean(false));
    assert_eq!(eval("Boolean('x')"), JsValue::Boolean(true));
    assert_eq!(eval_str("true.toString()"), "true");
}

// ============================================================================
// Math Tests
// ============================================================================

#[test]
fn test_math_rounding() {
    assert_eq!(eval("Math.floor(2.7)"), int(2));
    assert_eq!(eval("Math.ceil(2.1)"), int(3));
    assert_eq!(eval("Math.round(2.4)"), int(2));
    assert_eq!(eval("Math.round(2.5)"), int(3));
    assert_eq!(eval("Math.trunc(-2.7)"), int(-2));
}

#[test]
fn test_math_min_max() {
    assert_eq!(eval("Math.max(1, 5, 3)"), int(5));
    assert_eq!(eval("Math.min(1, 5, 3)"), int(1));
}

#[test]
fn test_math_functions() {
    assert_eq!(eval("Math.abs(-4)"), int(4));
    assert_eq!(eval("Math.sqrt(16)"), int(4));
    assert_eq!(eval("Math.pow(2, 10)"), int(1024));
    assert_eq!(eval("Math.hypot(3, 4)"), int(5));
    assert_eq!(eval("Math.sign(-3)"), int(-1));
    assert_eq!(eval("Math.clz32(1)"), int(31));
}

#[test]
fn test_math_random_in_range() {
    assert_eq!(
        eval("var ok = true; for (var i = 0; i < 50; i++) { var r = Math.random(); if (r < 0 || r >= 1) ok = false; } ok"),
        JsValue::Boolean(true)
    );
}

// ============================================================================
// JSON Tests
// ============================================================================

#[test]
fn test_json_stringify() {
    assert_eq!(eval_str("JSON.stringify({a: 1, b: [true, null, 'x']})"), r#"{"a":1,"b":[true,null,"x"]}"#);
    assert_eq!(eval_str("JSON.stringify({f: function () {}, u: undefined, n: 1.5})"), r#"{"n":1.5}"#);
    assert_eq!(eval("JSON.stringify(undefined)"), JsValue::Undefined);
}

#[test]
fn test_json_stringify_indent() {
    assert_eq!(eval_str("JSON.stringify({a: 1}, null, 2)"), "{\n  \"a\": 1\n}");
}

#[test]
fn test_json_stringify_circular() {
    assert_eq!(
        eval_error("var o = {}; o.self = o; JSON.stringify(o)"),
        "TypeError: Converting circular structure to JSON"
    );
}

#[test]
fn test_json_parse() {
    assert_eq!(eval("JSON.parse('{\"a\": [1, 2, 3]}').a[2]"), int(3));
    assert_eq!(eval_str("JSON.parse('\"text\"')"), "text");
    assert_eq!(eval_error("JSON.parse('{')").split(':').next().unwrap(), "SyntaxError");
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_error_constructor_with_and_without_new() {
    assert_eq!(eval_str("String(new Error('boom'))"), "Error: boom");
    assert_eq!(eval_str("String(TypeError('bad'))"), "TypeError: bad");
}

#[test]
fn test_error_inheritance() {
    assert_eq!(eval("new TypeError('x') instanceof Error"), JsValue::Boolean(true));
    assert_eq!(eval("new Error('x') instanceof TypeError"), JsValue::Boolean(false));
}

#[test]
fn test_error_stack_names_the_script() {
    assert_eq!(eval_str("new RangeError('r').stack"), "RangeError: r\n    at std_lib.js");
}

#[test]
fn test_error_message_defaults_to_empty() {
    assert_eq!(eval_str("new Error().message"), "");
    assert_eq!(eval_str("String(new Error())"), "Error");
}

// ============================================================================
// Global Tests
// ============================================================================

#[test]
fn test_global_this_refers_to_the_global() {
    assert_eq!(eval("globalThis === this"), JsValue::Boolean(true));
}

#[test]
fn test_global_value_properties() {
    assert_eq!(eval("typeof undefined"), JsValue::from("undefined"));
    assert_eq!(eval("isNaN(NaN)"), JsValue::Boolean(true));
    assert_eq!(eval("Infinity > 1e300"), JsValue::Boolean(true));
}

#[test]
fn test_console_log_returns_undefined() {
    assert_eq!(eval("console.log('from', 'test', {a: [1]})"), JsValue::Undefined);
}
