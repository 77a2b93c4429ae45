//! Integration tests for the interpreter.
//!
//! These tests compile source code on an isolate and execute it in the main
//! realm to verify end-to-end functionality of the engine underneath the
//! isolated contexts.

extern crate just_vm;

use std::rc::Rc;

use just_vm::runner::ds::operations::object::get;
use just_vm::runner::ds::value::{JsNumberType, JsValue};
use just_vm::{EngineConfig, Isolate};

/// Helper to compile and execute code in the main realm of `isolate`.
fn run_with(isolate: &Rc<Isolate>, code: &str) -> Result<JsValue, JsValue> {
    let program = isolate
        .compile(code, "test.js")
        .map_err(|d| JsValue::String(format!("{}: {}", d.name, d.message)))?;
    let mut scope = isolate.enter(&isolate.main_realm());
    scope.execute(&program, "test.js")
}

/// Helper to run code on a fresh isolate, returning the completion value.
fn run_js(code: &str) -> Result<JsValue, JsValue> {
    run_with(&Isolate::new(), code)
}

/// Helper to run code that must throw an Error object; returns
/// `"Name: message"` of that error.
fn run_js_error_with(isolate: &Rc<Isolate>, code: &str) -> String {
    match run_with(isolate, code) {
        Err(JsValue::Object(e)) => {
            let name = get(&e, "name").unwrap();
            let message = get(&e, "message").unwrap();
            format!(
                "{}: {}",
                name.as_str().unwrap_or(""),
                message.as_str().unwrap_or("")
            )
        }
        other => panic!("expected an Error object to be thrown, got {:?}", other),
    }
}

fn run_js_error(code: &str) -> String {
    run_js_error_with(&Isolate::new(), code)
}

fn int(i: i64) -> JsValue {
    JsValue::Number(JsNumberType::Integer(i))
}

// ============================================================================
// Basic Arithmetic Tests
// ============================================================================

#[test]
fn test_simple_addition() {
    assert_eq!(run_js("1 + 2").unwrap(), int(3));
}

#[test]
fn test_arithmetic_with_parens() {
    assert_eq!(run_js("2 * (3 + 4)").unwrap(), int(14));
}

#[test]
fn test_division_yields_float() {
    assert_eq!(run_js("10 / 4").unwrap(), JsValue::from(2.5));
}

#[test]
fn test_modulo() {
    assert_eq!(run_js("7 % 3").unwrap(), int(1));
}

#[test]
fn test_string_concatenation_with_number() {
    assert_eq!(run_js("'a' + 1").unwrap(), JsValue::from("a1"));
}

#[test]
fn test_bitwise_operators() {
    assert_eq!(run_js("(5 & 3) | (1 << 4)").unwrap(), int(17));
    assert_eq!(run_js("-1 >>> 28").unwrap(), int(15));
}

#[test]
fn test_equality_operators() {
    assert_eq!(run_js("1 == '1'").unwrap(), JsValue::Boolean(true));
    assert_eq!(run_js("1 === '1'").unwrap(), JsValue::Boolean(false));
    assert_eq!(run_js("null == undefined").unwrap(), JsValue::Boolean(true));
}

// ============================================================================
// Variables and Scoping Tests
// ============================================================================

#[test]
fn test_let_compound_assignment() {
    assert_eq!(run_js("let x = 1; x += 2; x").unwrap(), int(3));
}

#[test]
fn test_const_reassignment_throws() {
    assert_eq!(
        run_js_error("const c = 1; c = 2;"),
        "TypeError: Assignment to constant variable"
    );
}

#[test]
fn test_undeclared_read_throws_reference_error() {
    assert_eq!(
        run_js_error("missing + 1"),
        "ReferenceError: missing is not defined"
    );
}

#[test]
fn test_typeof_undeclared_is_undefined() {
    assert_eq!(run_js("typeof missing").unwrap(), JsValue::from("undefined"));
}

#[test]
fn test_var_is_hoisted() {
    assert_eq!(run_js("var before = typeof v; var v = 1; before").unwrap(), JsValue::from("undefined"));
}

#[test]
fn test_unresolved_assignment_creates_global() {
    assert_eq!(run_js("g = 4; this.g").unwrap(), int(4));
}

// ============================================================================
// Function Tests
// ============================================================================

#[test]
fn test_function_declaration_and_call() {
    assert_eq!(
        run_js("function add(a, b) { return a + b; } add(2, 3)").unwrap(),
        int(5)
    );
}

#[test]
fn test_function_declarations_are_hoisted() {
    assert_eq!(run_js("var r = twice(4); function twice(n) { return n * 2; } r").unwrap(), int(8));
}

#[test]
fn test_closure_keeps_its_environment() {
    let code = "
        function counter() {
            var n = 0;
            return function () { n++; return n; };
        }
        var c = counter();
        c();
        c()
    ";
    assert_eq!(run_js(code).unwrap(), int(2));
}

#[test]
fn test_arrow_function() {
    assert_eq!(run_js("var f = x => x * 2; f(21)").unwrap(), int(42));
}

#[test]
fn test_arguments_object() {
    assert_eq!(run_js("function f() { return arguments.length; } f(1, 2, 3)").unwrap(), int(3));
}

#[test]
fn test_plain_call_gets_global_this() {
    assert_eq!(
        run_js("function f() { return this; } f() === this").unwrap(),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_calling_non_function_throws() {
    assert_eq!(
        run_js_error("var a = 1; a()"),
        "TypeError: a is not a function"
    );
}

#[test]
fn test_constructor_function_and_prototype() {
    let code = "
        function P(x) { this.x = x; }
        P.prototype.double = function () { return this.x * 2; };
        var p = new P(3);
        p.double()
    ";
    assert_eq!(run_js(code).unwrap(), int(6));
    assert_eq!(
        run_js("function P() {} var p = new P(); p instanceof P").unwrap(),
        JsValue::Boolean(true)
    );
}

// ============================================================================
// Control Flow Tests
// ============================================================================

#[test]
fn test_for_loop() {
    assert_eq!(
        run_js("var s = 0; for (var i = 0; i < 5; i++) { s += i; } s").unwrap(),
        int(10)
    );
}

#[test]
fn test_while_with_break() {
    assert_eq!(
        run_js("var i = 0; while (true) { i++; if (i === 3) break; } i").unwrap(),
        int(3)
    );
}

#[test]
fn test_do_while_with_continue() {
    let code = "var i = 0, odd = 0; do { i++; if (i % 2 === 0) continue; odd++; } while (i < 6); odd";
    assert_eq!(run_js(code).unwrap(), int(3));
}

#[test]
fn test_for_in_visits_keys_in_order() {
    let code = "var o = {a: 1, b: 2}; var keys = ''; for (var k in o) { keys += k; } keys";
    assert_eq!(run_js(code).unwrap(), JsValue::from("ab"));
}

#[test]
fn test_let_loop_binding_per_iteration() {
    let code = "var fs = []; for (let i = 0; i < 3; i++) { fs.push(() => i); } fs[0]() + fs[2]()";
    assert_eq!(run_js(code).unwrap(), int(2));
}

#[test]
fn test_conditional_and_logical_operators() {
    assert_eq!(run_js("0 || 'x'").unwrap(), JsValue::from("x"));
    assert_eq!(run_js("1 && null").unwrap(), JsValue::Null);
    assert_eq!(run_js("3 > 2 ? 'yes' : 'no'").unwrap(), JsValue::from("yes"));
}

// ============================================================================
// Exception Tests
// ============================================================================

#[test]
fn test_try_catch_thrown_value() {
    assert_eq!(
        run_js("var r; try { throw 'boom'; } catch (e) { r = e; } r").unwrap(),
        JsValue::from("boom")
    );
}

#[test]
fn test_finally_always_runs() {
    assert_eq!(
        run_js("var log = ''; try { log += 'a'; } finally { log += 'b'; } log").unwrap(),
        JsValue::from("ab")
    );
}

#[test]
fn test_engine_errors_are_catchable_error_objects() {
    assert_eq!(
        run_js("var ok; try { null.x; } catch (e) { ok = e instanceof TypeError; } ok").unwrap(),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_uncaught_thrown_value_passes_through() {
    assert_eq!(run_js("throw 42").unwrap_err(), int(42));
}

#[test]
fn test_uncaught_error_object() {
    assert_eq!(run_js_error("throw new RangeError('r')"), "RangeError: r");
}

#[test]
fn test_member_access_on_undefined() {
    assert_eq!(
        run_js_error("var u; u.x"),
        "TypeError: Cannot read properties of undefined (reading 'x')"
    );
}

#[test]
fn test_syntax_error_is_a_compile_error() {
    let isolate = Isolate::new();
    let diagnostic = isolate.compile("var x = ;", "broken.js").unwrap_err();
    assert_eq!(diagnostic.name, "SyntaxError");
    assert_eq!(diagnostic.filename, "broken.js");
    assert_eq!(diagnostic.line, 1);
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_console_present_by_default() {
    assert_eq!(run_js("typeof console").unwrap(), JsValue::from("object"));
}

#[test]
fn test_console_can_be_disabled() {
    let config = EngineConfig {
        console: false,
        ..EngineConfig::default()
    };
    let isolate = Isolate::with_config(config);
    assert_eq!(
        run_with(&isolate, "typeof console").unwrap(),
        JsValue::from("undefined")
    );
}

#[test]
fn test_call_depth_limit_raises_range_error() {
    let config = EngineConfig::parse("max_call_depth = 32").unwrap();
    let isolate = Isolate::with_config(config);
    assert_eq!(
        run_js_error_with(&isolate, "function r() { return r(); } r()"),
        "RangeError: Maximum call stack size exceeded"
    );
    // The depth counter unwinds with the failed calls.
    assert_eq!(
        run_with(&isolate, "function f(n) { return n ? f(n - 1) : 'done'; } f(10)").unwrap(),
        JsValue::from("done")
    );
}

#[test]
fn test_unbounded_recursion_under_default_config_is_a_range_error() {
    assert_eq!(
        run_js_error("function r(n) { return r(n + 1); } r(0)"),
        "RangeError: Maximum call stack size exceeded"
    );
    assert_eq!(
        run_js("function r(n) { if (n > 1000) return n; return r(n + 1); } var name; try { r(0); } catch (e) { name = e.name; } name").unwrap(),
        JsValue::from("RangeError")
    );
}

#[test]
fn test_recursion_within_default_limit_completes() {
    assert_eq!(
        run_js("function r(n) { return n ? 1 + r(n - 1) : 0; } r(50)").unwrap(),
        int(50)
    );
}

#[test]
fn test_raised_call_depth_on_a_larger_stack() {
    let handle = std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(|| {
            let isolate = Isolate::with_config(EngineConfig::parse("max_call_depth = 600").unwrap());
            let deep = run_with(&isolate, "function r(n) { return n ? 1 + r(n - 1) : 0; } r(500)")
                .unwrap();
            let name = run_with(&isolate, "var name; try { r(1000); } catch (e) { name = e.name; } name")
                .unwrap();
            // Values are tied to the isolate's thread; hand back their text.
            (deep.to_string(), name.to_string())
        })
        .unwrap();
    let (deep, name) = handle.join().unwrap();
    assert_eq!(deep, "500");
    assert_eq!(name, "\"RangeError\"");
}

#[test]
fn test_scope_stack_is_empty_after_execution() {
    let isolate = Isolate::new();
    let _ = run_with(&isolate, "throw 1");
    assert_eq!(isolate.scope_depth(), 0);
    assert!(Rc::ptr_eq(&isolate.current_realm(), &isolate.main_realm()));
}
