//! Tests for isolated contexts: the sandbox bridge, isolation between
//! contexts, compiled scripts and how failures are reported.

extern crate just_vm;

use std::rc::Rc;

use just_vm::contextify::{run, CompiledScript, ContextifyError, IsolatedContext};
use just_vm::runner::ds::object::JsObjectType;
use just_vm::runner::ds::object_property::{PropertyAttributes, PropertyDescriptor};
use just_vm::runner::ds::operations::object::{
    get, get_prototype_of, has_own_property, own_enumerable_keys, set,
};
use just_vm::runner::ds::value::{JsNumberType, JsValue};
use just_vm::Isolate;

fn int(i: i64) -> JsValue {
    JsValue::Number(JsNumberType::Integer(i))
}

/// Helper to create an isolate with an empty sandbox object.
fn setup() -> (Rc<Isolate>, JsObjectType) {
    let isolate = Isolate::new();
    let sandbox = isolate.new_object();
    (isolate, sandbox)
}

fn contextify(isolate: &Rc<Isolate>, sandbox: &JsObjectType) -> IsolatedContext {
    IsolatedContext::new(isolate, &JsValue::Object(sandbox.clone())).unwrap()
}

fn eval(context: &IsolatedContext, code: &str) -> JsValue {
    match run(context, code, Some("test.js")) {
        Ok(v) => v,
        Err(e) => panic!("{} failed: {}", code, e),
    }
}

fn keys(object: &JsObjectType) -> Vec<String> {
    own_enumerable_keys(object).unwrap()
}

// ============================================================================
// Sandbox Bridge Tests
// ============================================================================

#[test]
fn test_globals_written_by_code_land_on_the_sandbox() {
    let (isolate, sandbox) = setup();
    let context = contextify(&isolate, &sandbox);
    eval(&context, "a = 1; b = 'two';");
    assert_eq!(get(&sandbox, "a").unwrap(), int(1));
    assert_eq!(get(&sandbox, "b").unwrap(), JsValue::from("two"));
    assert_eq!(keys(&sandbox), vec!["a", "b"]);
}

#[test]
fn test_sandbox_values_are_visible_as_globals() {
    let (isolate, sandbox) = setup();
    set(&sandbox, "x", int(1)).unwrap();
    let context = contextify(&isolate, &sandbox);
    eval(&context, "y = x + 1; z = typeof Array;");
    assert_eq!(get(&sandbox, "y").unwrap(), int(2));
    assert_eq!(get(&sandbox, "z").unwrap(), JsValue::from("function"));
    assert_eq!(keys(&sandbox), vec!["x", "y", "z"]);
}

#[test]
fn test_built_ins_fall_back_to_the_fresh_scope() {
    let (isolate, sandbox) = setup();
    let context = contextify(&isolate, &sandbox);
    assert_eq!(eval(&context, "Math.max(1, 2)"), int(2));
    assert_eq!(eval(&context, "JSON.stringify([1])"), JsValue::from("[1]"));
    assert!(keys(&sandbox).is_empty());
}

#[test]
fn test_sandbox_shadows_built_ins() {
    let (isolate, sandbox) = setup();
    set(&sandbox, "Math", int(5)).unwrap();
    let context = contextify(&isolate, &sandbox);
    assert_eq!(eval(&context, "Math"), int(5));
}

#[test]
fn test_host_writes_after_creation_are_seen() {
    let (isolate, sandbox) = setup();
    let context = contextify(&isolate, &sandbox);
    set(&sandbox, "late", JsValue::from("here")).unwrap();
    assert_eq!(eval(&context, "late"), JsValue::from("here"));
}

#[test]
fn test_var_and_function_declarations_land_on_the_sandbox() {
    let (isolate, sandbox) = setup();
    let context = contextify(&isolate, &sandbox);
    eval(&context, "var v = 3; function f() { return v; }");
    assert_eq!(get(&sandbox, "v").unwrap(), int(3));
    assert_eq!(keys(&sandbox), vec!["v", "f"]);
    assert_eq!(eval(&context, "f()"), int(3));
}

#[test]
fn test_lexical_declarations_stay_in_the_context() {
    let (isolate, sandbox) = setup();
    let context = contextify(&isolate, &sandbox);
    eval(&context, "let hidden = 1; const fixed = 2; var shown = 3;");
    assert_eq!(keys(&sandbox), vec!["shown"]);
    assert_eq!(eval(&context, "hidden + fixed + shown"), int(6));
}

#[test]
fn test_state_persists_across_runs() {
    let (isolate, sandbox) = setup();
    let context = contextify(&isolate, &sandbox);
    eval(&context, "counter = 1");
    assert_eq!(eval(&context, "counter += 1; counter"), int(2));
    assert_eq!(get(&sandbox, "counter").unwrap(), int(2));
}

#[test]
fn test_enumeration_lists_sandbox_keys_only() {
    let (isolate, sandbox) = setup();
    set(&sandbox, "x", int(1)).unwrap();
    let context = contextify(&isolate, &sandbox);
    assert_eq!(
        eval(&context, "y = 2; Object.keys(this).join(',')"),
        JsValue::from("x,y")
    );
}

#[test]
fn test_in_operator_and_has_own_property() {
    let (isolate, sandbox) = setup();
    set(&sandbox, "x", int(1)).unwrap();
    let context = contextify(&isolate, &sandbox);
    assert_eq!(eval(&context, "'x' in this"), JsValue::Boolean(true));
    assert_eq!(eval(&context, "'Array' in this"), JsValue::Boolean(true));
    assert_eq!(eval(&context, "'nope' in this"), JsValue::Boolean(false));
    assert_eq!(eval(&context, "this.hasOwnProperty('x')"), JsValue::Boolean(true));
}

#[test]
fn test_query_reports_plain_data_properties() {
    let (isolate, sandbox) = setup();
    set(&sandbox, "x", int(1)).unwrap();
    let context = contextify(&isolate, &sandbox);
    let code = "var d = Object.getOwnPropertyDescriptor(this, 'x'); d.value + ':' + d.writable + ':' + d.enumerable";
    assert_eq!(eval(&context, code), JsValue::from("1:true:true"));
}

#[test]
fn test_delete_removes_from_the_sandbox() {
    let (isolate, sandbox) = setup();
    set(&sandbox, "x", int(1)).unwrap();
    set(&sandbox, "y", int(2)).unwrap();
    let context = contextify(&isolate, &sandbox);
    assert_eq!(eval(&context, "delete this.x"), JsValue::Boolean(true));
    assert_eq!(eval(&context, "delete y"), JsValue::Boolean(true));
    assert!(keys(&sandbox).is_empty());
    assert_eq!(eval(&context, "typeof x"), JsValue::from("undefined"));
}

#[test]
fn test_deleting_a_shadowing_global_uncovers_the_built_in() {
    let (isolate, sandbox) = setup();
    set(&sandbox, "Math", int(1)).unwrap();
    let context = contextify(&isolate, &sandbox);
    assert_eq!(eval(&context, "typeof Math"), JsValue::from("number"));
    assert_eq!(eval(&context, "delete Math"), JsValue::Boolean(true));
    assert!(!has_own_property(&sandbox, "Math").unwrap());
    assert_eq!(eval(&context, "typeof Math"), JsValue::from("object"));
    assert_eq!(eval(&context, "Math.max(1, 3)"), int(3));
}

#[test]
fn test_delete_of_an_absent_global_reports_false() {
    let (isolate, sandbox) = setup();
    let context = contextify(&isolate, &sandbox);
    assert_eq!(eval(&context, "delete this.missing"), JsValue::Boolean(false));
}

#[test]
fn test_this_is_the_isolated_global_not_the_sandbox() {
    let (isolate, sandbox) = setup();
    let context = contextify(&isolate, &sandbox);
    assert_eq!(eval(&context, "this === globalThis"), JsValue::Boolean(true));
    assert!(!Rc::ptr_eq(&context.global(), &sandbox));
    assert!(Rc::ptr_eq(&context.sandbox(), &sandbox));
}

#[test]
fn test_sandbox_alias_reads_as_the_global() {
    let (isolate, sandbox) = setup();
    set(&sandbox, "self", JsValue::Object(sandbox.clone())).unwrap();
    let context = contextify(&isolate, &sandbox);
    assert_eq!(eval(&context, "self === this"), JsValue::Boolean(true));
}

#[test]
fn test_read_only_sandbox_property_is_not_overwritten() {
    let (isolate, sandbox) = setup();
    sandbox.borrow_mut().define_real_property(
        "k",
        PropertyDescriptor::new(int(1), PropertyAttributes::frozen()),
    );
    let context = contextify(&isolate, &sandbox);
    assert_eq!(eval(&context, "k = 5; k"), int(1));
    assert_eq!(get(&sandbox, "k").unwrap(), int(1));
}

#[test]
fn test_read_only_global_is_not_copied_to_the_sandbox() {
    let (isolate, sandbox) = setup();
    let context = contextify(&isolate, &sandbox);
    assert_eq!(eval(&context, "undefined = 5; typeof undefined"), JsValue::from("undefined"));
    assert!(!has_own_property(&sandbox, "undefined").unwrap());
}

#[test]
fn test_global_class_name_follows_the_sandbox() {
    let (isolate, sandbox) = setup();
    let context = contextify(&isolate, &sandbox);
    assert_eq!(
        eval(&context, "Object.prototype.toString.call(this)"),
        JsValue::from("[object Object]")
    );
}

// ============================================================================
// Isolation Tests
// ============================================================================

#[test]
fn test_contexts_do_not_share_globals() {
    let isolate = Isolate::new();
    let (first, second) = (isolate.new_object(), isolate.new_object());
    let a = contextify(&isolate, &first);
    let b = contextify(&isolate, &second);
    eval(&a, "shared = 1");
    assert_eq!(eval(&b, "typeof shared"), JsValue::from("undefined"));
    assert!(keys(&second).is_empty());
}

#[test]
fn test_contexts_do_not_share_built_ins() {
    let isolate = Isolate::new();
    let (first, second) = (isolate.new_object(), isolate.new_object());
    let a = contextify(&isolate, &first);
    let b = contextify(&isolate, &second);
    eval(&a, "Array.prototype.extra = 1");
    assert_eq!(eval(&a, "typeof [].extra"), JsValue::from("number"));
    assert_eq!(eval(&b, "typeof [].extra"), JsValue::from("undefined"));
}

#[test]
fn test_host_objects_come_from_another_realm() {
    let (isolate, sandbox) = setup();
    let host_array = CompiledScript::compile(&isolate, "[1, 2]", None)
        .unwrap()
        .run_in_this_context(&isolate)
        .unwrap();
    set(&sandbox, "arr", host_array).unwrap();
    let context = contextify(&isolate, &sandbox);
    assert_eq!(eval(&context, "arr instanceof Array"), JsValue::Boolean(false));
    assert_eq!(eval(&context, "Array.isArray(arr)"), JsValue::Boolean(true));
    assert_eq!(eval(&context, "arr.length"), int(2));
}

#[test]
fn test_functions_keep_their_home_context() {
    let isolate = Isolate::new();
    let (first, second) = (isolate.new_object(), isolate.new_object());
    let a = contextify(&isolate, &first);
    let b = contextify(&isolate, &second);
    eval(&a, "function mark() { marked = true; }");
    set(&second, "mark", get(&first, "mark").unwrap()).unwrap();
    eval(&b, "mark()");
    assert_eq!(get(&first, "marked").unwrap(), JsValue::Boolean(true));
    assert!(!has_own_property(&second, "marked").unwrap());
}

#[test]
fn test_context_does_not_touch_the_main_realm() {
    let (isolate, sandbox) = setup();
    let context = contextify(&isolate, &sandbox);
    eval(&context, "leak = 1");
    let main_global = isolate.main_realm().global_object();
    assert!(!has_own_property(&main_global, "leak").unwrap());
}

// ============================================================================
// Failure Reporting Tests
// ============================================================================

#[test]
fn test_sandbox_must_be_an_object() {
    let isolate = Isolate::new();
    match IsolatedContext::new(&isolate, &JsValue::from(5i64)) {
        Err(ContextifyError::Argument(message)) => {
            assert_eq!(message, "sandbox must be an object, got a number")
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_syntax_error_is_reported_as_compile_error() {
    let (isolate, sandbox) = setup();
    let context = contextify(&isolate, &sandbox);
    match run(&context, "1 +", Some("bad.js")) {
        Err(ContextifyError::Compile(diagnostic)) => {
            assert_eq!(diagnostic.name, "SyntaxError");
            assert_eq!(diagnostic.filename, "bad.js");
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(isolate.scope_depth(), 0);
}

#[test]
fn test_thrown_value_is_reported_unchanged() {
    let (isolate, sandbox) = setup();
    let context = contextify(&isolate, &sandbox);
    match run(&context, "throw 'x'", None) {
        Err(ContextifyError::Runtime(v)) => assert_eq!(v, JsValue::from("x")),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(isolate.scope_depth(), 0);
}

#[test]
fn test_engine_error_belongs_to_the_context() {
    let (isolate, sandbox) = setup();
    let context = contextify(&isolate, &sandbox);
    let error = match run(&context, "null.x", None) {
        Err(ContextifyError::Runtime(JsValue::Object(e))) => e,
        other => panic!("unexpected {:?}", other),
    };
    assert_eq!(get(&error, "name").unwrap(), JsValue::from("TypeError"));
    assert_eq!(
        get(&error, "stack").unwrap(),
        JsValue::from("TypeError: Cannot read properties of null (reading 'x')\n    at evalmachine.<anonymous>")
    );
    let main_type_error = isolate.main_realm().intrinsics().prototype("TypeError").unwrap();
    let prototype = get_prototype_of(&error).unwrap();
    assert!(!Rc::ptr_eq(&prototype, &main_type_error));
}

#[test]
fn test_runtime_failure_display() {
    let (isolate, sandbox) = setup();
    let context = contextify(&isolate, &sandbox);
    let error = run(&context, "null.x", None).unwrap_err();
    assert_eq!(
        error.to_string(),
        "Uncaught TypeError: Cannot read properties of null (reading 'x')\n    at evalmachine.<anonymous>"
    );
    let error = run(&context, "throw 'x'", None).unwrap_err();
    assert_eq!(error.to_string(), "Uncaught \"x\"");
}

#[test]
fn test_unbounded_recursion_is_a_runtime_failure() {
    let (isolate, sandbox) = setup();
    let context = contextify(&isolate, &sandbox);
    match run(&context, "function r(n) { if (n > 1000) return n; return r(n + 1); } r(0)", None) {
        Err(ContextifyError::Runtime(JsValue::Object(e))) => {
            assert_eq!(get(&e, "name").unwrap(), JsValue::from("RangeError"));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(
        eval(&context, "var caught; try { r(0); } catch (e) { caught = e.message; } caught"),
        JsValue::from("Maximum call stack size exceeded")
    );
    assert_eq!(isolate.scope_depth(), 0);
}

#[test]
fn test_failure_leaves_the_context_usable() {
    let (isolate, sandbox) = setup();
    let context = contextify(&isolate, &sandbox);
    assert!(run(&context, "before = 1; throw new Error('stop'); after = 2", None).is_err());
    assert_eq!(keys(&sandbox), vec!["before"]);
    assert_eq!(eval(&context, "before + 1"), int(2));
    assert_eq!(isolate.scope_depth(), 0);
    assert!(Rc::ptr_eq(&isolate.current_realm(), &isolate.main_realm()));
}

// ============================================================================
// Compiled Script Tests
// ============================================================================

#[test]
fn test_compile_once_run_in_many_contexts() {
    let isolate = Isolate::new();
    let script = CompiledScript::compile(
        &isolate,
        "count = (typeof count === 'undefined' ? 0 : count) + 1",
        Some("count.js"),
    )
    .unwrap();
    let (first, second) = (isolate.new_object(), isolate.new_object());
    let a = contextify(&isolate, &first);
    let b = contextify(&isolate, &second);
    script.run_in_context(&a).unwrap();
    script.run_in_context(&a).unwrap();
    script.run_in_context(&b).unwrap();
    assert_eq!(get(&first, "count").unwrap(), int(2));
    assert_eq!(get(&second, "count").unwrap(), int(1));
}

#[test]
fn test_script_keeps_source_and_display_name() {
    let isolate = Isolate::new();
    let named = CompiledScript::compile(&isolate, "1 + 1", Some("named.js")).unwrap();
    assert_eq!(named.source(), "1 + 1");
    assert_eq!(named.display_name(), "named.js");
    let unnamed = CompiledScript::compile(&isolate, "1", None).unwrap();
    assert_eq!(unnamed.display_name(), "evalmachine.<anonymous>");
}

#[test]
fn test_script_errors_name_the_script() {
    let (isolate, sandbox) = setup();
    let context = contextify(&isolate, &sandbox);
    let script = CompiledScript::compile(&isolate, "throw new Error('e')", Some("named.js")).unwrap();
    match script.run_in_context(&context) {
        Err(ContextifyError::Runtime(JsValue::Object(e))) => {
            assert_eq!(get(&e, "stack").unwrap(), JsValue::from("Error: e\n    at named.js"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_compile_error_from_compiled_script() {
    let isolate = Isolate::new();
    assert!(matches!(
        CompiledScript::compile(&isolate, "function (", None),
        Err(ContextifyError::Compile(_))
    ));
}

#[test]
fn test_run_in_this_context_uses_the_main_realm() {
    let (isolate, sandbox) = setup();
    let _context = contextify(&isolate, &sandbox);
    let script = CompiledScript::compile(&isolate, "hostValue = 7", None).unwrap();
    script.run_in_this_context(&isolate).unwrap();
    let main_global = isolate.main_realm().global_object();
    assert_eq!(get(&main_global, "hostValue").unwrap(), int(7));
    assert!(keys(&sandbox).is_empty());
}

// ============================================================================
// Lifetime Tests
// ============================================================================

#[test]
fn test_handles_refer_to_the_same_context() {
    let (isolate, sandbox) = setup();
    let context = contextify(&isolate, &sandbox);
    let other = context.clone();
    eval(&other, "viaClone = 1");
    assert!(context.ptr_eq(&other));
    assert_eq!(context.id(), other.id());
    assert_eq!(get(&sandbox, "viaClone").unwrap(), int(1));
}

#[test]
fn test_sandbox_outlives_its_context() {
    let (isolate, sandbox) = setup();
    let context = contextify(&isolate, &sandbox);
    eval(&context, "kept = 'yes'");
    let global = context.global();
    drop(context);
    assert_eq!(get(&sandbox, "kept").unwrap(), JsValue::from("yes"));
    // The released global no longer reaches the sandbox.
    assert_eq!(get(&global, "kept").unwrap(), JsValue::Undefined);
}

#[test]
fn test_closures_lose_their_globals_when_the_context_is_released() {
    let (isolate, sandbox) = setup();
    let context = contextify(&isolate, &sandbox);
    eval(
        &context,
        "usesGlobal = function () { return typeof Array; }; pure = function (n) { return n * 2; };",
    );
    drop(context);
    set(
        &isolate.main_realm().global_object(),
        "sb",
        JsValue::Object(sandbox.clone()),
    )
    .unwrap();

    let pure = CompiledScript::compile(&isolate, "sb.pure(21)", None).unwrap();
    assert_eq!(pure.run_in_this_context(&isolate).unwrap(), int(42));

    let code = "var r; try { sb.usesGlobal(); } catch (e) { r = e.name + ': ' + e.message; } r";
    let uses_global = CompiledScript::compile(&isolate, code, None).unwrap();
    assert_eq!(
        uses_global.run_in_this_context(&isolate).unwrap(),
        JsValue::from("ReferenceError: global object is no longer available")
    );
}
