//! Value-level host surface.
//!
//! The same operations as [`IsolatedContext`], [`CompiledScript`] and the
//! runner, taking untyped argument lists the way a script-facing binding
//! receives them. Contexts and scripts travel as opaque handle objects.
//!
//! [`install`] exposes these operations to scripts of the main realm as a
//! `vm` object.

use std::any::Any;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::new_native_function;
use crate::runner::ds::object::{new_object, JsObjectType, ObjectKind};
use crate::runner::ds::object_property::{PropertyAttributes, PropertyDescriptor};
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::isolate::Isolate;
use crate::runner::plugin::types::{EvalContext, NativeFn};

use super::context::{describe, IsolatedContext};
use super::error::ContextifyError;
use super::runner;
use super::script::CompiledScript;

const CONTEXT_CLASS: &str = "Context";
const SCRIPT_CLASS: &str = "Script";

fn check_arity(operation: &str, args: &[JsValue], min: usize, max: usize) -> Result<(), ContextifyError> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{} to {}", min, max)
        };
        let noun = if max == 1 { "argument" } else { "arguments" };
        return Err(ContextifyError::Argument(format!(
            "{} expects {} {}, got {}",
            operation,
            expected,
            noun,
            args.len()
        )));
    }
    Ok(())
}

fn string_arg<'a>(operation: &str, what: &str, value: &'a JsValue) -> Result<&'a str, ContextifyError> {
    value.as_str().ok_or_else(|| {
        ContextifyError::Argument(format!(
            "{}: {} must be a string, got {}",
            operation,
            what,
            describe(value)
        ))
    })
}

fn optional_string_arg<'a>(
    operation: &str,
    what: &str,
    value: Option<&'a JsValue>,
) -> Result<Option<&'a str>, ContextifyError> {
    match value {
        None | Some(JsValue::Undefined) => Ok(None),
        Some(v) => string_arg(operation, what, v).map(Some),
    }
}

fn handle(isolate: &Isolate, class_name: &str, data: Rc<dyn Any>) -> JsValue {
    let prototype = isolate.main_realm().intrinsics().object_prototype();
    JsValue::Object(new_object(class_name, Some(prototype), ObjectKind::Embedder(data)))
}

fn embedded<T: Clone + 'static>(value: &JsValue) -> Option<T> {
    let data = value.as_object()?.borrow().embedder_data()?;
    data.downcast_ref::<T>().cloned()
}

fn context_arg(operation: &str, value: &JsValue) -> Result<IsolatedContext, ContextifyError> {
    embedded::<IsolatedContext>(value).ok_or_else(|| {
        ContextifyError::Type(format!("{}: argument is not a context", operation))
    })
}

fn script_arg(operation: &str, value: &JsValue) -> Result<CompiledScript, ContextifyError> {
    embedded::<CompiledScript>(value).ok_or_else(|| {
        ContextifyError::Type(format!("{}: argument is not a compiled script", operation))
    })
}

/// `(sandbox)` → context handle.
pub fn make_context(isolate: &Rc<Isolate>, args: &[JsValue]) -> Result<JsValue, ContextifyError> {
    check_arity("makeContext", args, 1, 1)?;
    let context = IsolatedContext::new(isolate, &args[0])?;
    Ok(handle(isolate, CONTEXT_CLASS, Rc::new(context)))
}

/// `(context)` → the context's isolated global.
pub fn context_global(args: &[JsValue]) -> Result<JsValue, ContextifyError> {
    check_arity("getGlobal", args, 1, 1)?;
    let context = context_arg("getGlobal", &args[0])?;
    Ok(JsValue::Object(context.global()))
}

/// `(context, code, filename?)` → completion value of `code`.
pub fn run_in_context(args: &[JsValue]) -> Result<JsValue, ContextifyError> {
    check_arity("runInContext", args, 2, 3)?;
    let context = context_arg("runInContext", &args[0])?;
    let code = string_arg("runInContext", "code", &args[1])?;
    let filename = optional_string_arg("runInContext", "filename", args.get(2))?;
    runner::run(&context, code, filename)
}

/// `(code, filename?)` → script handle.
pub fn compile_script(isolate: &Rc<Isolate>, args: &[JsValue]) -> Result<JsValue, ContextifyError> {
    check_arity("compileScript", args, 1, 2)?;
    let code = string_arg("compileScript", "code", &args[0])?;
    let filename = optional_string_arg("compileScript", "filename", args.get(1))?;
    let script = CompiledScript::compile(isolate, code, filename)?;
    Ok(handle(isolate, SCRIPT_CLASS, Rc::new(script)))
}

/// `(script, context)` → completion value of the script.
pub fn script_run_in_context(args: &[JsValue]) -> Result<JsValue, ContextifyError> {
    check_arity("runScript", args, 2, 2)?;
    let script = script_arg("runScript", &args[0])?;
    let context = context_arg("runScript", &args[1])?;
    script.run_in_context(&context)
}

fn vm_create_context(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let isolate = ctx.isolate.clone();
    make_context(&isolate, &args).map_err(ContextifyError::into_script_error)
}

fn vm_get_global(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    context_global(&args).map_err(ContextifyError::into_script_error)
}

fn vm_run_in_context(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    run_in_context(&args).map_err(ContextifyError::into_script_error)
}

fn vm_compile_script(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let isolate = ctx.isolate.clone();
    compile_script(&isolate, &args).map_err(ContextifyError::into_script_error)
}

fn vm_run_script(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    script_run_in_context(&args).map_err(ContextifyError::into_script_error)
}

fn define_hidden(object: &JsObjectType, name: &str, value: JsValue) {
    object
        .borrow_mut()
        .define_real_property(name, PropertyDescriptor::new(value, PropertyAttributes::hidden()));
}

/// Installs the `vm` object on the main realm's global object.
pub fn install(isolate: &Rc<Isolate>) -> JsObjectType {
    let realm = isolate.main_realm();
    let weak: Weak<Realm> = Rc::downgrade(&realm);
    let function_prototype = realm.intrinsics().function_prototype();
    let vm = isolate.new_object();
    let methods: [(&str, NativeFn); 5] = [
        ("createContext", vm_create_context),
        ("getGlobal", vm_get_global),
        ("runInContext", vm_run_in_context),
        ("compileScript", vm_compile_script),
        ("runScript", vm_run_script),
    ];
    for (name, func) in methods.iter() {
        let f = new_native_function(&function_prototype, weak.clone(), name, *func, false);
        define_hidden(&vm, name, JsValue::Object(f));
    }
    define_hidden(&realm.global_object(), "vm", JsValue::Object(vm.clone()));
    debug!(realm = %realm.id(), "vm binding installed");
    vm
}
