//! Error built-in objects.
//!
//! Provides the Error, TypeError, ReferenceError, SyntaxError and RangeError
//! constructors. All of them share one native constructor: the prototype a
//! new error gets is read from the constructor actually being called.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{new_object, JsObjectType, ObjectKind};
use crate::runner::ds::object_property::{PropertyAttributes, PropertyDescriptor};
use crate::runner::ds::operations::object::get;
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::core::{arg, this_object};

const NATIVE_ERRORS: [&str; 4] = ["TypeError", "ReferenceError", "SyntaxError", "RangeError"];

/// Register all error types with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let error = BuiltInObject::new("Error")
        .with_constructor(error_constructor)
        .add_prototype_property("name", JsValue::from("Error"))
        .add_prototype_property("message", JsValue::from(""))
        .add_prototype_method("toString", error_to_string);
    registry.register_object(error);

    for name in NATIVE_ERRORS.iter() {
        let native_error = BuiltInObject::new(*name)
            .with_prototype("Error")
            .with_constructor(error_constructor)
            .add_prototype_property("name", JsValue::from(*name))
            .add_prototype_property("message", JsValue::from(""));
        registry.register_object(native_error);
    }
}

fn define_hidden(object: &JsObjectType, name: &str, value: JsValue) {
    object
        .borrow_mut()
        .define_real_property(name, PropertyDescriptor::new(value, PropertyAttributes::hidden()));
}

/// `"Name: message"`, or whichever half is non-empty.
fn error_header(ctx: &mut EvalContext, error: &JsObjectType) -> Result<String, JErrorType> {
    let name = match get(error, "name")? {
        JsValue::Undefined => "Error".to_string(),
        other => to_string(ctx, &other)?,
    };
    let message = match get(error, "message")? {
        JsValue::Undefined => String::new(),
        other => to_string(ctx, &other)?,
    };
    Ok(if name.is_empty() {
        message
    } else if message.is_empty() {
        name
    } else {
        format!("{}: {}", name, message)
    })
}

/// Shared constructor of every error type.
///
/// Works with and without `new`. `message` is only set when an argument
/// other than `undefined` is passed; `stack` records the script the error
/// was created in.
fn error_constructor(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let error = match (&ctx.new_target, this) {
        (Some(_), JsValue::Object(o)) => {
            {
                let mut e = o.borrow_mut();
                e.kind = ObjectKind::Error;
                e.base.set_class_name("Error");
            }
            o
        }
        _ => {
            let prototype = match &ctx.callee {
                Some(callee) => match get(callee, "prototype")? {
                    JsValue::Object(p) => p,
                    _ => ctx.realm.intrinsics().prototype_or_object("Error"),
                },
                None => ctx.realm.intrinsics().prototype_or_object("Error"),
            };
            new_object("Error", Some(prototype), ObjectKind::Error)
        }
    };
    let message = arg(&args, 0);
    if !matches!(message, JsValue::Undefined) {
        let message = to_string(ctx, &message)?;
        define_hidden(&error, "message", JsValue::String(message));
    }
    let stack = format!("{}\n    at {}", error_header(ctx, &error)?, ctx.script_name);
    define_hidden(&error, "stack", JsValue::String(stack));
    Ok(JsValue::Object(error))
}

/// Error.prototype.toString
fn error_to_string(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let error = this_object(&this, "Error.prototype.toString")?;
    Ok(JsValue::String(error_header(ctx, &error)?))
}
