//! Function built-in.
//!
//! Function objects come from declarations and expressions only; the
//! constructor refuses to compile source strings.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::FunctionKind;
use crate::runner::ds::object::ObjectKind;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::call_function;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::core::arg;

/// Register the Function built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let function = BuiltInObject::new("Function")
        .with_constructor(function_constructor)
        .add_prototype_method("call", function_call)
        .add_prototype_method("apply", function_apply)
        .add_prototype_method("toString", function_to_string);

    registry.register_object(function);
}

/// Function constructor.
fn function_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Err(JErrorType::TypeError(
        "Function constructor is not supported".to_string(),
    ))
}

/// Function.prototype.call
fn function_call(
    ctx: &mut EvalContext,
    this: JsValue,
    mut args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let this_arg = if args.is_empty() {
        JsValue::Undefined
    } else {
        args.remove(0)
    };
    call_function(ctx, &this, this_arg, args)
}

/// Function.prototype.apply
fn function_apply(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let array_like = arg(&args, 1);
    let call_args = match &array_like {
        JsValue::Undefined | JsValue::Null => vec![],
        JsValue::Object(o) => match &o.borrow().kind {
            ObjectKind::Array(elements) => elements.clone(),
            _ => vec![],
        },
        _ => {
            return Err(JErrorType::TypeError(
                "CreateListFromArrayLike called on non-object".to_string(),
            ))
        }
    };
    call_function(ctx, &this, arg(&args, 0), call_args)
}

/// Function.prototype.toString
fn function_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let description = match &this {
        JsValue::Object(o) => o.borrow().as_function().map(|f| match f {
            FunctionKind::Native(n) => format!("function {}() {{ [native code] }}", n.name),
            FunctionKind::Script(s) => format!("function {}() {{ [code] }}", s.data.name()),
        }),
        _ => None,
    };
    description.map(JsValue::String).ok_or_else(|| {
        JErrorType::TypeError(
            "Function.prototype.toString requires that 'this' be a Function".to_string(),
        )
    })
}
