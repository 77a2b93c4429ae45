//! Console built-in object.
//!
//! Provides console.log, console.error, console.warn, and console.info
//! methods. Installed into a fresh scope only when the engine configuration
//! enables it.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{JsObjectType, ObjectKind};
use crate::runner::ds::operations::object::{get, own_enumerable_keys};
use crate::runner::ds::operations::type_conversion::{number_to_string, primitive_to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

/// Register the console object with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let console = BuiltInObject::new("console")
        .add_method("log", console_log)
        .add_method("error", console_error)
        .add_method("warn", console_warn)
        .add_method("info", console_info);

    registry.register_object(console);
}

/// Format a value nested inside an object or array.
fn format_nested(value: &JsValue, depth: usize) -> Result<String, JErrorType> {
    match value {
        JsValue::String(s) => Ok(format!("'{}'", s)),
        JsValue::Object(o) => format_object(o, depth),
        other => Ok(primitive_to_string(other)),
    }
}

fn format_object(object: &JsObjectType, depth: usize) -> Result<String, JErrorType> {
    let (elements, function_name, is_error) = {
        let o = object.borrow();
        let elements = match &o.kind {
            ObjectKind::Array(elements) => Some(elements.clone()),
            _ => None,
        };
        let function_name = o.as_function().map(|f| f.name().to_string());
        (elements, function_name, matches!(o.kind, ObjectKind::Error))
    };
    if let Some(name) = function_name {
        return Ok(if name.is_empty() {
            "[Function (anonymous)]".to_string()
        } else {
            format!("[Function: {}]", name)
        });
    }
    if is_error {
        return Ok(match get(object, "stack")? {
            JsValue::String(stack) => stack,
            _ => "Error".to_string(),
        });
    }
    if depth > 2 {
        return Ok(if elements.is_some() { "[Array]" } else { "[Object]" }.to_string());
    }
    match elements {
        Some(elements) => {
            if elements.is_empty() {
                return Ok("[]".to_string());
            }
            let parts = elements
                .iter()
                .map(|e| format_nested(e, depth + 1))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("[ {} ]", parts.join(", ")))
        }
        None => {
            let keys = own_enumerable_keys(object)?;
            if keys.is_empty() {
                return Ok("{}".to_string());
            }
            let mut parts = Vec::with_capacity(keys.len());
            for key in keys {
                let value = get(object, &key)?;
                parts.push(format!("{}: {}", key, format_nested(&value, depth + 1)?));
            }
            Ok(format!("{{ {} }}", parts.join(", ")))
        }
    }
}

/// Format a JsValue for console output.
fn format_value(value: &JsValue) -> Result<String, JErrorType> {
    match value {
        JsValue::String(s) => Ok(s.clone()),
        JsValue::Number(n) => Ok(number_to_string(n.to_f64())),
        JsValue::Object(o) => format_object(o, 0),
        other => Ok(primitive_to_string(other)),
    }
}

/// Format all arguments for console output.
fn format_args(args: &[JsValue]) -> Result<String, JErrorType> {
    Ok(args
        .iter()
        .map(format_value)
        .collect::<Result<Vec<_>, _>>()?
        .join(" "))
}

/// console.log - Log to stdout.
fn console_log(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    println!("{}", format_args(&args)?);
    Ok(JsValue::Undefined)
}

/// console.error - Log to stderr.
fn console_error(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    eprintln!("{}", format_args(&args)?);
    Ok(JsValue::Undefined)
}

/// console.warn - Log warning to stderr.
fn console_warn(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    eprintln!("{}", format_args(&args)?);
    Ok(JsValue::Undefined)
}

/// console.info - Log info to stdout (same as log).
fn console_info(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    println!("{}", format_args(&args)?);
    Ok(JsValue::Undefined)
}
