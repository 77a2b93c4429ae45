//! JSON built-in object.
//!
//! Provides JSON.parse and JSON.stringify on top of `serde_json`. Objects
//! are read through the interceptable operations, so stringifying a
//! contextified global serializes what its sandbox holds.

use std::rc::Rc;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Number, Value};

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{JsObjectType, ObjectKind};
use crate::runner::ds::operations::object::{get, own_enumerable_keys, set};
use crate::runner::ds::operations::type_conversion::{to_number, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::core::arg;

const MAX_SAFE_INTEGER: f64 = 9007199254740991.0;

/// Register the JSON object with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let json = BuiltInObject::new("JSON")
        .add_method("parse", json_parse)
        .add_method("stringify", json_stringify);

    registry.register_object(json);
}

/// JSON.parse - Parse JSON string to JavaScript value.
fn json_parse(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let text = to_string(ctx, &arg(&args, 0))?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|e| JErrorType::SyntaxError(format!("Unexpected token in JSON: {}", e)))?;
    from_json(ctx, value)
}

fn from_json(ctx: &EvalContext, value: Value) -> Result<JsValue, JErrorType> {
    Ok(match value {
        Value::Null => JsValue::Null,
        Value::Bool(b) => JsValue::Boolean(b),
        Value::Number(n) => JsValue::number(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => JsValue::String(s),
        Value::Array(items) => {
            let elements = items
                .into_iter()
                .map(|item| from_json(ctx, item))
                .collect::<Result<Vec<_>, _>>()?;
            JsValue::Object(ctx.new_array(elements))
        }
        Value::Object(entries) => {
            let object = ctx.new_object();
            for (key, item) in entries {
                set(&object, &key, from_json(ctx, item)?)?;
            }
            JsValue::Object(object)
        }
    })
}

/// JSON.stringify - Convert JavaScript value to JSON string.
///
/// The replacer argument is ignored. `undefined`, functions and a value that
/// serializes to nothing at the top level yield `undefined`.
fn json_stringify(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let mut stack = vec![];
    let value = match to_json(&arg(&args, 0), &mut stack)? {
        Some(v) => v,
        None => return Ok(JsValue::Undefined),
    };
    let indent = match arg(&args, 2) {
        JsValue::String(s) => s.chars().take(10).collect::<String>(),
        n @ JsValue::Number(_) => {
            let width = to_number(ctx, &n)?.max(0.0).min(10.0) as usize;
            " ".repeat(width)
        }
        _ => String::new(),
    };
    let text = if indent.is_empty() {
        serde_json::to_string(&value)
    } else {
        pretty(&value, &indent)
    }
    .map_err(|e| JErrorType::TypeError(e.to_string()))?;
    Ok(JsValue::String(text))
}

fn pretty(value: &Value, indent: &str) -> Result<String, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

fn number_to_json(n: f64) -> Value {
    if !n.is_finite() {
        return Value::Null;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Value::from(n as i64);
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

/// `None` for values JSON has no representation for.
fn to_json(value: &JsValue, stack: &mut Vec<JsObjectType>) -> Result<Option<Value>, JErrorType> {
    let object = match value {
        JsValue::Undefined => return Ok(None),
        JsValue::Null => return Ok(Some(Value::Null)),
        JsValue::Boolean(b) => return Ok(Some(Value::Bool(*b))),
        JsValue::Number(n) => return Ok(Some(number_to_json(n.to_f64()))),
        JsValue::String(s) => return Ok(Some(Value::String(s.clone()))),
        JsValue::Object(o) => o,
    };
    if object.borrow().is_callable() {
        return Ok(None);
    }
    if stack.iter().any(|seen| Rc::ptr_eq(seen, object)) {
        return Err(JErrorType::TypeError(
            "Converting circular structure to JSON".to_string(),
        ));
    }
    stack.push(object.clone());
    let elements = match &object.borrow().kind {
        ObjectKind::Array(elements) => Some(elements.clone()),
        _ => None,
    };
    let result = match elements {
        Some(elements) => {
            let mut items = Vec::with_capacity(elements.len());
            for element in elements.iter() {
                items.push(to_json(element, stack)?.unwrap_or(Value::Null));
            }
            Value::Array(items)
        }
        None => {
            let mut entries = Map::new();
            for key in own_enumerable_keys(object)? {
                if let Some(v) = to_json(&get(object, &key)?, stack)? {
                    entries.insert(key, v);
                }
            }
            Value::Object(entries)
        }
    };
    stack.pop();
    Ok(Some(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_map_to_the_shortest_json_form() {
        assert_eq!(number_to_json(3.0), Value::from(3));
        assert_eq!(number_to_json(0.5).to_string(), "0.5");
        assert_eq!(number_to_json(f64::NAN), Value::Null);
        assert_eq!(number_to_json(f64::INFINITY), Value::Null);
    }
}
