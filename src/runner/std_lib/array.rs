//! Array built-in.
//!
//! Provides the Array constructor and prototype methods. Methods operate on
//! the dense element storage directly; callbacks run against a snapshot of
//! the elements so they may mutate the array freely.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{JsObjectType, ObjectKind};
use crate::runner::ds::operations::test_and_comparison::strict_equality;
use crate::runner::ds::operations::type_conversion::{is_callable, to_boolean, to_number, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::call_function;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::core::{arg, relative_index};

/// Register the Array built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let array = BuiltInObject::new("Array")
        .with_constructor(array_constructor)
        .add_method("isArray", is_array)
        .add_prototype_method("push", array_push)
        .add_prototype_method("pop", array_pop)
        .add_prototype_method("join", array_join)
        .add_prototype_method("indexOf", array_index_of)
        .add_prototype_method("includes", array_includes)
        .add_prototype_method("slice", array_slice)
        .add_prototype_method("concat", array_concat)
        .add_prototype_method("map", array_map)
        .add_prototype_method("forEach", array_for_each)
        .add_prototype_method("filter", array_filter)
        .add_prototype_method("toString", array_to_string);

    registry.register_object(array);
}

fn this_array(this: &JsValue, method: &str) -> Result<JsObjectType, JErrorType> {
    match this {
        JsValue::Object(o) if o.borrow().is_array() => Ok(o.clone()),
        _ => Err(JErrorType::TypeError(format!(
            "Array.prototype.{} called on non-array",
            method
        ))),
    }
}

fn elements(array: &JsObjectType) -> Vec<JsValue> {
    match &array.borrow().kind {
        ObjectKind::Array(elements) => elements.clone(),
        _ => vec![],
    }
}

fn callback(args: &[JsValue]) -> Result<JsValue, JErrorType> {
    let f = arg(args, 0);
    if is_callable(&f) {
        Ok(f)
    } else {
        Err(JErrorType::TypeError(format!("{} is not a function", f)))
    }
}

/// Runs `f(element, index, array)` over a snapshot of the elements.
fn each_result(
    ctx: &mut EvalContext,
    array: &JsObjectType,
    args: &[JsValue],
) -> Result<Vec<(JsValue, JsValue)>, JErrorType> {
    let f = callback(args)?;
    let this_arg = arg(args, 1);
    let mut results = vec![];
    for (index, element) in elements(array).into_iter().enumerate() {
        let result = call_function(
            ctx,
            &f,
            this_arg.clone(),
            vec![
                element.clone(),
                JsValue::from(index as i64),
                JsValue::Object(array.clone()),
            ],
        )?;
        results.push((element, result));
    }
    Ok(results)
}

/// Array constructor.
///
/// A single numeric argument creates an array of that length filled with
/// `undefined`; anything else becomes the elements.
fn array_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    if let [JsValue::Number(n)] = args.as_slice() {
        let len = n.to_f64();
        if len < 0.0 || len.fract() != 0.0 || len > u32::MAX as f64 {
            return Err(JErrorType::RangeError("Invalid array length".to_string()));
        }
        return Ok(JsValue::Object(
            ctx.new_array(vec![JsValue::Undefined; len as usize]),
        ));
    }
    Ok(JsValue::Object(ctx.new_array(args)))
}

/// Array.isArray
fn is_array(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(match &arg(&args, 0) {
        JsValue::Object(o) => o.borrow().is_array(),
        _ => false,
    }))
}

/// Array.prototype.push
fn array_push(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let array = this_array(&this, "push")?;
    let mut a = array.borrow_mut();
    if !a.base.is_extensible() {
        return Err(JErrorType::TypeError(
            "Cannot add property, object is not extensible".to_string(),
        ));
    }
    match &mut a.kind {
        ObjectKind::Array(elements) => {
            elements.extend(args);
            Ok(JsValue::from(elements.len() as i64))
        }
        _ => Ok(JsValue::Undefined),
    }
}

/// Array.prototype.pop
fn array_pop(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let array = this_array(&this, "pop")?;
    let mut a = array.borrow_mut();
    match &mut a.kind {
        ObjectKind::Array(elements) => Ok(elements.pop().unwrap_or(JsValue::Undefined)),
        _ => Ok(JsValue::Undefined),
    }
}

/// Array.prototype.join
fn array_join(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let array = this_array(&this, "join")?;
    let separator = match arg(&args, 0) {
        JsValue::Undefined => ",".to_string(),
        other => to_string(ctx, &other)?,
    };
    let mut parts = vec![];
    for element in elements(&array) {
        parts.push(match element {
            JsValue::Undefined | JsValue::Null => String::new(),
            other => to_string(ctx, &other)?,
        });
    }
    Ok(JsValue::String(parts.join(&separator)))
}

/// Array.prototype.toString
fn array_to_string(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    array_join(ctx, this, vec![])
}

/// Array.prototype.indexOf
fn array_index_of(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let array = this_array(&this, "indexOf")?;
    let items = elements(&array);
    let from = relative_index(to_number(ctx, &arg(&args, 1))?, items.len());
    let needle = arg(&args, 0);
    let found = items
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, v)| strict_equality(v, &needle))
        .map(|(i, _)| i as i64)
        .unwrap_or(-1);
    Ok(JsValue::from(found))
}

/// Array.prototype.includes
///
/// Unlike `indexOf` this finds `NaN`.
fn array_includes(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let array = this_array(&this, "includes")?;
    let needle = arg(&args, 0);
    let is_nan = |v: &JsValue| v.as_f64().map(f64::is_nan).unwrap_or(false);
    Ok(JsValue::Boolean(elements(&array).iter().any(|v| {
        strict_equality(v, &needle) || (is_nan(v) && is_nan(&needle))
    })))
}

/// Array.prototype.slice
fn array_slice(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let array = this_array(&this, "slice")?;
    let items = elements(&array);
    let len = items.len();
    let start = relative_index(to_number(ctx, &arg(&args, 0))?, len);
    let end = match arg(&args, 1) {
        JsValue::Undefined => len,
        other => relative_index(to_number(ctx, &other)?, len),
    };
    let sliced = if start < end {
        items[start..end].to_vec()
    } else {
        vec![]
    };
    Ok(JsValue::Object(ctx.new_array(sliced)))
}

/// Array.prototype.concat
fn array_concat(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let array = this_array(&this, "concat")?;
    let mut result = elements(&array);
    for item in args {
        let spread = match &item {
            JsValue::Object(o) if o.borrow().is_array() => Some(elements(o)),
            _ => None,
        };
        match spread {
            Some(items) => result.extend(items),
            None => result.push(item),
        }
    }
    Ok(JsValue::Object(ctx.new_array(result)))
}

/// Array.prototype.map
fn array_map(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let array = this_array(&this, "map")?;
    let mapped = each_result(ctx, &array, &args)?
        .into_iter()
        .map(|(_, result)| result)
        .collect();
    Ok(JsValue::Object(ctx.new_array(mapped)))
}

/// Array.prototype.forEach
fn array_for_each(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let array = this_array(&this, "forEach")?;
    each_result(ctx, &array, &args)?;
    Ok(JsValue::Undefined)
}

/// Array.prototype.filter
fn array_filter(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let array = this_array(&this, "filter")?;
    let kept = each_result(ctx, &array, &args)?
        .into_iter()
        .filter(|(_, keep)| to_boolean(keep))
        .map(|(element, _)| element)
        .collect();
    Ok(JsValue::Object(ctx.new_array(kept)))
}
