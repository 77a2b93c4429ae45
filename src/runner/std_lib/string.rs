//! String built-in.
//!
//! Provides the String constructor and prototype methods. Positions are
//! counted in UTF-16 code units, as script code sees them.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::{to_number, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::core::{arg, relative_index};

/// Register the String built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let string = BuiltInObject::new("String")
        .with_constructor(string_constructor)
        .add_method("fromCharCode", string_from_char_code)
        .add_prototype_method("charAt", string_char_at)
        .add_prototype_method("charCodeAt", string_char_code_at)
        .add_prototype_method("indexOf", string_index_of)
        .add_prototype_method("includes", string_includes)
        .add_prototype_method("startsWith", string_starts_with)
        .add_prototype_method("endsWith", string_ends_with)
        .add_prototype_method("slice", string_slice)
        .add_prototype_method("substring", string_substring)
        .add_prototype_method("split", string_split)
        .add_prototype_method("trim", string_trim)
        .add_prototype_method("toUpperCase", string_to_upper_case)
        .add_prototype_method("toLowerCase", string_to_lower_case)
        .add_prototype_method("toString", string_to_string)
        .add_prototype_method("valueOf", string_to_string);

    registry.register_object(string);
}

fn this_string(ctx: &mut EvalContext, this: &JsValue, method: &str) -> Result<String, JErrorType> {
    match this {
        JsValue::String(s) => Ok(s.clone()),
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "String.prototype.{} called on null or undefined",
            method
        ))),
        other => to_string(ctx, other),
    }
}

fn units(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

fn from_units(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
}

fn find_units(haystack: &[u16], needle: &[u16], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    if needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| &haystack[i..i + needle.len()] == needle)
}

fn integer_arg(ctx: &mut EvalContext, args: &[JsValue], index: usize) -> Result<f64, JErrorType> {
    let n = to_number(ctx, &arg(args, index))?;
    Ok(if n.is_nan() { 0.0 } else { n.trunc() })
}

/// String constructor.
///
/// Both `String(v)` and `new String(v)` convert to a string primitive.
fn string_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    if args.is_empty() {
        return Ok(JsValue::String(String::new()));
    }
    Ok(JsValue::String(to_string(ctx, &args[0])?))
}

/// String.fromCharCode
fn string_from_char_code(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let mut code_units = Vec::with_capacity(args.len());
    for a in args.iter() {
        let n = to_number(ctx, a)?;
        code_units.push(if n.is_finite() { n.trunc().rem_euclid(65536.0) as u16 } else { 0 });
    }
    Ok(JsValue::String(from_units(&code_units)))
}

/// String.prototype.charAt
fn string_char_at(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = units(&this_string(ctx, &this, "charAt")?);
    let index = integer_arg(ctx, &args, 0)?;
    if index < 0.0 || index >= s.len() as f64 {
        return Ok(JsValue::String(String::new()));
    }
    let i = index as usize;
    Ok(JsValue::String(from_units(&s[i..i + 1])))
}

/// String.prototype.charCodeAt
fn string_char_code_at(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = units(&this_string(ctx, &this, "charCodeAt")?);
    let index = integer_arg(ctx, &args, 0)?;
    if index < 0.0 || index >= s.len() as f64 {
        return Ok(JsValue::number(f64::NAN));
    }
    Ok(JsValue::from(s[index as usize] as i64))
}

/// String.prototype.indexOf
fn string_index_of(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = units(&this_string(ctx, &this, "indexOf")?);
    let needle = units(&to_string(ctx, &arg(&args, 0))?);
    let from = integer_arg(ctx, &args, 1)?.max(0.0).min(s.len() as f64) as usize;
    Ok(JsValue::from(
        find_units(&s, &needle, from).map(|i| i as i64).unwrap_or(-1),
    ))
}

/// String.prototype.includes
fn string_includes(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = units(&this_string(ctx, &this, "includes")?);
    let needle = units(&to_string(ctx, &arg(&args, 0))?);
    let from = integer_arg(ctx, &args, 1)?.max(0.0).min(s.len() as f64) as usize;
    Ok(JsValue::Boolean(find_units(&s, &needle, from).is_some()))
}

/// String.prototype.startsWith
fn string_starts_with(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = units(&this_string(ctx, &this, "startsWith")?);
    let needle = units(&to_string(ctx, &arg(&args, 0))?);
    let start = integer_arg(ctx, &args, 1)?.max(0.0).min(s.len() as f64) as usize;
    Ok(JsValue::Boolean(s[start..].starts_with(&needle)))
}

/// String.prototype.endsWith
fn string_ends_with(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = units(&this_string(ctx, &this, "endsWith")?);
    let needle = units(&to_string(ctx, &arg(&args, 0))?);
    let end = match arg(&args, 1) {
        JsValue::Undefined => s.len(),
        _ => integer_arg(ctx, &args, 1)?.max(0.0).min(s.len() as f64) as usize,
    };
    Ok(JsValue::Boolean(s[..end].ends_with(&needle)))
}

/// String.prototype.slice
fn string_slice(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = units(&this_string(ctx, &this, "slice")?);
    let start = relative_index(to_number(ctx, &arg(&args, 0))?, s.len());
    let end = match arg(&args, 1) {
        JsValue::Undefined => s.len(),
        other => relative_index(to_number(ctx, &other)?, s.len()),
    };
    if start >= end {
        return Ok(JsValue::String(String::new()));
    }
    Ok(JsValue::String(from_units(&s[start..end])))
}

/// String.prototype.substring
fn string_substring(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = units(&this_string(ctx, &this, "substring")?);
    let len = s.len() as f64;
    let start = integer_arg(ctx, &args, 0)?.max(0.0).min(len) as usize;
    let end = match arg(&args, 1) {
        JsValue::Undefined => s.len(),
        _ => integer_arg(ctx, &args, 1)?.max(0.0).min(len) as usize,
    };
    let (from, to) = if start <= end { (start, end) } else { (end, start) };
    Ok(JsValue::String(from_units(&s[from..to])))
}

/// String.prototype.split
fn string_split(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = this_string(ctx, &this, "split")?;
    let limit = match arg(&args, 1) {
        JsValue::Undefined => usize::MAX,
        other => to_number(ctx, &other)?.max(0.0) as usize,
    };
    let parts: Vec<JsValue> = match arg(&args, 0) {
        JsValue::Undefined => vec![JsValue::String(s)],
        separator => {
            let separator = to_string(ctx, &separator)?;
            if separator.is_empty() {
                units(&s)
                    .chunks(1)
                    .map(|u| JsValue::String(from_units(u)))
                    .collect()
            } else {
                s.split(separator.as_str())
                    .map(|p| JsValue::String(p.to_string()))
                    .collect()
            }
        }
    };
    Ok(JsValue::Object(
        ctx.new_array(parts.into_iter().take(limit).collect()),
    ))
}

/// String.prototype.trim
fn string_trim(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = this_string(ctx, &this, "trim")?;
    Ok(JsValue::String(s.trim().to_string()))
}

/// String.prototype.toUpperCase
fn string_to_upper_case(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = this_string(ctx, &this, "toUpperCase")?;
    Ok(JsValue::String(s.to_uppercase()))
}

/// String.prototype.toLowerCase
fn string_to_lower_case(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = this_string(ctx, &this, "toLowerCase")?;
    Ok(JsValue::String(s.to_lowercase()))
}

/// String.prototype.toString and String.prototype.valueOf
fn string_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match this {
        JsValue::String(s) => Ok(JsValue::String(s)),
        _ => Err(JErrorType::TypeError(
            "String.prototype.toString requires that 'this' be a String".to_string(),
        )),
    }
}
