//! Number built-in.
//!
//! Provides the Number constructor, its constants and statics, the methods of
//! `Number.prototype` and the global `parseInt`, `parseFloat`, `isNaN` and
//! `isFinite` functions.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::{number_to_string, to_number, to_string};
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::core::arg;

const MAX_SAFE_INTEGER: f64 = 9007199254740991.0;

/// Register the Number built-in and the numeric global functions.
pub fn register(registry: &mut BuiltInRegistry) {
    let number = BuiltInObject::new("Number")
        .with_constructor(number_constructor)
        .add_property("MAX_VALUE", JsValue::number(f64::MAX))
        .add_property("MIN_VALUE", JsValue::number(5e-324))
        .add_property("POSITIVE_INFINITY", JsValue::Number(JsNumberType::PositiveInfinity))
        .add_property("NEGATIVE_INFINITY", JsValue::Number(JsNumberType::NegativeInfinity))
        .add_property("NaN", JsValue::Number(JsNumberType::NaN))
        .add_property("MAX_SAFE_INTEGER", JsValue::number(MAX_SAFE_INTEGER))
        .add_property("MIN_SAFE_INTEGER", JsValue::number(-MAX_SAFE_INTEGER))
        .add_property("EPSILON", JsValue::number(f64::EPSILON))
        .add_method("isNaN", number_is_nan)
        .add_method("isFinite", number_is_finite)
        .add_method("isInteger", number_is_integer)
        .add_method("isSafeInteger", number_is_safe_integer)
        .add_method("parseFloat", parse_float)
        .add_method("parseInt", parse_int)
        .add_prototype_method("toString", number_to_string_method)
        .add_prototype_method("toFixed", number_to_fixed)
        .add_prototype_method("valueOf", number_value_of);

    registry.register_object(number);

    registry.register_global_function("parseInt", parse_int);
    registry.register_global_function("parseFloat", parse_float);
    registry.register_global_function("isNaN", global_is_nan);
    registry.register_global_function("isFinite", global_is_finite);
}

fn this_number(this: &JsValue, method: &str) -> Result<f64, JErrorType> {
    this.as_f64().ok_or_else(|| {
        JErrorType::TypeError(format!(
            "Number.prototype.{} requires that 'this' be a Number",
            method
        ))
    })
}

/// Number constructor.
fn number_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    if args.is_empty() {
        return Ok(JsValue::from(0i64));
    }
    Ok(JsValue::number(to_number(ctx, &args[0])?))
}

/// Number.isNaN - no coercion, only numbers can be NaN.
fn number_is_nan(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(
        arg(&args, 0).as_f64().map(f64::is_nan).unwrap_or(false),
    ))
}

/// Number.isFinite
fn number_is_finite(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(
        arg(&args, 0).as_f64().map(f64::is_finite).unwrap_or(false),
    ))
}

/// Number.isInteger
fn number_is_integer(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(
        arg(&args, 0)
            .as_f64()
            .map(|n| n.is_finite() && n.fract() == 0.0)
            .unwrap_or(false),
    ))
}

/// Number.isSafeInteger
fn number_is_safe_integer(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(
        arg(&args, 0)
            .as_f64()
            .map(|n| n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER)
            .unwrap_or(false),
    ))
}

/// isNaN - coerces its argument first.
fn global_is_nan(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(to_number(ctx, &arg(&args, 0))?.is_nan()))
}

/// isFinite - coerces its argument first.
fn global_is_finite(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(to_number(ctx, &arg(&args, 0))?.is_finite()))
}

/// parseFloat - parses the longest numeric prefix.
fn parse_float(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = to_string(ctx, &arg(&args, 0))?;
    Ok(JsValue::number(parse_float_prefix(s.trim_start())))
}

/// parseInt - parses the longest prefix of digits in the given radix.
fn parse_int(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = to_string(ctx, &arg(&args, 0))?;
    let radix = match arg(&args, 1) {
        JsValue::Undefined => 0,
        other => {
            let r = to_number(ctx, &other)?;
            if r.is_finite() {
                r.trunc() as i64
            } else {
                0
            }
        }
    };
    Ok(JsValue::number(parse_int_prefix(s.trim_start(), radix)))
}

pub(crate) fn parse_int_prefix(s: &str, radix: i64) -> f64 {
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let has_hex_prefix = rest.starts_with("0x") || rest.starts_with("0X");
    let (radix, digits) = match radix {
        0 if has_hex_prefix => (16, &rest[2..]),
        0 => (10, rest),
        16 if has_hex_prefix => (16, &rest[2..]),
        r if (2..=36).contains(&r) => (r as u32, rest),
        _ => return f64::NAN,
    };
    let mut value = 0.0;
    let mut seen = false;
    for c in digits.chars() {
        match c.to_digit(radix) {
            Some(d) => {
                value = value * radix as f64 + d as f64;
                seen = true;
            }
            None => break,
        }
    }
    if !seen {
        return f64::NAN;
    }
    if negative {
        -value
    } else {
        value
    }
}

pub(crate) fn parse_float_prefix(s: &str) -> f64 {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        return if bytes.first() == Some(&b'-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start || &s[digits_start..end] == "." {
        return f64::NAN;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// Number.prototype.toString
fn number_to_string_method(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let n = this_number(&this, "toString")?;
    let radix = match arg(&args, 0) {
        JsValue::Undefined => 10.0,
        other => to_number(ctx, &other)?.trunc(),
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(JErrorType::RangeError(
            "toString() radix must be between 2 and 36".to_string(),
        ));
    }
    if radix == 10.0 || !n.is_finite() {
        return Ok(JsValue::String(number_to_string(n)));
    }
    Ok(JsValue::String(format_radix(n, radix as u32)))
}

/// Number.prototype.toFixed
fn number_to_fixed(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let n = this_number(&this, "toFixed")?;
    let digits = to_number(ctx, &arg(&args, 0))?;
    let digits = if digits.is_nan() { 0.0 } else { digits.trunc() };
    if !(0.0..=100.0).contains(&digits) {
        return Err(JErrorType::RangeError(
            "toFixed() digits argument must be between 0 and 100".to_string(),
        ));
    }
    if !n.is_finite() || n.abs() >= 1e21 {
        return Ok(JsValue::String(number_to_string(n)));
    }
    Ok(JsValue::String(format!("{:.*}", digits as usize, n)))
}

/// Number.prototype.valueOf
fn number_value_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::number(this_number(&this, "valueOf")?))
}

/// Format a finite number in a given radix, with up to 20 fraction digits.
fn format_radix(n: f64, radix: u32) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let radix_f = radix as f64;
    let negative = n < 0.0;
    let mut integer = n.abs().trunc();
    let mut fraction = n.abs().fract();

    let mut result = Vec::new();
    if integer == 0.0 {
        result.push(b'0');
    }
    while integer > 0.0 {
        result.push(DIGITS[(integer % radix_f) as usize]);
        integer = (integer / radix_f).trunc();
    }
    if negative {
        result.push(b'-');
    }
    result.reverse();

    if fraction > 0.0 {
        result.push(b'.');
        for _ in 0..20 {
            fraction *= radix_f;
            let digit = fraction.trunc();
            result.push(DIGITS[digit as usize]);
            fraction -= digit;
            if fraction == 0.0 {
                break;
            }
        }
    }
    result.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integer_prefixes() {
        assert_eq!(parse_int_prefix("42px", 0), 42.0);
        assert_eq!(parse_int_prefix("-0x1A", 0), -26.0);
        assert_eq!(parse_int_prefix("101", 2), 5.0);
        assert!(parse_int_prefix("px", 0).is_nan());
        assert!(parse_int_prefix("1", 37).is_nan());
    }

    #[test]
    fn parses_float_prefixes() {
        assert_eq!(parse_float_prefix("3.14abc"), 3.14);
        assert_eq!(parse_float_prefix("1e3x"), 1000.0);
        assert_eq!(parse_float_prefix("2e"), 2.0);
        assert_eq!(parse_float_prefix("-Infinity"), f64::NEG_INFINITY);
        assert!(parse_float_prefix(".").is_nan());
    }

    #[test]
    fn formats_in_other_radixes() {
        assert_eq!(format_radix(255.0, 16), "ff");
        assert_eq!(format_radix(-5.0, 2), "-101");
        assert_eq!(format_radix(0.5, 2), "0.1");
    }
}
