//! Math built-in object.
//!
//! Provides mathematical constants and functions. Arguments go through the
//! full number conversion, so `Math.max("3", { valueOf() { return 4 } })`
//! behaves as in any other engine.

use std::cell::Cell;
use std::f64::consts;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::{to_number, to_uint32};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::core::arg;

/// Register the Math object with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let math = BuiltInObject::new("Math")
        // Constants
        .add_property("E", JsValue::number(consts::E))
        .add_property("LN10", JsValue::number(consts::LN_10))
        .add_property("LN2", JsValue::number(consts::LN_2))
        .add_property("LOG10E", JsValue::number(consts::LOG10_E))
        .add_property("LOG2E", JsValue::number(consts::LOG2_E))
        .add_property("PI", JsValue::number(consts::PI))
        .add_property("SQRT1_2", JsValue::number(consts::FRAC_1_SQRT_2))
        .add_property("SQRT2", JsValue::number(consts::SQRT_2))
        // Methods
        .add_method("abs", math_abs)
        .add_method("floor", math_floor)
        .add_method("ceil", math_ceil)
        .add_method("round", math_round)
        .add_method("trunc", math_trunc)
        .add_method("sign", math_sign)
        .add_method("min", math_min)
        .add_method("max", math_max)
        .add_method("sqrt", math_sqrt)
        .add_method("cbrt", math_cbrt)
        .add_method("pow", math_pow)
        .add_method("exp", math_exp)
        .add_method("log", math_log)
        .add_method("log2", math_log2)
        .add_method("log10", math_log10)
        .add_method("sin", math_sin)
        .add_method("cos", math_cos)
        .add_method("tan", math_tan)
        .add_method("atan2", math_atan2)
        .add_method("hypot", math_hypot)
        .add_method("clz32", math_clz32)
        .add_method("random", math_random);

    registry.register_object(math);
}

fn number_arg(ctx: &mut EvalContext, args: &[JsValue], index: usize) -> Result<f64, JErrorType> {
    to_number(ctx, &arg(args, index))
}

fn unary(
    ctx: &mut EvalContext,
    args: &[JsValue],
    op: fn(f64) -> f64,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::number(op(number_arg(ctx, args, 0)?)))
}

/// Math.abs
fn math_abs(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(ctx, &args, f64::abs)
}

/// Math.floor
fn math_floor(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(ctx, &args, f64::floor)
}

/// Math.ceil
fn math_ceil(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(ctx, &args, f64::ceil)
}

/// Math.round - halves round towards +Infinity.
fn math_round(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(ctx, &args, |x| {
        if !x.is_finite() || x.fract() == 0.0 {
            x
        } else {
            (x + 0.5).floor()
        }
    })
}

/// Math.trunc
fn math_trunc(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(ctx, &args, f64::trunc)
}

/// Math.sign
fn math_sign(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(ctx, &args, |x| {
        if x.is_nan() || x == 0.0 {
            x
        } else {
            x.signum()
        }
    })
}

/// Math.min - `Infinity` with no arguments, NaN if any argument is NaN.
fn math_min(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let mut result = f64::INFINITY;
    for a in args.iter() {
        let n = to_number(ctx, a)?;
        if n.is_nan() || result.is_nan() {
            result = f64::NAN;
        } else if n < result {
            result = n;
        }
    }
    Ok(JsValue::number(result))
}

/// Math.max - `-Infinity` with no arguments, NaN if any argument is NaN.
fn math_max(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let mut result = f64::NEG_INFINITY;
    for a in args.iter() {
        let n = to_number(ctx, a)?;
        if n.is_nan() || result.is_nan() {
            result = f64::NAN;
        } else if n > result {
            result = n;
        }
    }
    Ok(JsValue::number(result))
}

/// Math.sqrt
fn math_sqrt(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(ctx, &args, f64::sqrt)
}

/// Math.cbrt
fn math_cbrt(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(ctx, &args, f64::cbrt)
}

/// Math.pow
fn math_pow(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let base = number_arg(ctx, &args, 0)?;
    let exponent = number_arg(ctx, &args, 1)?;
    Ok(JsValue::number(base.powf(exponent)))
}

/// Math.exp
fn math_exp(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(ctx, &args, f64::exp)
}

/// Math.log
fn math_log(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(ctx, &args, f64::ln)
}

/// Math.log2
fn math_log2(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(ctx, &args, f64::log2)
}

/// Math.log10
fn math_log10(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(ctx, &args, f64::log10)
}

/// Math.sin
fn math_sin(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(ctx, &args, f64::sin)
}

/// Math.cos
fn math_cos(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(ctx, &args, f64::cos)
}

/// Math.tan
fn math_tan(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(ctx, &args, f64::tan)
}

/// Math.atan2
fn math_atan2(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let y = number_arg(ctx, &args, 0)?;
    let x = number_arg(ctx, &args, 1)?;
    Ok(JsValue::number(y.atan2(x)))
}

/// Math.hypot
fn math_hypot(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let mut sum_sq = 0.0;
    let mut infinite = false;
    for a in args.iter() {
        let x = to_number(ctx, a)?;
        if x.is_infinite() {
            infinite = true;
        }
        sum_sq += x * x;
    }
    if infinite {
        return Ok(JsValue::number(f64::INFINITY));
    }
    Ok(JsValue::number(sum_sq.sqrt()))
}

/// Math.clz32 - Count leading zeros in 32-bit integer.
fn math_clz32(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let n = to_uint32(number_arg(ctx, &args, 0)?);
    Ok(JsValue::from(n.leading_zeros() as i64))
}

thread_local! {
    static RANDOM_STATE: Cell<u64> = Cell::new(random_seed());
}

fn random_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x2545_F491_4F6C_DD1D)
}

/// Math.random
///
/// A 64-bit LCG seeded from the clock; the top 53 bits of the state give a
/// value in `[0, 1)`.
fn math_random(_ctx: &mut EvalContext, _this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let state = RANDOM_STATE.with(|s| {
        let next = s
            .get()
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        s.set(next);
        next
    });
    Ok(JsValue::number((state >> 11) as f64 / (1u64 << 53) as f64))
}
