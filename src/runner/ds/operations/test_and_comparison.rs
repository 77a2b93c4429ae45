use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::{to_number, to_primitive, PreferredType};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

/// `===`
pub fn strict_equality(a: &JsValue, b: &JsValue) -> bool {
    a == b
}

/// `==`
pub fn loose_equality(ctx: &mut EvalContext, a: &JsValue, b: &JsValue) -> Result<bool, JErrorType> {
    Ok(match (a, b) {
        (JsValue::Undefined, _)
        | (JsValue::Null, _)
        | (_, JsValue::Undefined)
        | (_, JsValue::Null) => a.is_nullish() && b.is_nullish(),
        (JsValue::Object(_), JsValue::Object(_))
        | (JsValue::String(_), JsValue::String(_))
        | (JsValue::Number(_), JsValue::Number(_))
        | (JsValue::Boolean(_), JsValue::Boolean(_)) => a == b,
        (JsValue::Object(_), _) => {
            let pa = to_primitive(ctx, a, PreferredType::Default)?;
            return loose_equality(ctx, &pa, b);
        }
        (_, JsValue::Object(_)) => {
            let pb = to_primitive(ctx, b, PreferredType::Default)?;
            return loose_equality(ctx, a, &pb);
        }
        _ => to_number(ctx, a)? == to_number(ctx, b)?,
    })
}

/// Abstract relational comparison `a < b`; `None` when either side is NaN.
pub fn less_than(ctx: &mut EvalContext, a: &JsValue, b: &JsValue) -> Result<Option<bool>, JErrorType> {
    let pa = to_primitive(ctx, a, PreferredType::Number)?;
    let pb = to_primitive(ctx, b, PreferredType::Number)?;
    if let (JsValue::String(sa), JsValue::String(sb)) = (&pa, &pb) {
        return Ok(Some(sa < sb));
    }
    let na = to_number(ctx, &pa)?;
    let nb = to_number(ctx, &pb)?;
    if na.is_nan() || nb.is_nan() {
        Ok(None)
    } else {
        Ok(Some(na < nb))
    }
}
