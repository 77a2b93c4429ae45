//! Expression evaluation.
//!
//! Identifier and member accesses are first turned into a [`Reference`] and
//! then read or written through [`get_value`] / [`put_value`]. Property
//! traffic always goes through the interceptable object operations, which is
//! what lets a global object with a named property handler see every global
//! read and write made by script code.

use std::rc::Rc;

use crate::parser::ast::{
    AssignmentOperator, BinaryOperator, ExpressionType, FunctionData, LiteralData, LiteralType,
    LogicalOperator, MemberExpressionType, NumberLiteralType, PropertyKeyData, UnaryOperator,
    UpdateOperator,
};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::new_script_function;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::object_property::{to_array_index, PropertyAttributes, PropertyDescriptor};
use crate::runner::ds::operations::lex_env::{
    find_binding_environment, new_declarative_environment,
};
use crate::runner::ds::operations::object::{
    check_access, delete, get, has_property, ordinary_has_instance, set,
};
use crate::runner::ds::operations::test_and_comparison::{
    less_than, loose_equality, strict_equality,
};
use crate::runner::ds::operations::type_conversion::{
    get_type, is_callable, to_boolean, to_int32, to_number, to_primitive, to_string, to_uint32,
    PreferredType, TYPE_STR_UNDEFINED,
};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

use super::function::{call_function, construct};
use super::types::{Reference, ReferenceBase, ReferenceResult, ValueResult};

/// Evaluate an expression and return its value.
pub fn evaluate_expression(expr: &ExpressionType, ctx: &mut EvalContext) -> ValueResult {
    match expr {
        ExpressionType::Literal(lit) => Ok(evaluate_literal(lit)),

        ExpressionType::Identifier(id) => {
            let reference = resolve_binding(ctx, &id.name)?;
            get_value(ctx, &reference)
        }

        ExpressionType::ThisExpression { .. } => Ok(ctx.this_value.clone()),

        ExpressionType::ArrayExpression { elements, .. } => {
            let mut values = Vec::with_capacity(elements.len());
            for element in elements {
                values.push(evaluate_expression(element, ctx)?);
            }
            Ok(JsValue::Object(ctx.new_array(values)))
        }

        ExpressionType::ObjectExpression { properties, .. } => {
            let object = ctx.new_object();
            for property in properties {
                let key = property_key_name(&property.key);
                let value = evaluate_expression(&property.value, ctx)?;
                object.borrow_mut().define_real_property(
                    &key,
                    PropertyDescriptor::new(value, PropertyAttributes::all()),
                );
            }
            Ok(JsValue::Object(object))
        }

        ExpressionType::FunctionExpression(data) => {
            Ok(JsValue::Object(evaluate_function_expression(data, ctx)?))
        }

        ExpressionType::UnaryExpression {
            operator, argument, ..
        } => evaluate_unary_expression(operator, argument, ctx),

        ExpressionType::UpdateExpression {
            operator,
            argument,
            prefix,
            ..
        } => {
            let reference = evaluate_reference(argument, ctx)?;
            let old = get_value(ctx, &reference)?;
            let old = to_number(ctx, &old)?;
            let new = match operator {
                UpdateOperator::PlusPlus => old + 1.0,
                UpdateOperator::MinusMinus => old - 1.0,
            };
            put_value(ctx, &reference, JsValue::number(new))?;
            Ok(JsValue::number(if *prefix { new } else { old }))
        }

        ExpressionType::BinaryExpression {
            operator,
            left,
            right,
            ..
        } => {
            let l = evaluate_expression(left, ctx)?;
            let r = evaluate_expression(right, ctx)?;
            apply_binary_operator(operator, &l, &r, ctx)
        }

        ExpressionType::AssignmentExpression {
            operator,
            left,
            right,
            ..
        } => evaluate_assignment_expression(operator, left, right, ctx),

        ExpressionType::LogicalExpression {
            operator,
            left,
            right,
            ..
        } => {
            let l = evaluate_expression(left, ctx)?;
            let short_circuit = match operator {
                LogicalOperator::And => !to_boolean(&l),
                LogicalOperator::Or => to_boolean(&l),
            };
            if short_circuit {
                Ok(l)
            } else {
                evaluate_expression(right, ctx)
            }
        }

        ExpressionType::ConditionalExpression {
            test,
            consequent,
            alternate,
            ..
        } => {
            let t = evaluate_expression(test, ctx)?;
            if to_boolean(&t) {
                evaluate_expression(consequent, ctx)
            } else {
                evaluate_expression(alternate, ctx)
            }
        }

        ExpressionType::CallExpression {
            callee, arguments, ..
        } => evaluate_call_expression(callee, arguments, ctx),

        ExpressionType::NewExpression {
            callee, arguments, ..
        } => {
            let f = evaluate_expression(callee, ctx)?;
            let args = evaluate_arguments(arguments, ctx)?;
            match &f {
                JsValue::Object(o) if is_constructor(o) => construct(ctx, o, args),
                _ => Err(JErrorType::TypeError(format!(
                    "{} is not a constructor",
                    describe(callee)
                ))),
            }
        }

        ExpressionType::MemberExpression(member) => {
            let reference = evaluate_member_reference(member, ctx)?;
            get_value(ctx, &reference)
        }

        ExpressionType::SequenceExpression { expressions, .. } => {
            let mut value = JsValue::Undefined;
            for e in expressions {
                value = evaluate_expression(e, ctx)?;
            }
            Ok(value)
        }
    }
}

/// Evaluate a literal and return its value.
fn evaluate_literal(lit: &LiteralData) -> JsValue {
    match &lit.value {
        LiteralType::NullLiteral => JsValue::Null,
        LiteralType::BooleanLiteral(b) => JsValue::Boolean(*b),
        LiteralType::StringLiteral(s) => JsValue::String(s.clone()),
        LiteralType::NumberLiteral(NumberLiteralType::IntegerLiteral(i)) => JsValue::from(*i),
        LiteralType::NumberLiteral(NumberLiteralType::FloatLiteral(f)) => JsValue::number(*f),
    }
}

fn property_key_name(key: &PropertyKeyData) -> String {
    match key {
        PropertyKeyData::Identifier(id) => id.name.clone(),
        PropertyKeyData::Literal(lit) => match &lit.value {
            LiteralType::StringLiteral(s) => s.clone(),
            LiteralType::NumberLiteral(NumberLiteralType::IntegerLiteral(i)) => i.to_string(),
            _ => evaluate_literal(lit).to_string(),
        },
    }
}

/// Creates the closure for a function or arrow expression. A named function
/// expression gets its own scope holding a read-only binding of its name.
pub fn evaluate_function_expression(
    data: &Rc<FunctionData>,
    ctx: &mut EvalContext,
) -> Result<JsObjectType, JErrorType> {
    let lexical_this = if data.is_arrow {
        Some(ctx.this_value.clone())
    } else {
        None
    };
    match &data.id {
        Some(id) if !data.is_arrow => {
            let env = new_declarative_environment(Some(ctx.lex_env.clone()));
            let f = new_script_function(&ctx.realm, data.clone(), env.clone(), lexical_this);
            {
                let mut e = env.borrow_mut();
                let record = e.inner.as_env_record_mut();
                record.create_immutable_binding(id.name.clone())?;
                record.initialize_binding(&id.name, JsValue::Object(f.clone()))?;
            }
            Ok(f)
        }
        _ => Ok(new_script_function(
            &ctx.realm,
            data.clone(),
            ctx.lex_env.clone(),
            lexical_this,
        )),
    }
}

/// Resolve an identifier against the running lexical environment.
pub fn resolve_binding(ctx: &mut EvalContext, name: &str) -> ReferenceResult {
    Ok(match find_binding_environment(&ctx.lex_env, name)? {
        Some(env) => Reference::environment(env, name),
        None => Reference::unresolvable(name),
    })
}

/// Turn an assignment target or update operand into a reference.
pub fn evaluate_reference(expr: &ExpressionType, ctx: &mut EvalContext) -> ReferenceResult {
    match expr {
        ExpressionType::Identifier(id) => resolve_binding(ctx, &id.name),
        ExpressionType::MemberExpression(member) => evaluate_member_reference(member, ctx),
        _ => Err(JErrorType::SyntaxError(
            "Invalid left-hand side in assignment".to_string(),
        )),
    }
}

fn evaluate_member_reference(
    member: &MemberExpressionType,
    ctx: &mut EvalContext,
) -> ReferenceResult {
    match member {
        MemberExpressionType::SimpleMemberExpression {
            object, property, ..
        } => {
            let base = evaluate_expression(object, ctx)?;
            Ok(Reference::property(base, property.name.clone()))
        }
        MemberExpressionType::ComputedMemberExpression {
            object, property, ..
        } => {
            let base = evaluate_expression(object, ctx)?;
            let key = evaluate_expression(property, ctx)?;
            let key = to_string(ctx, &key)?;
            Ok(Reference::property(base, key))
        }
    }
}

/// `GetValue`: read through a reference.
pub fn get_value(ctx: &mut EvalContext, reference: &Reference) -> ValueResult {
    let name = &reference.referenced_name;
    match &reference.base {
        ReferenceBase::Object(o) => {
            check_access(ctx.realm.id(), o)?;
            get(o, name)
        }
        ReferenceBase::Primitive(v) => get_primitive_property(ctx, v, name),
        ReferenceBase::Environment(env) => env.borrow().inner.as_env_record().get_binding_value(name),
        ReferenceBase::Unresolvable => Err(JErrorType::ReferenceError(format!(
            "{} is not defined",
            name
        ))),
    }
}

/// `PutValue`: write through a reference. Unresolvable names become
/// properties of the running realm's global object.
pub fn put_value(ctx: &mut EvalContext, reference: &Reference, value: JsValue) -> Result<(), JErrorType> {
    let name = &reference.referenced_name;
    match &reference.base {
        ReferenceBase::Object(o) => {
            check_access(ctx.realm.id(), o)?;
            set(o, name, value).map(|_| ())
        }
        ReferenceBase::Primitive(v) => {
            if v.is_nullish() {
                Err(JErrorType::TypeError(format!(
                    "Cannot set properties of {} (setting '{}')",
                    v, name
                )))
            } else {
                Ok(())
            }
        }
        ReferenceBase::Environment(env) => env
            .borrow_mut()
            .inner
            .as_env_record_mut()
            .set_mutable_binding(name, value),
        ReferenceBase::Unresolvable => {
            let global = ctx.realm.global_object();
            set(&global, name, value).map(|_| ())
        }
    }
}

fn get_primitive_property(ctx: &mut EvalContext, v: &JsValue, name: &str) -> ValueResult {
    let prototype_name = match v {
        JsValue::String(s) => {
            if name == "length" {
                return Ok(JsValue::from(s.encode_utf16().count() as i64));
            }
            if let Some(index) = to_array_index(name) {
                return Ok(s
                    .encode_utf16()
                    .nth(index as usize)
                    .map(|unit| JsValue::String(String::from_utf16_lossy(&[unit])))
                    .unwrap_or(JsValue::Undefined));
            }
            "String"
        }
        JsValue::Number(_) => "Number",
        JsValue::Boolean(_) => "Boolean",
        _ => {
            return Err(JErrorType::TypeError(format!(
                "Cannot read properties of {} (reading '{}')",
                v, name
            )))
        }
    };
    let prototype = ctx.realm.intrinsics().prototype_or_object(prototype_name);
    get(&prototype, name)
}

fn is_constructor(o: &JsObjectType) -> bool {
    o.borrow()
        .as_function()
        .map(|f| f.is_constructor())
        .unwrap_or(false)
}

fn evaluate_arguments(arguments: &[ExpressionType], ctx: &mut EvalContext) -> Result<Vec<JsValue>, JErrorType> {
    let mut args = Vec::with_capacity(arguments.len());
    for a in arguments {
        args.push(evaluate_expression(a, ctx)?);
    }
    Ok(args)
}

fn evaluate_call_expression(
    callee: &ExpressionType,
    arguments: &[ExpressionType],
    ctx: &mut EvalContext,
) -> ValueResult {
    let (f, this_value) = match callee {
        ExpressionType::MemberExpression(member) => {
            let reference = evaluate_member_reference(member, ctx)?;
            let f = get_value(ctx, &reference)?;
            (f, reference.get_this_value())
        }
        _ => (evaluate_expression(callee, ctx)?, JsValue::Undefined),
    };
    let args = evaluate_arguments(arguments, ctx)?;
    if !is_callable(&f) {
        return Err(JErrorType::TypeError(format!(
            "{} is not a function",
            describe(callee)
        )));
    }
    call_function(ctx, &f, this_value, args)
}

/// Short source-like rendering of an expression for error messages.
fn describe(expr: &ExpressionType) -> String {
    match expr {
        ExpressionType::Identifier(id) => id.name.clone(),
        ExpressionType::ThisExpression { .. } => "this".to_string(),
        ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
            object,
            property,
            ..
        }) => format!("{}.{}", describe(object), property.name),
        ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
            object,
            ..
        }) => format!("{}[...]", describe(object)),
        ExpressionType::CallExpression { callee, .. } => format!("{}(...)", describe(callee)),
        ExpressionType::Literal(lit) => evaluate_literal(lit).to_string(),
        _ => "expression".to_string(),
    }
}

fn evaluate_unary_expression(
    operator: &UnaryOperator,
    argument: &ExpressionType,
    ctx: &mut EvalContext,
) -> ValueResult {
    match operator {
        UnaryOperator::Delete => evaluate_delete(argument, ctx),
        UnaryOperator::TypeOf => {
            if let ExpressionType::Identifier(id) = argument {
                let reference = resolve_binding(ctx, &id.name)?;
                if reference.is_unresolvable() {
                    return Ok(JsValue::from(TYPE_STR_UNDEFINED));
                }
                let v = get_value(ctx, &reference)?;
                return Ok(JsValue::from(get_type(&v)));
            }
            let v = evaluate_expression(argument, ctx)?;
            Ok(JsValue::from(get_type(&v)))
        }
        UnaryOperator::Void => {
            evaluate_expression(argument, ctx)?;
            Ok(JsValue::Undefined)
        }
        UnaryOperator::LogicalNot => {
            let v = evaluate_expression(argument, ctx)?;
            Ok(JsValue::Boolean(!to_boolean(&v)))
        }
        UnaryOperator::Minus => {
            let v = evaluate_expression(argument, ctx)?;
            Ok(JsValue::number(-to_number(ctx, &v)?))
        }
        UnaryOperator::Plus => {
            let v = evaluate_expression(argument, ctx)?;
            Ok(JsValue::number(to_number(ctx, &v)?))
        }
        UnaryOperator::BitwiseNot => {
            let v = evaluate_expression(argument, ctx)?;
            let n = to_number(ctx, &v)?;
            Ok(JsValue::from(!to_int32(n) as i64))
        }
    }
}

fn evaluate_delete(argument: &ExpressionType, ctx: &mut EvalContext) -> ValueResult {
    let reference = match argument {
        ExpressionType::Identifier(_) | ExpressionType::MemberExpression(_) => {
            evaluate_reference(argument, ctx)?
        }
        _ => {
            evaluate_expression(argument, ctx)?;
            return Ok(JsValue::Boolean(true));
        }
    };
    let name = &reference.referenced_name;
    let deleted = match &reference.base {
        ReferenceBase::Object(o) => {
            check_access(ctx.realm.id(), o)?;
            delete(o, name)?
        }
        ReferenceBase::Primitive(v) => {
            if v.is_nullish() {
                return Err(JErrorType::TypeError(
                    "Cannot convert undefined or null to object".to_string(),
                ));
            }
            true
        }
        ReferenceBase::Environment(env) => env
            .borrow_mut()
            .inner
            .as_env_record_mut()
            .delete_binding(name)?,
        ReferenceBase::Unresolvable => true,
    };
    Ok(JsValue::Boolean(deleted))
}

fn evaluate_assignment_expression(
    operator: &AssignmentOperator,
    left: &ExpressionType,
    right: &ExpressionType,
    ctx: &mut EvalContext,
) -> ValueResult {
    let reference = evaluate_reference(left, ctx)?;
    let value = match operator.binary_operator() {
        None => evaluate_expression(right, ctx)?,
        Some(op) => {
            let old = get_value(ctx, &reference)?;
            let r = evaluate_expression(right, ctx)?;
            apply_binary_operator(&op, &old, &r, ctx)?
        }
    };
    put_value(ctx, &reference, value.clone())?;
    Ok(value)
}

/// Apply a binary operator to two already evaluated operands.
pub fn apply_binary_operator(
    operator: &BinaryOperator,
    l: &JsValue,
    r: &JsValue,
    ctx: &mut EvalContext,
) -> ValueResult {
    Ok(match operator {
        BinaryOperator::Add => {
            let lp = to_primitive(ctx, l, PreferredType::Default)?;
            let rp = to_primitive(ctx, r, PreferredType::Default)?;
            if matches!(lp, JsValue::String(_)) || matches!(rp, JsValue::String(_)) {
                let mut s = to_string(ctx, &lp)?;
                s.push_str(&to_string(ctx, &rp)?);
                JsValue::String(s)
            } else {
                JsValue::number(to_number(ctx, &lp)? + to_number(ctx, &rp)?)
            }
        }
        BinaryOperator::Subtract => JsValue::number(to_number(ctx, l)? - to_number(ctx, r)?),
        BinaryOperator::Multiply => JsValue::number(to_number(ctx, l)? * to_number(ctx, r)?),
        BinaryOperator::Divide => JsValue::number(to_number(ctx, l)? / to_number(ctx, r)?),
        BinaryOperator::Modulo => JsValue::number(to_number(ctx, l)? % to_number(ctx, r)?),
        BinaryOperator::BitwiseAnd => {
            JsValue::from((to_int32(to_number(ctx, l)?) & to_int32(to_number(ctx, r)?)) as i64)
        }
        BinaryOperator::BitwiseOr => {
            JsValue::from((to_int32(to_number(ctx, l)?) | to_int32(to_number(ctx, r)?)) as i64)
        }
        BinaryOperator::BitwiseXor => {
            JsValue::from((to_int32(to_number(ctx, l)?) ^ to_int32(to_number(ctx, r)?)) as i64)
        }
        BinaryOperator::BitwiseLeftShift => {
            let shift = to_uint32(to_number(ctx, r)?) & 31;
            JsValue::from(to_int32(to_number(ctx, l)?).wrapping_shl(shift) as i64)
        }
        BinaryOperator::BitwiseRightShift => {
            let shift = to_uint32(to_number(ctx, r)?) & 31;
            JsValue::from((to_int32(to_number(ctx, l)?) >> shift) as i64)
        }
        BinaryOperator::BitwiseUnsignedRightShift => {
            let shift = to_uint32(to_number(ctx, r)?) & 31;
            JsValue::from((to_uint32(to_number(ctx, l)?) >> shift) as i64)
        }
        BinaryOperator::StrictlyEqual => JsValue::Boolean(strict_equality(l, r)),
        BinaryOperator::StrictlyUnequal => JsValue::Boolean(!strict_equality(l, r)),
        BinaryOperator::LooselyEqual => JsValue::Boolean(loose_equality(ctx, l, r)?),
        BinaryOperator::LooselyUnequal => JsValue::Boolean(!loose_equality(ctx, l, r)?),
        BinaryOperator::LessThan => JsValue::Boolean(less_than(ctx, l, r)? == Some(true)),
        BinaryOperator::GreaterThan => JsValue::Boolean(less_than(ctx, r, l)? == Some(true)),
        BinaryOperator::LessThanEqual => JsValue::Boolean(less_than(ctx, r, l)? == Some(false)),
        BinaryOperator::GreaterThanEqual => {
            JsValue::Boolean(less_than(ctx, l, r)? == Some(false))
        }
        BinaryOperator::In => {
            let key = to_string(ctx, l)?;
            match r {
                JsValue::Object(o) => {
                    check_access(ctx.realm.id(), o)?;
                    JsValue::Boolean(has_property(o, &key)?)
                }
                _ => {
                    return Err(JErrorType::TypeError(format!(
                        "Cannot use 'in' operator to search for '{}' in {}",
                        key, r
                    )))
                }
            }
        }
        BinaryOperator::InstanceOf => {
            let f = match r {
                JsValue::Object(o) if o.borrow().is_callable() => o.clone(),
                _ => {
                    return Err(JErrorType::TypeError(
                        "Right-hand side of 'instanceof' is not callable".to_string(),
                    ))
                }
            };
            match l {
                JsValue::Object(o) => match get(&f, "prototype")? {
                    JsValue::Object(prototype) => {
                        JsValue::Boolean(ordinary_has_instance(&prototype, o))
                    }
                    _ => {
                        return Err(JErrorType::TypeError(
                            "Function has non-object prototype in instanceof check"
                                .to_string(),
                        ))
                    }
                },
                _ => JsValue::Boolean(false),
            }
        }
    })
}
