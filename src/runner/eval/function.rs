//! Function call execution.
//!
//! Calls switch the context to the realm the callee was created in, so a
//! function that crosses into another context keeps building its objects
//! from, and resolving unqualified writes against, its home realm.

use std::rc::Rc;

use crate::parser::ast::{FunctionBodyData, FunctionData};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::FunctionKind;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::{new_object, JsObjectType, ObjectKind};
use crate::runner::ds::object_property::{PropertyAttributes, PropertyDescriptor};
use crate::runner::ds::operations::lex_env::new_declarative_environment;
use crate::runner::ds::operations::object::get;
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::{EvalContext, NativeFn};

use super::expression::evaluate_expression;
use super::statement::{execute_statements, hoist_declarations};
use super::types::{CompletionType, ValueResult};

/// Call a function with the given `this` value and arguments.
pub fn call_function(
    ctx: &mut EvalContext,
    f: &JsValue,
    this_value: JsValue,
    args: Vec<JsValue>,
) -> ValueResult {
    match f {
        JsValue::Object(o) if o.borrow().is_callable() => invoke(ctx, o, this_value, args, None),
        _ => Err(JErrorType::TypeError(format!("{} is not a function", f))),
    }
}

/// `new f(...args)`.
pub fn construct(ctx: &mut EvalContext, f: &JsObjectType, args: Vec<JsValue>) -> ValueResult {
    let prototype = match get(f, "prototype")? {
        JsValue::Object(p) => p,
        _ => ctx.realm.intrinsics().object_prototype(),
    };
    let this_object = new_object("Object", Some(prototype), ObjectKind::Ordinary);
    let result = invoke(
        ctx,
        f,
        JsValue::Object(this_object.clone()),
        args,
        Some(f.clone()),
    )?;
    Ok(match result {
        JsValue::Object(_) => result,
        _ => JsValue::Object(this_object),
    })
}

enum Callee {
    Script {
        data: Rc<FunctionData>,
        environment: JsLexEnvironmentType,
        lexical_this: Option<JsValue>,
    },
    Native(NativeFn),
}

fn invoke(
    ctx: &mut EvalContext,
    f: &JsObjectType,
    this_value: JsValue,
    args: Vec<JsValue>,
    new_target: Option<JsObjectType>,
) -> ValueResult {
    let isolate = ctx.isolate.clone();
    let _depth = isolate.enter_call()?;

    let (callee, realm) = {
        let borrowed = f.borrow();
        let kind = borrowed.as_function().ok_or_else(|| {
            JErrorType::TypeError("object is not a function".to_string())
        })?;
        let callee = match kind {
            FunctionKind::Script(sf) => Callee::Script {
                data: sf.data.clone(),
                environment: sf.environment.clone(),
                lexical_this: sf.lexical_this.clone(),
            },
            FunctionKind::Native(nf) => Callee::Native(nf.func),
        };
        (callee, kind.realm().unwrap_or_else(|| ctx.realm.clone()))
    };

    match callee {
        Callee::Native(func) => {
            let mut native_ctx = EvalContext {
                isolate: ctx.isolate.clone(),
                lex_env: ctx.lex_env.clone(),
                var_env: ctx.var_env.clone(),
                realm,
                this_value: this_value.clone(),
                new_target,
                callee: Some(f.clone()),
                script_name: ctx.script_name.clone(),
            };
            func(&mut native_ctx, this_value, args)
        }
        Callee::Script {
            data,
            environment,
            lexical_this,
        } => {
            let this_value = match lexical_this {
                Some(captured) => captured,
                None if this_value.is_nullish() => JsValue::Object(realm.global_object()),
                None => this_value,
            };
            let env = new_declarative_environment(Some(environment));
            {
                let mut e = env.borrow_mut();
                let record = e.inner.as_env_record_mut();
                for (i, param) in data.params.iter().enumerate() {
                    if !record.has_binding(&param.name)? {
                        record.create_mutable_binding(param.name.clone(), false)?;
                    }
                    record.initialize_binding(
                        &param.name,
                        args.get(i).cloned().unwrap_or(JsValue::Undefined),
                    )?;
                }
            }
            let mut fctx = EvalContext {
                isolate: ctx.isolate.clone(),
                realm,
                lex_env: env.clone(),
                var_env: env.clone(),
                this_value,
                new_target,
                callee: Some(f.clone()),
                script_name: ctx.script_name.clone(),
            };
            if !data.is_arrow && !data.params.iter().any(|p| p.name == "arguments") {
                let arguments = fctx.new_array(args);
                arguments.borrow_mut().base.set_class_name("Arguments");
                let mut e = env.borrow_mut();
                let record = e.inner.as_env_record_mut();
                record.create_mutable_binding("arguments".to_string(), false)?;
                record.initialize_binding("arguments", JsValue::Object(arguments))?;
            }
            match &data.body {
                FunctionBodyData::Expression(expr) => evaluate_expression(expr, &mut fctx),
                FunctionBodyData::Statements(statements) => {
                    hoist_declarations(statements, &mut fctx, false)?;
                    let completion = execute_statements(statements, &mut fctx)?;
                    Ok(match completion.completion_type {
                        CompletionType::Return => completion.get_value(),
                        _ => JsValue::Undefined,
                    })
                }
            }
        }
    }
}

/// Builds an Error object of `realm` the way the `Error` constructors do.
pub fn new_error(realm: &Rc<Realm>, name: &str, message: &str, stack: String) -> JsObjectType {
    let prototype = realm
        .intrinsics()
        .prototype(name)
        .unwrap_or_else(|| realm.intrinsics().prototype_or_object("Error"));
    let error = new_object("Error", Some(prototype), ObjectKind::Error);
    {
        let mut e = error.borrow_mut();
        e.define_real_property(
            "message",
            PropertyDescriptor::new(JsValue::from(message), PropertyAttributes::hidden()),
        );
        e.define_real_property(
            "stack",
            PropertyDescriptor::new(JsValue::String(stack), PropertyAttributes::hidden()),
        );
    }
    error
}

/// The value script code observes for an error: thrown values pass through
/// unchanged, engine errors become Error objects of the running realm.
pub fn error_to_value(ctx: &EvalContext, error: JErrorType) -> JsValue {
    match error {
        JErrorType::Thrown(v) => v,
        other => {
            let name = other.name();
            let message = other.message();
            let stack = format!("{}: {}\n    at {}", name, message, ctx.script_name);
            JsValue::Object(new_error(&ctx.realm, name, &message, stack))
        }
    }
}
