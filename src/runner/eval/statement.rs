//! Statement execution.
//!
//! Declarations are instantiated before a body runs: `var` names and function
//! declarations are hoisted into the variable environment, `let`/`const`
//! names are created uninitialized in the lexical environment of the body
//! that declares them.

use std::rc::Rc;

use crate::parser::ast::{
    BlockStatementData, CatchClauseData, DeclarationType, ExpressionType, ForInBinding,
    ForInData, FunctionData, ProgramData, StatementType, VariableDeclarationData,
    VariableDeclarationKind, VariableDeclarationOrExpression,
};
use crate::runner::ds::env_record::{EnvironmentRecord, EnvironmentRecordType};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::new_script_function;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::operations::lex_env::new_declarative_environment;
use crate::runner::ds::operations::object::{check_access, for_in_keys, has_own_property, has_property, set};
use crate::runner::ds::operations::type_conversion::to_boolean;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

use super::expression::{evaluate_expression, evaluate_reference, put_value, resolve_binding};
use super::function::error_to_value;
use super::types::{Completion, CompletionType, EvalResult, ValueResult};

/// Run a whole script in the global scope of `ctx` and return its
/// completion value.
pub fn execute_program(program: &ProgramData, ctx: &mut EvalContext) -> ValueResult {
    hoist_declarations(&program.body, ctx, true)?;
    let completion = execute_statements(&program.body, ctx)?;
    Ok(completion.get_value())
}

/// Execute a statement and return its completion.
pub fn execute_statement(stmt: &StatementType, ctx: &mut EvalContext) -> EvalResult {
    match stmt {
        StatementType::EmptyStatement { .. } => Ok(Completion::normal()),

        StatementType::ExpressionStatement { expression, .. } => {
            let value = evaluate_expression(expression, ctx)?;
            Ok(Completion::normal_with_value(value))
        }

        StatementType::BlockStatement(block) => execute_block_statement(block, ctx),

        StatementType::DeclarationStatement(DeclarationType::FunctionDeclaration(_)) => {
            Ok(Completion::normal())
        }

        StatementType::DeclarationStatement(DeclarationType::VariableDeclaration(decl)) => {
            execute_variable_declaration(decl, ctx)?;
            Ok(Completion::normal())
        }

        StatementType::IfStatement {
            test,
            consequent,
            alternate,
            ..
        } => {
            let t = evaluate_expression(test, ctx)?;
            let completion = if to_boolean(&t) {
                execute_statement(consequent, ctx)?
            } else if let Some(alternate) = alternate {
                execute_statement(alternate, ctx)?
            } else {
                Completion::normal()
            };
            Ok(completion.update_empty(Some(JsValue::Undefined)))
        }

        StatementType::WhileStatement { test, body, .. } => {
            let mut last = None;
            loop {
                let t = evaluate_expression(test, ctx)?;
                if !to_boolean(&t) {
                    break;
                }
                match run_loop_body(body, ctx, &mut last)? {
                    Flow::Next => {}
                    Flow::Exit => break,
                    Flow::Return(c) => return Ok(c),
                }
            }
            Ok(loop_completion(last))
        }

        StatementType::DoWhileStatement { test, body, .. } => {
            let mut last = None;
            loop {
                match run_loop_body(body, ctx, &mut last)? {
                    Flow::Next => {}
                    Flow::Exit => break,
                    Flow::Return(c) => return Ok(c),
                }
                let t = evaluate_expression(test, ctx)?;
                if !to_boolean(&t) {
                    break;
                }
            }
            Ok(loop_completion(last))
        }

        StatementType::ForStatement {
            init,
            test,
            update,
            body,
            ..
        } => {
            let saved = ctx.lex_env.clone();
            let result = execute_for_statement(
                init.as_ref(),
                test.as_deref(),
                update.as_deref(),
                body,
                ctx,
            );
            ctx.lex_env = saved;
            result
        }

        StatementType::ForInStatement(data) => execute_for_in_statement(data, ctx),

        StatementType::ReturnStatement { argument, .. } => {
            let value = match argument {
                Some(arg) => evaluate_expression(arg, ctx)?,
                None => JsValue::Undefined,
            };
            Ok(Completion::return_value(value))
        }

        StatementType::BreakStatement { .. } => Ok(Completion::break_completion()),

        StatementType::ContinueStatement { .. } => Ok(Completion::continue_completion()),

        StatementType::ThrowStatement { argument, .. } => {
            let value = evaluate_expression(argument, ctx)?;
            Err(JErrorType::Thrown(value))
        }

        StatementType::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => execute_try_statement(block, handler.as_ref(), finalizer.as_ref(), ctx),
    }
}

/// Execute a statement list, tracking the last produced value.
pub fn execute_statements(statements: &[StatementType], ctx: &mut EvalContext) -> EvalResult {
    let mut last = None;
    for stmt in statements {
        let completion = execute_statement(stmt, ctx)?;
        if completion.value.is_some() {
            last = completion.value.clone();
        }
        if completion.is_abrupt() {
            return Ok(completion.update_empty(last));
        }
    }
    Ok(Completion {
        completion_type: CompletionType::Normal,
        value: last,
    })
}

/// Execute a block statement in a fresh lexical scope when it declares
/// anything block-scoped.
fn execute_block_statement(block: &BlockStatementData, ctx: &mut EvalContext) -> EvalResult {
    if !has_lexical_declarations(&block.body) {
        return execute_statements(&block.body, ctx);
    }
    let env = new_declarative_environment(Some(ctx.lex_env.clone()));
    let saved = std::mem::replace(&mut ctx.lex_env, env);
    let result = instantiate_block_declarations(&block.body, ctx)
        .and_then(|_| execute_statements(&block.body, ctx));
    ctx.lex_env = saved;
    result
}

fn execute_variable_declaration(
    decl: &VariableDeclarationData,
    ctx: &mut EvalContext,
) -> Result<(), JErrorType> {
    for declarator in &decl.declarations {
        let name = &declarator.id.name;
        match decl.kind {
            VariableDeclarationKind::Var => {
                if let Some(init) = &declarator.init {
                    let reference = resolve_binding(ctx, name)?;
                    let value = evaluate_expression(init, ctx)?;
                    put_value(ctx, &reference, value)?;
                }
            }
            VariableDeclarationKind::Let | VariableDeclarationKind::Const => {
                let value = match &declarator.init {
                    Some(init) => evaluate_expression(init, ctx)?,
                    None => JsValue::Undefined,
                };
                ctx.lex_env
                    .borrow_mut()
                    .inner
                    .as_env_record_mut()
                    .initialize_binding(name, value)?;
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Declaration instantiation
// ---------------------------------------------------------------------------

fn already_declared(name: &str) -> JErrorType {
    JErrorType::SyntaxError(format!("Identifier '{}' has already been declared", name))
}

fn collect_var_names(statements: &[StatementType], names: &mut Vec<String>) {
    for stmt in statements {
        collect_var_names_in(stmt, names);
    }
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}

fn collect_var_names_in(stmt: &StatementType, names: &mut Vec<String>) {
    match stmt {
        StatementType::DeclarationStatement(DeclarationType::VariableDeclaration(decl))
            if decl.kind == VariableDeclarationKind::Var =>
        {
            for d in &decl.declarations {
                push_unique(names, &d.id.name);
            }
        }
        StatementType::BlockStatement(block) => collect_var_names(&block.body, names),
        StatementType::IfStatement {
            consequent,
            alternate,
            ..
        } => {
            collect_var_names_in(consequent, names);
            if let Some(alternate) = alternate {
                collect_var_names_in(alternate, names);
            }
        }
        StatementType::WhileStatement { body, .. } | StatementType::DoWhileStatement { body, .. } => {
            collect_var_names_in(body, names)
        }
        StatementType::ForStatement { init, body, .. } => {
            if let Some(VariableDeclarationOrExpression::VariableDeclaration(decl)) = init {
                if decl.kind == VariableDeclarationKind::Var {
                    for d in &decl.declarations {
                        push_unique(names, &d.id.name);
                    }
                }
            }
            collect_var_names_in(body, names);
        }
        StatementType::ForInStatement(data) => {
            if let ForInBinding::Declaration {
                kind: VariableDeclarationKind::Var,
                id,
            } = &data.left
            {
                push_unique(names, &id.name);
            }
            collect_var_names_in(&data.body, names);
        }
        StatementType::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => {
            collect_var_names(&block.body, names);
            if let Some(handler) = handler {
                collect_var_names(&handler.body.body, names);
            }
            if let Some(finalizer) = finalizer {
                collect_var_names(&finalizer.body, names);
            }
        }
        _ => {}
    }
}

/// `let`/`const` names declared directly in a statement list, with whether
/// each one is a constant.
fn lexical_names(statements: &[StatementType]) -> Vec<(String, bool)> {
    let mut names = vec![];
    for stmt in statements {
        if let StatementType::DeclarationStatement(DeclarationType::VariableDeclaration(decl)) = stmt {
            if decl.kind != VariableDeclarationKind::Var {
                for d in &decl.declarations {
                    names.push((d.id.name.clone(), decl.kind == VariableDeclarationKind::Const));
                }
            }
        }
    }
    names
}

fn function_declarations(statements: &[StatementType]) -> Vec<Rc<FunctionData>> {
    statements
        .iter()
        .filter_map(|stmt| match stmt {
            StatementType::DeclarationStatement(DeclarationType::FunctionDeclaration(f)) => {
                Some(f.clone())
            }
            _ => None,
        })
        .collect()
}

fn has_lexical_declarations(statements: &[StatementType]) -> bool {
    !lexical_names(statements).is_empty() || !function_declarations(statements).is_empty()
}

fn global_has_lexical_declaration(env: &JsLexEnvironmentType, name: &str) -> bool {
    match env.borrow().inner.as_ref() {
        EnvironmentRecordType::Global(record) => record.has_lexical_declaration(name),
        _ => false,
    }
}

fn create_lexical_bindings(
    env: &JsLexEnvironmentType,
    names: &[(String, bool)],
) -> Result<(), JErrorType> {
    let mut e = env.borrow_mut();
    let record = e.inner.as_env_record_mut();
    for (name, is_const) in names {
        if record.has_binding(name)? {
            return Err(already_declared(name));
        }
        if *is_const {
            record.create_immutable_binding(name.clone())?;
        } else {
            record.create_mutable_binding(name.clone(), false)?;
        }
    }
    Ok(())
}

/// Instantiate the declarations of a script or function body.
pub fn hoist_declarations(
    statements: &[StatementType],
    ctx: &mut EvalContext,
    is_global: bool,
) -> Result<(), JErrorType> {
    let mut var_names = vec![];
    collect_var_names(statements, &mut var_names);
    let functions = function_declarations(statements);
    let lexical = lexical_names(statements);

    for (name, _) in &lexical {
        if var_names.contains(name) || functions.iter().any(|f| f.name() == name) {
            return Err(already_declared(name));
        }
    }

    if is_global {
        let env = ctx.var_env.clone();
        for name in var_names.iter().map(String::as_str).chain(functions.iter().map(|f| f.name())) {
            if global_has_lexical_declaration(&env, name) {
                return Err(already_declared(name));
            }
        }
        for (name, _) in &lexical {
            if global_has_lexical_declaration(&env, name) {
                return Err(already_declared(name));
            }
        }
        {
            let mut e = env.borrow_mut();
            if let EnvironmentRecordType::Global(record) = e.inner.as_mut() {
                for (name, is_const) in &lexical {
                    if *is_const {
                        record.declarative_record.create_immutable_binding(name.clone())?;
                    } else {
                        record.declarative_record.create_mutable_binding(name.clone(), false)?;
                    }
                }
            }
        }
        let global = ctx.realm.global_object();
        for name in &var_names {
            if !has_own_property(&global, name)? {
                set(&global, name, JsValue::Undefined)?;
            }
        }
        for f in functions {
            let closure = new_script_function(&ctx.realm, f.clone(), ctx.lex_env.clone(), None);
            set(&global, f.name(), JsValue::Object(closure))?;
        }
    } else {
        let env = ctx.var_env.clone();
        {
            let mut e = env.borrow_mut();
            let record = e.inner.as_env_record_mut();
            for name in &var_names {
                if !record.has_binding(name)? {
                    record.create_mutable_binding(name.clone(), false)?;
                    record.initialize_binding(name, JsValue::Undefined)?;
                }
            }
        }
        create_lexical_bindings(&env, &lexical)?;
        for f in functions {
            let closure = new_script_function(&ctx.realm, f.clone(), ctx.lex_env.clone(), None);
            let mut e = env.borrow_mut();
            let record = e.inner.as_env_record_mut();
            if !record.has_binding(f.name())? {
                record.create_mutable_binding(f.name().to_string(), false)?;
            }
            record.initialize_binding(f.name(), JsValue::Object(closure))?;
        }
    }
    Ok(())
}

fn instantiate_block_declarations(
    statements: &[StatementType],
    ctx: &mut EvalContext,
) -> Result<(), JErrorType> {
    let env = ctx.lex_env.clone();
    create_lexical_bindings(&env, &lexical_names(statements))?;
    for f in function_declarations(statements) {
        let closure = new_script_function(&ctx.realm, f.clone(), env.clone(), None);
        let mut e = env.borrow_mut();
        let record = e.inner.as_env_record_mut();
        if record.has_binding(f.name())? {
            return Err(already_declared(f.name()));
        }
        record.create_mutable_binding(f.name().to_string(), false)?;
        record.initialize_binding(f.name(), JsValue::Object(closure))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Loops
// ---------------------------------------------------------------------------

/// What a loop does after one run of its body.
enum Flow {
    Next,
    Exit,
    Return(Completion),
}

fn run_loop_body(
    body: &StatementType,
    ctx: &mut EvalContext,
    last: &mut Option<JsValue>,
) -> Result<Flow, JErrorType> {
    let completion = execute_statement(body, ctx)?;
    if completion.value.is_some() {
        *last = completion.value.clone();
    }
    Ok(match completion.completion_type {
        CompletionType::Normal | CompletionType::Continue => Flow::Next,
        CompletionType::Break => Flow::Exit,
        CompletionType::Return => Flow::Return(completion),
    })
}

fn loop_completion(last: Option<JsValue>) -> Completion {
    Completion {
        completion_type: CompletionType::Normal,
        value: Some(last.unwrap_or(JsValue::Undefined)),
    }
}

fn execute_for_statement(
    init: Option<&VariableDeclarationOrExpression>,
    test: Option<&ExpressionType>,
    update: Option<&ExpressionType>,
    body: &StatementType,
    ctx: &mut EvalContext,
) -> EvalResult {
    let mut per_iteration = vec![];
    match init {
        Some(VariableDeclarationOrExpression::VariableDeclaration(decl)) => {
            if decl.kind != VariableDeclarationKind::Var {
                let names: Vec<(String, bool)> = decl
                    .declarations
                    .iter()
                    .map(|d| (d.id.name.clone(), decl.kind == VariableDeclarationKind::Const))
                    .collect();
                let env = new_declarative_environment(Some(ctx.lex_env.clone()));
                create_lexical_bindings(&env, &names)?;
                ctx.lex_env = env;
                if decl.kind == VariableDeclarationKind::Let {
                    per_iteration = names.into_iter().map(|(n, _)| n).collect();
                }
            }
            execute_variable_declaration(decl, ctx)?;
        }
        Some(VariableDeclarationOrExpression::Expression(expr)) => {
            evaluate_expression(expr, ctx)?;
        }
        None => {}
    }
    copy_iteration_environment(&per_iteration, ctx)?;

    let mut last = None;
    loop {
        if let Some(test) = test {
            let t = evaluate_expression(test, ctx)?;
            if !to_boolean(&t) {
                break;
            }
        }
        match run_loop_body(body, ctx, &mut last)? {
            Flow::Next => {}
            Flow::Exit => break,
            Flow::Return(c) => return Ok(c),
        }
        copy_iteration_environment(&per_iteration, ctx)?;
        if let Some(update) = update {
            evaluate_expression(update, ctx)?;
        }
    }
    Ok(loop_completion(last))
}

/// Gives each iteration of a `for (let ...)` loop its own copy of the loop
/// bindings, so closures created in the body capture that iteration's values.
fn copy_iteration_environment(names: &[String], ctx: &mut EvalContext) -> Result<(), JErrorType> {
    if names.is_empty() {
        return Ok(());
    }
    let (outer, values) = {
        let current = ctx.lex_env.borrow();
        let record = current.inner.as_env_record();
        let mut values = Vec::with_capacity(names.len());
        for name in names {
            values.push(record.get_binding_value(name)?);
        }
        (current.outer.clone(), values)
    };
    let env = new_declarative_environment(outer);
    {
        let mut e = env.borrow_mut();
        let record = e.inner.as_env_record_mut();
        for (name, value) in names.iter().zip(values) {
            record.create_mutable_binding(name.clone(), false)?;
            record.initialize_binding(name, value)?;
        }
    }
    ctx.lex_env = env;
    Ok(())
}

fn execute_for_in_statement(data: &ForInData, ctx: &mut EvalContext) -> EvalResult {
    let target = evaluate_expression(&data.right, ctx)?;
    let keys = match &target {
        JsValue::Object(o) => {
            check_access(ctx.realm.id(), o)?;
            for_in_keys(o)?
        }
        JsValue::String(s) => (0..s.encode_utf16().count()).map(|i| i.to_string()).collect(),
        _ => vec![],
    };

    let mut last = None;
    for key in keys {
        if let JsValue::Object(o) = &target {
            if !has_property(o, &key)? {
                continue;
            }
        }
        let saved = ctx.lex_env.clone();
        let flow = bind_for_in_variable(&data.left, key, ctx)
            .and_then(|_| run_loop_body(&data.body, ctx, &mut last));
        ctx.lex_env = saved;
        match flow? {
            Flow::Next => {}
            Flow::Exit => break,
            Flow::Return(c) => return Ok(c),
        }
    }
    Ok(loop_completion(last))
}

fn bind_for_in_variable(
    left: &ForInBinding,
    key: String,
    ctx: &mut EvalContext,
) -> Result<(), JErrorType> {
    let value = JsValue::String(key);
    match left {
        ForInBinding::Declaration {
            kind: VariableDeclarationKind::Var,
            id,
        } => {
            let reference = resolve_binding(ctx, &id.name)?;
            put_value(ctx, &reference, value)
        }
        ForInBinding::Declaration { kind, id } => {
            let env = new_declarative_environment(Some(ctx.lex_env.clone()));
            {
                let mut e = env.borrow_mut();
                let record = e.inner.as_env_record_mut();
                if *kind == VariableDeclarationKind::Const {
                    record.create_immutable_binding(id.name.clone())?;
                } else {
                    record.create_mutable_binding(id.name.clone(), false)?;
                }
                record.initialize_binding(&id.name, value)?;
            }
            ctx.lex_env = env;
            Ok(())
        }
        ForInBinding::Target(expr) => {
            let reference = evaluate_reference(expr, ctx)?;
            put_value(ctx, &reference, value)
        }
    }
}

// ---------------------------------------------------------------------------
// try / catch / finally
// ---------------------------------------------------------------------------

fn execute_try_statement(
    block: &BlockStatementData,
    handler: Option<&CatchClauseData>,
    finalizer: Option<&BlockStatementData>,
    ctx: &mut EvalContext,
) -> EvalResult {
    let result = match (execute_block_statement(block, ctx), handler) {
        (Err(e), Some(handler)) => {
            let thrown = error_to_value(ctx, e);
            execute_catch_clause(handler, thrown, ctx)
        }
        (result, _) => result,
    };
    if let Some(finalizer) = finalizer {
        let completion = execute_block_statement(finalizer, ctx)?;
        if completion.is_abrupt() {
            return Ok(completion);
        }
    }
    result.map(|c| c.update_empty(Some(JsValue::Undefined)))
}

fn execute_catch_clause(
    handler: &CatchClauseData,
    thrown: JsValue,
    ctx: &mut EvalContext,
) -> EvalResult {
    let env = new_declarative_environment(Some(ctx.lex_env.clone()));
    if let Some(param) = &handler.param {
        let mut e = env.borrow_mut();
        let record = e.inner.as_env_record_mut();
        record.create_mutable_binding(param.name.clone(), false)?;
        record.initialize_binding(&param.name, thrown)?;
    }
    let saved = std::mem::replace(&mut ctx.lex_env, env);
    let result = execute_block_statement(&handler.body, ctx);
    ctx.lex_env = saved;
    result
}
