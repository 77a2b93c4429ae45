//! Execution drivers.
//!
//! Every entry point enters a scope, runs, and leaves it again before the
//! result or the failure is handed back. The scope guard makes the exit
//! unconditional.

use std::rc::Rc;

use crate::runner::ds::value::JsValue;
use crate::runner::isolate::Isolate;

use super::context::IsolatedContext;
use super::error::ContextifyError;
use super::script::CompiledScript;

/// Compiles `code` and runs it in `context` at once.
///
/// Compilation happens with the context's scope already entered, so a
/// syntax error leaves the scope exactly like a thrown value does.
pub fn run(
    context: &IsolatedContext,
    code: &str,
    filename: Option<&str>,
) -> Result<JsValue, ContextifyError> {
    let isolate = context.isolate();
    let filename = filename.unwrap_or(&isolate.config().default_filename);
    let mut scope = isolate.enter(context.realm());
    let program = isolate
        .compile(code, filename)
        .map_err(ContextifyError::Compile)?;
    let result = scope.execute(&program, filename);
    scope.exit();
    result.map_err(ContextifyError::Runtime)
}

/// Runs a precompiled script in `context`.
pub fn run_script(
    script: &CompiledScript,
    context: &IsolatedContext,
) -> Result<JsValue, ContextifyError> {
    let mut scope = context.isolate().enter(context.realm());
    let result = scope.execute(script.program(), script.display_name());
    scope.exit();
    result.map_err(ContextifyError::Runtime)
}

/// Runs a precompiled script against the realm that is current on
/// `isolate`, the main realm when no context is entered.
pub fn run_in_this_context(
    script: &CompiledScript,
    isolate: &Rc<Isolate>,
) -> Result<JsValue, ContextifyError> {
    let mut scope = isolate.enter(&isolate.current_realm());
    let result = scope.execute(script.program(), script.display_name());
    scope.exit();
    result.map_err(ContextifyError::Runtime)
}
