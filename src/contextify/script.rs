//! Compiled scripts.

use std::fmt;
use std::rc::Rc;

use crate::parser::ast::ProgramData;
use crate::runner::ds::value::JsValue;
use crate::runner::isolate::Isolate;

use super::context::IsolatedContext;
use super::error::ContextifyError;
use super::runner;

/// Source text compiled once, runnable against any number of contexts.
///
/// The parsed program is shared, never modified, so clones are cheap.
#[derive(Clone)]
pub struct CompiledScript {
    program: Rc<ProgramData>,
    display_name: Rc<str>,
}

impl CompiledScript {
    /// Compiles `source`. Without a display name the configured default
    /// filename is used.
    pub fn compile(
        isolate: &Isolate,
        source: &str,
        display_name: Option<&str>,
    ) -> Result<Self, ContextifyError> {
        let display_name = display_name.unwrap_or(&isolate.config().default_filename);
        let program = isolate
            .compile(source, display_name)
            .map_err(ContextifyError::Compile)?;
        Ok(CompiledScript {
            program,
            display_name: Rc::from(display_name),
        })
    }

    pub fn source(&self) -> &str {
        &self.program.source
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub(crate) fn program(&self) -> &ProgramData {
        &self.program
    }

    /// Runs the script with `context`'s isolated global as its global scope.
    pub fn run_in_context(&self, context: &IsolatedContext) -> Result<JsValue, ContextifyError> {
        runner::run_script(self, context)
    }

    /// Runs the script in whatever scope is current on `isolate`.
    pub fn run_in_this_context(&self, isolate: &Rc<Isolate>) -> Result<JsValue, ContextifyError> {
        runner::run_in_this_context(self, isolate)
    }
}

impl fmt::Debug for CompiledScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledScript")
            .field("display_name", &self.display_name)
            .finish()
    }
}
