//! The isolate: one engine instance, its realms and the stack of entered
//! scopes.
//!
//! Everything runs on the thread that created the isolate. Scopes nest
//! strictly: entering returns a [`ScopeGuard`] and the scope stays current
//! until that guard is dropped, whichever way the code that holds it returns.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use pest::error::{Error, ErrorVariant, InputLocation, LineColLocation};
use tracing::{debug, error, trace};

use crate::config::EngineConfig;
use crate::parser::ast::ProgramData;
use crate::parser::{JsParser, Rule};
use crate::runner::ds::error::{CompileDiagnostic, JErrorType};
use crate::runner::ds::object::{object_create, JsObjectType};
use crate::runner::ds::property_handler::GlobalTemplate;
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::error_to_value;
use crate::runner::eval::statement::execute_program;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::EvalContext;

pub struct Isolate {
    config: EngineConfig,
    registry: BuiltInRegistry,
    main_realm: Rc<Realm>,
    entered: RefCell<Vec<Rc<Realm>>>,
    call_depth: Cell<usize>,
}

impl Isolate {
    pub fn new() -> Rc<Self> {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Rc<Self> {
        Self::with_registry(config, BuiltInRegistry::with_core())
    }

    /// An isolate whose realms are seeded from a custom registry.
    pub fn with_registry(config: EngineConfig, registry: BuiltInRegistry) -> Rc<Self> {
        let main_realm = Realm::new(GlobalTemplate::default(), &registry, &config);
        debug!(realm = %main_realm.id(), "isolate created");
        Rc::new(Isolate {
            config,
            registry,
            main_realm,
            entered: RefCell::new(vec![]),
            call_depth: Cell::new(0),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &BuiltInRegistry {
        &self.registry
    }

    /// The host's own realm, current whenever no other scope is entered.
    pub fn main_realm(&self) -> Rc<Realm> {
        self.main_realm.clone()
    }

    pub fn current_realm(&self) -> Rc<Realm> {
        self.entered
            .borrow()
            .last()
            .cloned()
            .unwrap_or_else(|| self.main_realm.clone())
    }

    /// Number of scopes currently entered.
    pub fn scope_depth(&self) -> usize {
        self.entered.borrow().len()
    }

    /// An ordinary object of the main realm, typically used as a sandbox.
    pub fn new_object(&self) -> JsObjectType {
        object_create(Some(self.main_realm.intrinsics().object_prototype()))
    }

    /// Creates a fresh realm whose global object follows `template`.
    pub fn new_scope(&self, template: GlobalTemplate) -> Rc<Realm> {
        let realm = Realm::new(template, &self.registry, &self.config);
        debug!(realm = %realm.id(), "scope created");
        realm
    }

    pub fn enter(self: &Rc<Self>, realm: &Rc<Realm>) -> ScopeGuard {
        let depth = {
            let mut entered = self.entered.borrow_mut();
            entered.push(realm.clone());
            entered.len()
        };
        trace!(realm = %realm.id(), depth, "scope entered");
        ScopeGuard {
            isolate: self.clone(),
            realm: realm.clone(),
            depth,
            phase: ExecutionPhase::Entered,
        }
    }

    /// Counts one nested call; the returned guard releases it.
    pub fn enter_call(&self) -> Result<CallDepthGuard<'_>, JErrorType> {
        let depth = self.call_depth.get();
        if depth >= self.config.max_call_depth {
            return Err(JErrorType::RangeError(
                "Maximum call stack size exceeded".to_string(),
            ));
        }
        self.call_depth.set(depth + 1);
        Ok(CallDepthGuard { isolate: self })
    }

    /// Parses `source`. The result does not belong to any realm and may be
    /// executed in as many scopes as needed.
    pub fn compile(&self, source: &str, filename: &str) -> Result<Rc<ProgramData>, CompileDiagnostic> {
        match JsParser::parse_to_ast_from_str(source) {
            Ok(program) => {
                debug!(filename, statements = program.body.len(), "script compiled");
                Ok(Rc::new(program))
            }
            Err(e) => {
                let diagnostic = to_diagnostic(source, filename, e);
                debug!(filename, error = %diagnostic.message, "compilation failed");
                Err(diagnostic)
            }
        }
    }
}

fn to_diagnostic(source: &str, filename: &str, e: Error<Rule>) -> CompileDiagnostic {
    let (line, column) = match e.line_col {
        LineColLocation::Pos(pos) => pos,
        LineColLocation::Span(start, _) => start,
    };
    let offset = match e.location {
        InputLocation::Pos(p) => p,
        InputLocation::Span((start, _)) => start,
    };
    let message = match e.variant {
        ErrorVariant::CustomError { message } => message,
        ErrorVariant::ParsingError { .. } => match source.get(offset..).and_then(|s| s.chars().next()) {
            Some(c) => format!("Unexpected token '{}'", c),
            None => "Unexpected end of input".to_string(),
        },
    };
    CompileDiagnostic {
        name: "SyntaxError".to_string(),
        message,
        filename: filename.to_string(),
        line,
        column,
    }
}

/// Decrements the call depth when a call returns.
pub struct CallDepthGuard<'a> {
    isolate: &'a Isolate,
}

impl Drop for CallDepthGuard<'_> {
    fn drop(&mut self) {
        let depth = self.isolate.call_depth.get();
        self.isolate.call_depth.set(depth.saturating_sub(1));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPhase {
    Entered,
    Executing,
    Completed,
    Failed,
    Exited,
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionPhase::Entered => "entered",
            ExecutionPhase::Executing => "executing",
            ExecutionPhase::Completed => "completed",
            ExecutionPhase::Failed => "failed",
            ExecutionPhase::Exited => "exited",
        };
        f.write_str(name)
    }
}

/// An entered scope. Dropping the guard exits it.
pub struct ScopeGuard {
    isolate: Rc<Isolate>,
    realm: Rc<Realm>,
    depth: usize,
    phase: ExecutionPhase,
}

impl ScopeGuard {
    pub fn realm(&self) -> &Rc<Realm> {
        &self.realm
    }

    pub fn phase(&self) -> ExecutionPhase {
        self.phase
    }

    fn transition(&mut self, phase: ExecutionPhase) {
        trace!(realm = %self.realm.id(), from = %self.phase, to = %phase, "scope phase");
        self.phase = phase;
    }

    /// Runs `program` against the global scope of the entered realm. A
    /// failure is returned as the value script code would have caught.
    pub fn execute(&mut self, program: &ProgramData, script_name: &str) -> Result<JsValue, JsValue> {
        self.transition(ExecutionPhase::Executing);
        let mut ctx = EvalContext::new(self.isolate.clone(), self.realm.clone(), script_name);
        match execute_program(program, &mut ctx) {
            Ok(value) => {
                self.transition(ExecutionPhase::Completed);
                Ok(value)
            }
            Err(e) => {
                self.transition(ExecutionPhase::Failed);
                Err(error_to_value(&ctx, e))
            }
        }
    }

    /// Exits the scope now rather than at the end of the enclosing block.
    pub fn exit(self) {}
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let mut entered = self.isolate.entered.borrow_mut();
        let in_order = entered.len() == self.depth
            && entered
                .last()
                .map(|top| Rc::ptr_eq(top, &self.realm))
                .unwrap_or(false);
        if !in_order {
            error!(
                realm = %self.realm.id(),
                expected_depth = self.depth,
                actual_depth = entered.len(),
                "scope exited out of order"
            );
        }
        entered.truncate(self.depth.saturating_sub(1));
        drop(entered);
        self.transition(ExecutionPhase::Exited);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_restore_the_previous_scope() {
        let isolate = Isolate::new();
        let a = isolate.new_scope(GlobalTemplate::default());
        let b = isolate.new_scope(GlobalTemplate::default());
        {
            let _outer = isolate.enter(&a);
            {
                let _inner = isolate.enter(&b);
                assert!(Rc::ptr_eq(&isolate.current_realm(), &b));
            }
            assert!(Rc::ptr_eq(&isolate.current_realm(), &a));
        }
        assert!(Rc::ptr_eq(&isolate.current_realm(), &isolate.main_realm()));
        assert_eq!(isolate.scope_depth(), 0);
    }

    #[test]
    fn out_of_order_exit_truncates_the_stack() {
        let isolate = Isolate::new();
        let a = isolate.new_scope(GlobalTemplate::default());
        let b = isolate.new_scope(GlobalTemplate::default());
        let outer = isolate.enter(&a);
        let inner = isolate.enter(&b);
        drop(outer);
        assert_eq!(isolate.scope_depth(), 0);
        drop(inner);
        assert_eq!(isolate.scope_depth(), 0);
    }

    #[test]
    fn execute_reports_phases() {
        let isolate = Isolate::new();
        let realm = isolate.new_scope(GlobalTemplate::default());
        let program = isolate.compile("1 + 1", "t.js").unwrap();
        let mut scope = isolate.enter(&realm);
        assert_eq!(scope.phase(), ExecutionPhase::Entered);
        assert_eq!(scope.execute(&program, "t.js").unwrap(), JsValue::from(2i64));
        assert_eq!(scope.phase(), ExecutionPhase::Completed);
        let failing = isolate.compile("throw 1", "t.js").unwrap();
        assert!(scope.execute(&failing, "t.js").is_err());
        assert_eq!(scope.phase(), ExecutionPhase::Failed);
    }

    #[test]
    fn compile_errors_carry_a_position() {
        let isolate = Isolate::new();
        let diagnostic = isolate.compile("var = 1;", "bad.js").unwrap_err();
        assert_eq!(diagnostic.name, "SyntaxError");
        assert_eq!(diagnostic.filename, "bad.js");
        assert_eq!(diagnostic.line, 1);
    }

    #[test]
    fn call_depth_is_bounded() {
        let config = EngineConfig {
            max_call_depth: 2,
            ..EngineConfig::default()
        };
        let isolate = Isolate::with_config(config);
        let first = isolate.enter_call().unwrap();
        let _second = isolate.enter_call().unwrap();
        assert!(matches!(isolate.enter_call(), Err(JErrorType::RangeError(_))));
        drop(first);
        assert!(isolate.enter_call().is_ok());
    }
}
