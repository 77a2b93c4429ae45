//! The script engine the isolation layer is built on: values and objects
//! (`ds`), the tree-walking evaluator (`eval`), the built-in library
//! (`std_lib`, `plugin`) and the isolate that ties realms and scopes
//! together.

pub mod ds;
pub mod eval;
pub mod isolate;
pub mod plugin;
pub mod std_lib;

pub use isolate::{ExecutionPhase, Isolate, ScopeGuard};
