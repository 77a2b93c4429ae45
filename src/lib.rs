//! # just-vm - isolated script contexts in Rust
//!
//! Runs script code inside a global scope of its own, with the globals stored
//! on an ordinary object the host owns (the *sandbox*). Built on a small
//! tree-walking ECMAScript interpreter:
//! - PEG parser with an ESTree-like AST
//! - Tree-walking evaluator with realms, environments and prototype chains
//! - Built-in library materialized per realm from a registry
//! - A named property interceptor wiring each isolated global to its sandbox
//!
//! ## Quick Start
//!
//! ### Running code against a sandbox
//!
//! ```
//! use just_vm::contextify::{run, IsolatedContext};
//! use just_vm::runner::ds::operations::object::{get, own_enumerable_keys, set};
//! use just_vm::runner::ds::value::JsValue;
//! use just_vm::runner::Isolate;
//!
//! let isolate = Isolate::new();
//! let sandbox = isolate.new_object();
//! set(&sandbox, "x", JsValue::from(1i64)).unwrap();
//!
//! let context = IsolatedContext::new(&isolate, &JsValue::Object(sandbox.clone())).unwrap();
//! run(&context, "y = x + 1; z = typeof Array;", Some("demo.js")).unwrap();
//!
//! assert_eq!(own_enumerable_keys(&sandbox).unwrap(), vec!["x", "y", "z"]);
//! assert_eq!(get(&sandbox, "z").unwrap(), JsValue::from("function"));
//! ```
//!
//! ### Compile once, run many times
//!
//! ```
//! use just_vm::contextify::{CompiledScript, IsolatedContext};
//! use just_vm::runner::ds::operations::object::get;
//! use just_vm::runner::ds::value::JsValue;
//! use just_vm::runner::Isolate;
//!
//! let isolate = Isolate::new();
//! let script = CompiledScript::compile(&isolate, "a = 1", None).unwrap();
//!
//! let first = isolate.new_object();
//! let second = isolate.new_object();
//! for sandbox in [&first, &second].iter() {
//!     let context = IsolatedContext::new(&isolate, &JsValue::Object((*sandbox).clone())).unwrap();
//!     script.run_in_context(&context).unwrap();
//! }
//! assert_eq!(get(&first, "a").unwrap(), JsValue::from(1i64));
//! assert_eq!(get(&second, "a").unwrap(), JsValue::from(1i64));
//! ```
//!
//! ### Failures
//!
//! Mistakes at the boundary and failures of the code itself are told apart:
//!
//! ```
//! use just_vm::contextify::{binding, ContextifyError};
//! use just_vm::runner::ds::value::JsValue;
//! use just_vm::runner::Isolate;
//!
//! let isolate = Isolate::new();
//! let sandbox = JsValue::Object(isolate.new_object());
//! let context = binding::make_context(&isolate, &[sandbox]).unwrap();
//!
//! let run = |args: Vec<JsValue>| binding::run_in_context(&args);
//! assert!(matches!(
//!     run(vec![context.clone(), JsValue::from("2+"), JsValue::from("bad.js")]),
//!     Err(ContextifyError::Compile(_))
//! ));
//! assert!(matches!(
//!     run(vec![context.clone(), JsValue::from("throw 5")]),
//!     Err(ContextifyError::Runtime(v)) if v == JsValue::from(5i64)
//! ));
//! assert!(matches!(
//!     run(vec![context, JsValue::from(42i64)]),
//!     Err(ContextifyError::Argument(_))
//! ));
//! ```
//!
//! ## Architecture
//!
//! - **[`parser`]** - PEG parser and AST types
//! - **[`runner`]** - The engine
//!   - **[`runner::ds`]** - Data structures (values, objects, environments, realms)
//!   - **[`runner::eval`]** - Tree-walking evaluator
//!   - **[`runner::plugin`]** - Built-in registry and the native call context
//!   - **[`runner::std_lib`]** - The built-in library
//!   - **[`runner::isolate`]** - Isolate, scope entry and compilation
//! - **[`contextify`]** - Isolated contexts, compiled scripts, the runner and
//!   the value-level binding
//! - **[`config`]** - Engine configuration

pub mod config;
pub mod contextify;
pub mod parser;
pub mod runner;

pub use config::{ConfigError, EngineConfig};
pub use contextify::{CompiledScript, ContextifyError, IsolatedContext};
pub use runner::Isolate;
