//! Isolated script contexts.
//!
//! An [`IsolatedContext`] gives script code a global scope of its own whose
//! globals are stored on an object the host keeps: every global the code
//! creates ends up on that sandbox, while built-ins still resolve from the
//! fresh scope. A [`CompiledScript`] is parsed once and can run against any
//! number of contexts.
//!
//! ```
//! use just_vm::contextify::{run, IsolatedContext};
//! use just_vm::runner::ds::operations::object::{get, set};
//! use just_vm::runner::ds::value::JsValue;
//! use just_vm::runner::Isolate;
//!
//! let isolate = Isolate::new();
//! let sandbox = isolate.new_object();
//! set(&sandbox, "x", JsValue::from(1i64)).unwrap();
//!
//! let context = IsolatedContext::new(&isolate, &JsValue::Object(sandbox.clone())).unwrap();
//! run(&context, "y = x + 1;", None).unwrap();
//!
//! assert_eq!(get(&sandbox, "y").unwrap(), JsValue::from(2i64));
//! ```

pub mod binding;
mod context;
mod error;
mod interceptor;
mod runner;
mod script;

pub use self::context::IsolatedContext;
pub use self::error::ContextifyError;
pub use self::runner::{run, run_in_this_context, run_script};
pub use self::script::CompiledScript;
