//! Built-in definitions and the execution context native code runs with.
//!
//! Built-ins are described once in a [`BuiltInRegistry`] as
//! [`BuiltInObject`] blueprints. Every realm the isolate creates materializes
//! its own objects from the registry, so two contexts never share a mutable
//! built-in: patching `Array.prototype` in one is invisible in the other.
//!
//! Native functions have the [`NativeFn`] signature and receive the
//! [`EvalContext`](types::EvalContext) of the caller, switched to the realm
//! the function was created in.

pub mod registry;
pub mod types;

pub use registry::{BuiltInRegistry, PluginError};
pub use types::{BuiltInObject, EvalContext, NativeFn};
