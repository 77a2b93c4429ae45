//! Standard library built-in objects.
//!
//! Each module registers one built-in (constructor, statics and prototype
//! methods) with a [`BuiltInRegistry`](crate::runner::plugin::BuiltInRegistry).
//! Every realm materializes its own copy of what is registered, so two
//! contexts never share an `Array.prototype`.

pub mod array;
pub mod boolean;
pub mod console;
pub mod core;
pub mod error;
pub mod function;
pub mod json;
pub mod math;
pub mod number;
pub mod object;
pub mod string;

pub use self::core::register_core_builtins;
