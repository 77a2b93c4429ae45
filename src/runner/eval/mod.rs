//! Evaluation module for executing the JavaScript AST.
//!
//! A tree-walking interpreter: statements produce [`Completion`] records,
//! expressions produce values, and failures travel as
//! [`JErrorType`](crate::runner::ds::error::JErrorType) through `?` until a
//! `catch` block or the top-level entry point turns them into script values.

pub mod expression;
pub mod function;
pub mod statement;
pub mod types;

pub use types::{Completion, CompletionType, Reference, ReferenceBase};
