use thiserror::Error;

use crate::runner::ds::error::{CompileDiagnostic, JErrorType};
use crate::runner::ds::operations::object::get;
use crate::runner::ds::value::JsValue;

/// Failures surfaced at the isolation boundary.
///
/// `Argument` and `Type` are mistakes of the caller and are detected before
/// any script runs. `Compile` and `Runtime` come from the code itself;
/// `Runtime` carries the thrown value untouched.
#[derive(Debug, Error)]
pub enum ContextifyError {
    #[error("ArgumentError: {0}")]
    Argument(String),
    #[error("{0}")]
    Compile(CompileDiagnostic),
    #[error("Uncaught {}", describe_thrown(.0))]
    Runtime(JsValue),
    #[error("TypeError: {0}")]
    Type(String),
}

impl ContextifyError {
    /// The thrown value of a runtime failure.
    pub fn thrown_value(&self) -> Option<&JsValue> {
        match self {
            ContextifyError::Runtime(v) => Some(v),
            _ => None,
        }
    }

    /// How script code calling through the `vm` object observes this error.
    pub(crate) fn into_script_error(self) -> JErrorType {
        match self {
            ContextifyError::Argument(message) | ContextifyError::Type(message) => {
                JErrorType::TypeError(message)
            }
            ContextifyError::Compile(diagnostic) => JErrorType::SyntaxError(diagnostic.message),
            ContextifyError::Runtime(value) => JErrorType::Thrown(value),
        }
    }
}

/// Error objects are shown by their `stack`, anything else by its display
/// form.
fn describe_thrown(value: &JsValue) -> String {
    if let JsValue::Object(o) = value {
        if let Ok(JsValue::String(stack)) = get(o, "stack") {
            return stack;
        }
    }
    value.to_string()
}
