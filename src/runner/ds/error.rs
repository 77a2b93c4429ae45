use std::fmt;

use crate::runner::ds::value::JsValue;

/// Errors raised while evaluating script code. The named variants are engine
/// failures that get turned into Error objects of the executing realm the
/// moment script code can observe them; `Thrown` carries a value raised by a
/// `throw` statement unchanged.
#[derive(Debug, Clone)]
pub enum JErrorType {
    ReferenceError(String),
    TypeError(String),
    RangeError(String),
    SyntaxError(String),
    Thrown(JsValue),
}

impl JErrorType {
    pub fn name(&self) -> &'static str {
        match self {
            JErrorType::ReferenceError(_) => "ReferenceError",
            JErrorType::TypeError(_) => "TypeError",
            JErrorType::RangeError(_) => "RangeError",
            JErrorType::SyntaxError(_) => "SyntaxError",
            JErrorType::Thrown(_) => "Error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            JErrorType::ReferenceError(m)
            | JErrorType::TypeError(m)
            | JErrorType::RangeError(m)
            | JErrorType::SyntaxError(m) => m.to_string(),
            JErrorType::Thrown(v) => v.to_string(),
        }
    }
}

impl fmt::Display for JErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JErrorType::Thrown(v) => write!(f, "Uncaught {}", v),
            _ => write!(f, "Uncaught {}: {}", self.name(), self.message()),
        }
    }
}

/// Parse failure reported by `Isolate::compile`, positioned in the source
/// that was compiled.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileDiagnostic {
    pub name: String,
    pub message: String,
    pub filename: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for CompileDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}\n{}: {}",
            self.filename, self.line, self.column, self.name, self.message
        )
    }
}
