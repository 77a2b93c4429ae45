//! Engine configuration.
//!
//! Every field has a default, so an empty TOML document (or none at all)
//! gives the stock engine.
//!
//! ```toml
//! default_filename = "sandbox.js"
//! max_call_depth = 32
//! console = false
//! ```

use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_FILENAME: &str = "evalmachine.<anonymous>";
/// Each script call costs several evaluator frames on the native stack, so
/// this stays well inside a 2 MiB thread stack in unoptimized builds. Hosts
/// that need deeper recursion raise it and run on a larger stack.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Display name of scripts compiled without one.
    pub default_filename: String,
    /// Nested calls allowed before a `RangeError` is raised.
    pub max_call_depth: usize,
    /// Whether fresh scopes get a `console` object.
    pub console: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            default_filename: DEFAULT_FILENAME.to_string(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            console: true,
        }
    }
}

impl EngineConfig {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(EngineConfig::parse("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn fields_override_defaults_individually() {
        let config = EngineConfig::parse("max_call_depth = 200").unwrap();
        assert_eq!(config.max_call_depth, 200);
        assert_eq!(config.default_filename, DEFAULT_FILENAME);
        assert!(config.console);
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(matches!(
            EngineConfig::parse("console = \"yes\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
