//! Error types for the input engine.
//!
//! Input processing itself never fails: malformed event sequences are
//! absorbed by the state machines. Only loading configuration can go wrong.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading engine configuration.
#[derive(Debug, Error)]
pub enum InputError {
    /// The configuration file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration is not valid TOML or has mistyped fields.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = InputError::Io {
            path: PathBuf::from("/nonexistent/input.toml"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(err.to_string().starts_with("Failed to read /nonexistent/input.toml"));

        let parse = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err = InputError::from(parse);
        assert!(err.to_string().starts_with("Invalid configuration:"));
    }
}
