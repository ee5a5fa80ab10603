//! Error types for the durability model
//!
//! Provides structured error types for configuration validation, model
//! file loading, and the command-line driver. Arithmetic corner cases inside
//! the engine are never errors; they resolve to defined sentinel values.

use thiserror::Error;

/// Unified error type for the model
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid parameter {parameter} in model '{model}': {reason}")]
    InvalidParameter {
        model: String,
        parameter: String,
        reason: String,
    },

    #[error("Redundancy group {group} in model '{model}' needs {required} of {total} parts")]
    RedundancyGroup {
        model: String,
        group: String,
        required: u32,
        total: u32,
    },

    #[error("Invalid evaluation parameter {parameter}: {reason}")]
    InvalidEvaluation { parameter: String, reason: String },

    // =========================================================================
    // Driver Errors
    // =========================================================================
    #[error("Unknown scenario suite: {0}")]
    UnknownSuite(String),

    #[error("Unsupported model file format: {path}")]
    UnsupportedFormat { path: String },

    #[error("Model file {path} contains no models")]
    EmptyModelFile { path: String },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an [`Error::InvalidParameter`]
    pub fn invalid(model: &str, parameter: &str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            model: model.to_string(),
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }

    /// Check if this error was caused by the supplied configuration rather
    /// than by the environment
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::Configuration(_)
                | Error::InvalidParameter { .. }
                | Error::RedundancyGroup { .. }
                | Error::InvalidEvaluation { .. }
                | Error::UnknownSuite(_)
                | Error::UnsupportedFormat { .. }
                | Error::EmptyModelFile { .. }
                | Error::JsonParse(_)
                | Error::YamlParse(_)
        )
    }

    /// Process exit code the driver reports for this error
    pub fn exit_code(&self) -> u8 {
        if self.is_config_error() {
            2
        } else {
            1
        }
    }
}

/// Result type alias for the model
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message() {
        let err = Error::invalid("baseline", "rate_flush", "must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid parameter rate_flush in model 'baseline': must be positive"
        );
    }

    #[test]
    fn test_config_classification() {
        let err = Error::RedundancyGroup {
            model: "m".into(),
            group: "power".into(),
            required: 3,
            total: 2,
        };
        assert!(err.is_config_error());
        assert_eq!(err.exit_code(), 2);

        let io = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(!io.is_config_error());
        assert_eq!(io.exit_code(), 1);
    }
}
