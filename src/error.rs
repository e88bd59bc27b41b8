use thiserror::Error;

/// Errors that terminate a run: the streams themselves or an unusable configuration
#[derive(Debug, Error)]
pub enum LognormError {
    /// Reading the input or writing the output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration or schema document could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value was decodable but unusable
    #[error("configuration error for '{parameter}': {message}")]
    Configuration { parameter: String, message: String },

    /// The merged validation schema is not usable
    #[error("invalid schema: {0}")]
    Schema(String),
}

/// Convenience alias for fallible engine operations.
pub type LognormResult<T> = Result<T, LognormError>;

/// Per-line failures. These never abort a run; the line is recorded and passed through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// The line is not valid JSON
    #[error("JSON syntax error: {message}")]
    MalformedInput { message: String },

    /// The line is valid JSON but not an object
    #[error("JSON is not an object, found: {found}")]
    NotAnObject { found: &'static str },

    /// A record could not be rendered back to a line
    #[error("failed to serialize record: {message}")]
    Serialization { message: String },
}

impl RecordError {
    /// Stable name of the failure kind, used as a histogram key
    pub fn kind_name(&self) -> &'static str {
        match self {
            RecordError::MalformedInput { .. } => "MalformedInput",
            RecordError::NotAnObject { .. } => "NotAnObject",
            RecordError::Serialization { .. } => "Serialization",
        }
    }
}

impl From<serde_json::Error> for RecordError {
    fn from(err: serde_json::Error) -> Self {
        RecordError::MalformedInput {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_error_from_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let record_error = RecordError::from(err);
        assert_eq!(record_error.kind_name(), "MalformedInput");
        assert!(record_error.to_string().starts_with("JSON syntax error:"));
    }

    #[test]
    fn test_configuration_error_display() {
        let err = LognormError::Configuration {
            parameter: "syslog_year".to_string(),
            message: "must be positive".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "configuration error for 'syslog_year': must be positive"
        );
    }
}
