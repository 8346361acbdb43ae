use thiserror::Error;

/// Top-level error type for the Swasthya assistant.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for SwasthyaError` so that the `?` operator works
/// across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SwasthyaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for SwasthyaError {
    fn from(err: toml::de::Error) -> Self {
        SwasthyaError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SwasthyaError {
    fn from(err: toml::ser::Error) -> Self {
        SwasthyaError::Config(err.to_string())
    }
}

/// A specialized `Result` type for Swasthya operations.
pub type Result<T> = std::result::Result<T, SwasthyaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SwasthyaError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");

        let err = SwasthyaError::Catalog("no entries".to_string());
        assert_eq!(err.to_string(), "Catalog error: no entries");

        let err = SwasthyaError::Speech("launch failed".to_string());
        assert_eq!(err.to_string(), "Speech error: launch failed");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SwasthyaError = io_err.into();
        assert!(matches!(err, SwasthyaError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let parse_err = toml::from_str::<toml::Value>("[[broken").unwrap_err();
        let err: SwasthyaError = parse_err.into();
        assert!(matches!(err, SwasthyaError::Config(_)));
    }
}
