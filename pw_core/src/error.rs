/// Core error type for poolwatch
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Config("interval must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: interval must be positive"
        );
    }

    #[test]
    fn test_config_error_conversion() {
        let err: Error = config::ConfigError::Message("bad value".to_string()).into();
        assert!(matches!(err, Error::Config(msg) if msg.contains("bad value")));
    }
}
