use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The price series is empty or otherwise too short to analyse at all.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// A non-positive window, span or period, or mismatched input lengths.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("YAML configuration error: {source}")]
    YamlError {
        #[from]
        source: serde_yaml::Error,
    },

    #[error("CSV parsing system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("CSV data format error: {0}")]
    CsvDataFormatError(String),

    #[error("Market data error: {0}")]
    MarketDataError(String),

    #[error("HTTP request failed: {source}")]
    HttpError {
        #[from]
        source: reqwest::Error,
    },

    #[error("Notification error: {0}")]
    NotificationError(String),
}

impl EngineError {
    /// Errors that originate from the caller's input rather than the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            EngineError::InsufficientData(_) | EngineError::InvalidParameter(_)
        )
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EngineError::InsufficientData("price series is empty".to_string());
        assert_eq!(err.to_string(), "Insufficient data: price series is empty");
        assert!(err.is_input_error());

        let err = EngineError::MarketDataError("coin 'foo' not found".to_string());
        assert!(!err.is_input_error());
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: EngineError = io.into();
        assert!(err.to_string().starts_with("I/O error"));
    }
}
