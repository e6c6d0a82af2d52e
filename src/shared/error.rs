use thiserror::Error;
use serde::Serialize;

/// User-facing message shown when a translation request fails for any reason.
pub const CONNECTION_INTERRUPTED: &str = "Connection interrupted. Please try again.";

#[derive(Error, Debug, Serialize)]
pub enum AppError {
    #[error("I/O Error: {0}")]
    Io(String),

    #[error("Network Error: {0}")]
    Network(String),

    #[error("Storage Error: {0}")]
    Storage(String),

    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("Config Error: {0}")]
    Config(String),

    #[error("Clipboard Error: {0}")]
    Clipboard(String),

    #[error("Speech Error: {0}")]
    Speech(String),

    /// The remote text-generation call failed. The underlying detail is
    /// logged where it happens and deliberately not carried here.
    #[error("Failed to translate text. Please try again.")]
    TranslationFailure,
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("Serialization error: {}", err))
    }
}

impl From<redb::Error> for AppError {
    fn from(err: redb::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_failure_hides_detail() {
        let err = AppError::TranslationFailure;
        assert_eq!(err.to_string(), "Failed to translate text. Please try again.");
    }

    #[test]
    fn json_errors_become_validation_errors() {
        let err: AppError = serde_json::from_str::<Vec<u8>>("{").unwrap_err().into();
        assert!(matches!(err, AppError::Validation(msg) if msg.starts_with("Serialization error")));
    }
}
