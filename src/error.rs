use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Transport(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("{0}")]
    Staging(String),
}

impl AppError {
    pub fn message(&self) -> String {
        self.to_string()
    }
}

// Serialized as a plain message so it can cross a host boundary unchanged.
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Transport(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Transport(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_message() {
        let err = AppError::Validation("Model path is empty".into());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Model path is empty\"");
    }

    #[test]
    fn plain_strings_are_transport_failures() {
        let err: AppError = "backend unreachable".into();
        assert!(matches!(err, AppError::Transport(_)));
        assert_eq!(err.message(), "backend unreachable");
    }
}
