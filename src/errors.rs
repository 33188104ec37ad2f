use thiserror::Error;

/// Top-level error taxonomy for the application shell.
///
/// Subsystems carry their own error enums (`CurationError`, `SpotifyError`);
/// this type is what the binary reports at the end of a run.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::curation::CurationError> for AppError {
    fn from(e: crate::curation::CurationError) -> Self {
        use crate::curation::CurationError;
        match e {
            CurationError::InvalidFilter(msg) => AppError::Config(msg),
            CurationError::Store(msg) => AppError::Database(msg),
            CurationError::Sync(msg) | CurationError::Publish(msg) => AppError::Network(msg),
            CurationError::NotAuthenticated => {
                AppError::Auth("not authenticated with the streaming service".to_string())
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::FileSystem(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Internal(format!("Serialization error: {}", e))
    }
}
