use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure kinds of a single call to the LLM endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslationError {
    ConnectionRefused,
    Timeout,
    HostNotFound,
    HttpError(u16),
    EmptyResponse,
    ParseError(String),
    Other(String),
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationError::ConnectionRefused => write!(f, "connection refused"),
            TranslationError::Timeout => write!(f, "request timed out"),
            TranslationError::HostNotFound => write!(f, "host not found"),
            TranslationError::HttpError(status) => write!(f, "HTTP error ({})", status),
            TranslationError::EmptyResponse => write!(f, "model returned an empty response"),
            TranslationError::ParseError(msg) => write!(f, "failed to parse response: {}", msg),
            TranslationError::Other(msg) => write!(f, "request failed: {}", msg),
        }
    }
}

impl std::error::Error for TranslationError {}

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    NotFound(String),
    ValidationError(String),
    Translation(TranslationError),
    CacheNotFound(String),
    InvalidColumnType(String),
    DatabaseError(String),
    IoError(String),
    ConfigError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::Translation(err) => write!(f, "Translation error: {}", err),
            AppError::CacheNotFound(cmd) => {
                write!(f, "Command not found in cache file: {}", cmd)
            }
            AppError::InvalidColumnType(msg) => write!(f, "Invalid column type: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".to_string()),
            other => AppError::DatabaseError(other.to_string()),
        }
    }
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<TranslationError> for AppError {
    fn from(err: TranslationError) -> Self {
        AppError::Translation(err)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
