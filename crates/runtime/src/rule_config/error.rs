//! Error types raised by rule-config repositories.

use synergy_core::{EngineError, ErrorSeverity};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("rule config repository lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),
}

impl EngineError for RepositoryError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Io(_) => ErrorSeverity::Recoverable,
            Self::LockPoisoned | Self::Json(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::LockPoisoned => "REPOSITORY_LOCK_POISONED",
            Self::Io(_) => "REPOSITORY_IO",
            Self::Json(_) => "REPOSITORY_JSON",
        }
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
