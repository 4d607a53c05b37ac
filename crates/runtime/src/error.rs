//! Error types raised by the rule registry and manager.

use synergy_core::{EngineError, ErrorSeverity};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("rule `{0}` is already registered")]
    DuplicateId(String),

    #[error("rule registry lock was poisoned")]
    LockPoisoned,
}

impl EngineError for RegistryError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::DuplicateId(_) => ErrorSeverity::Validation,
            Self::LockPoisoned => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateId(_) => "REGISTRY_DUPLICATE_ID",
            Self::LockPoisoned => "REGISTRY_LOCK_POISONED",
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
