//! Common error infrastructure for synergy-core.
//!
//! Domain-specific errors (`ChainError`, `BuildError`, `EffectError`) live next
//! to the types they validate. This module provides the shared severity
//! classification so the runtime can decide how loudly to report a failure.
//!
//! Registration fails fast and returns the error to the caller. Dispatch
//! fails soft: the failing rule is logged with its severity and error code and
//! the batch carries on.

/// How far a failure reaches inside the engine.
///
/// Dispatch never surfaces errors to the host, so severity only steers how a
/// failure is logged and whether the same event is worth dispatching again.
/// Load-time failures (building a rule, registering it) are always reported
/// back to the caller regardless of severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ErrorSeverity {
    /// The world was not ready; the next dispatch of the same event may run.
    ///
    /// Examples: not enough energy for an effect, storage briefly unwritable
    Recoverable,

    /// A rule or chain was declared wrongly and will fail the same way again.
    ///
    /// Examples: duplicate rule id, rule without effects, chain without root
    Validation,

    /// Engine bookkeeping is inconsistent; the failing rule is skipped.
    ///
    /// Examples: poisoned registry lock, unreadable persisted selection
    Internal,

    /// The engine should be switched off until restarted.
    Fatal,
}

impl ErrorSeverity {
    /// Whether dispatching the same event later could succeed.
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Whether the failure points at an engine defect rather than content or
    /// world state. Such failures are logged at error level.
    pub const fn needs_investigation(self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all engine errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity by whether re-dispatching could help
/// - Give every variant a stable `error_code` for tests and log filtering
pub trait EngineError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_labels_feed_log_fields() {
        let label: &str = ErrorSeverity::Recoverable.as_ref();
        assert_eq!(label, "recoverable");
        assert_eq!(ErrorSeverity::Fatal.to_string(), "fatal");
        assert!(ErrorSeverity::Recoverable.is_retryable());
        assert!(!ErrorSeverity::Validation.is_retryable());
        assert!(ErrorSeverity::Internal.needs_investigation());
        assert!(!ErrorSeverity::Validation.needs_investigation());
    }
}
