//! Structured error taxonomy for the analysis path.
//!
//! Repositories and API clients return `anyhow::Result` (matching the
//! rest of the codebase); the orchestrator is the only place that needs
//! to distinguish error kinds for callers, so it is the only place that
//! deals in `AnalysisError`.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum AnalysisError {
    #[error("invalid input: {message}")]
    Input { message: String },

    #[error("storage error: {message}")]
    Storage { message: String, transient: bool },

    #[error("upstream error ({source}): {message}")]
    Upstream { source: String, message: String },

    #[error("forecast model unavailable: {message}")]
    ModelUnavailable { message: String },

    #[error("request timed out: {message}")]
    Timeout { message: String },
}

impl AnalysisError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input { message: message.into() }
    }

    pub fn storage(message: impl Into<String>, transient: bool) -> Self {
        Self::Storage { message: message.into(), transient }
    }

    /// Builds a `Storage` error from a `Storage`-trait call failure,
    /// reading `transient` off whether `db::with_retry` actually
    /// exhausted its attempts rather than assuming either way.
    pub fn from_storage_error(err: anyhow::Error) -> Self {
        let transient = !crate::db::retries_exhausted(&err);
        Self::Storage { message: err.to_string(), transient }
    }

    pub fn upstream(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream { source: source.into(), message: message.into() }
    }

    pub fn model_unavailable(message: impl Into<String>) -> Self {
        Self::ModelUnavailable { message: message.into() }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout { message: message.into() }
    }

    /// True for the error kinds the orchestrator must surface to the
    /// caller rather than degrade around.
    pub fn is_surfaced(&self) -> bool {
        match self {
            AnalysisError::Input { .. } => true,
            AnalysisError::Storage { transient, .. } => !transient,
            AnalysisError::Timeout { .. } => true,
            AnalysisError::Upstream { .. } | AnalysisError::ModelUnavailable { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_after_exhausted_retries_is_permanent_and_surfaced() {
        let retry_err = crate::db::RetriesExhausted { source: anyhow::anyhow!("connection refused") };
        let err = AnalysisError::from_storage_error(anyhow::Error::new(retry_err));
        match &err {
            AnalysisError::Storage { transient, .. } => assert!(!transient),
            other => panic!("expected Storage, got {other:?}"),
        }
        assert!(err.is_surfaced());
    }

    #[test]
    fn storage_error_without_an_exhausted_marker_is_treated_as_transient() {
        let err = AnalysisError::from_storage_error(anyhow::anyhow!("one-off failure"));
        match &err {
            AnalysisError::Storage { transient, .. } => assert!(transient),
            other => panic!("expected Storage, got {other:?}"),
        }
        assert!(!err.is_surfaced());
    }

    #[test]
    fn input_and_timeout_are_always_surfaced() {
        assert!(AnalysisError::input("bad").is_surfaced());
        assert!(AnalysisError::timeout("too slow").is_surfaced());
    }

    #[test]
    fn upstream_and_model_unavailable_never_surface() {
        assert!(!AnalysisError::upstream("holiday-api", "rate limited").is_surfaced());
        assert!(!AnalysisError::model_unavailable("no rows").is_surfaced());
    }
}
