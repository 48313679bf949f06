//! Backend failure taxonomy for the fallback chains.

use thiserror::Error;

/// Failure of a single backend tier.
///
/// Every variant means the same thing to a chain: advance to the next tier.
/// None of these escapes the documentation selector or the speech
/// synthesizer; the only client-visible failure is a malformed request,
/// which the HTTP boundary rejects before either chain runs.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Dependency or model not installed, not loaded, or not reachable.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Call exceeded its time bound. Abandoned, never retried.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Backend failed during inference or produced an unusable payload.
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl BackendError {
    /// Classify a reqwest error the way the chains care about it:
    /// connection refused means the backend is not there, a timeout means
    /// it was too slow, everything else is a runtime failure.
    pub fn from_http(context: &str, e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(format!("{context}: {e}"))
        } else if e.is_connect() {
            Self::Unavailable(format!("{context}: {e}"))
        } else {
            Self::Runtime(format!("{context}: {e}"))
        }
    }
}
