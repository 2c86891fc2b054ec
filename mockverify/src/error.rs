use std::sync::Arc;

/// The single error type for all mockverify operations.
///
/// Every fallible API returns `mockverify::Result<T>` (alias for
/// `Result<T, mockverify::Error>`). An unsatisfied verification is *not* an
/// error: it is delivered as failure text through the verification handle.
/// Errors are reserved for malformed input and for the scheduler's lifecycle.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("invalid {field} matcher '{pattern}': {reason}")]
    InvalidMatcher {
        field: &'static str,
        pattern: String,
        reason: String,
    },

    #[error("Scheduler has been shut down")]
    SchedulerShutdown,

    #[error("Retry task failed: {0}")]
    TaskFailed(String),

    #[error("Verification cancelled before completion")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[source] Arc<std::io::Error>),

    #[error("Failed to render request: {0}")]
    Serialization(#[source] Arc<serde_json::Error>),
}

impl Error {
    pub(crate) fn invalid_matcher(
        field: &'static str,
        pattern: &str,
        reason: impl std::fmt::Display,
    ) -> Self {
        Error::InvalidMatcher {
            field,
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::InvalidMatcher {
                    field: f1,
                    pattern: p1,
                    ..
                },
                Self::InvalidMatcher {
                    field: f2,
                    pattern: p2,
                    ..
                },
            ) => f1 == f2 && p1 == p2,
            (Self::SchedulerShutdown, Self::SchedulerShutdown) => true,
            (Self::TaskFailed(a), Self::TaskFailed(b)) => a == b,
            (Self::Cancelled, Self::Cancelled) => true,
            (Self::IoError(a), Self::IoError(b)) => Arc::ptr_eq(a, b),
            (Self::Serialization(a), Self::Serialization(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(Arc::new(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(Arc::new(e))
    }
}
