//! Error types for benchmark setup and verification.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring or running a benchmark.
#[derive(Error, Debug)]
pub enum Error {
    /// A parameter would make the control loop or the statistics degenerate.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Data moved or sorted by the operation under test is wrong.
    #[error("verification failed: {0}")]
    Verification(String),

    /// The worker pool for the sort benchmark could not be built.
    #[error("thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::InvalidConfiguration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_cause() {
        let err = Error::config("target time must be positive");
        assert_eq!(
            err.to_string(),
            "invalid configuration: target time must be positive"
        );
    }
}
