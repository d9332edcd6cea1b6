use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("index {index} out of range for {len} segments")]
    OutOfRange { index: usize, len: usize },

    /// No async runtime is available to drive the ticker.
    #[error("tick scheduler unavailable: {0}")]
    SchedulerUnavailable(String),
}

impl TimelineError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
