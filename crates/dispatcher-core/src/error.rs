use thiserror::Error;

/// Rejected lifecycle operations.
///
/// None of these mutate the store. Persistence failures are not in here:
/// they are logged and counted by the dispatcher, the operation itself
/// still reports its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("worker identity must not be empty")]
    EmptyWorker,

    #[error("task pattern must not be empty")]
    EmptyPattern,

    /// Unknown pattern, another worker's claim, or not Processing.
    #[error("task not found or not assigned to you")]
    NotFoundOrNotOwned { pattern: String, worker: String },

    #[error("no task assigned to worker {0}")]
    NoActiveClaim(String),
}

impl DispatchError {
    /// Malformed input, as opposed to an expected "nothing matched".
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, DispatchError::EmptyWorker | DispatchError::EmptyPattern)
    }
}
