//! Error types for the prompt engine and its store.

use super::record::PromptId;

/// Result type alias for prompt engine operations.
pub type Result<T> = std::result::Result<T, PromptError>;

/// Failures of a [`PromptStore`](super::store::PromptStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to read the prompts file.
    #[error("failed to read prompts file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// Failed to write or replace the prompts file.
    #[error("failed to write prompts file '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    /// Failed to serialize the collection.
    #[error("failed to serialize prompts: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Store-specific failure (used by non-file stores).
    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by [`PromptEngine`](super::engine::PromptEngine) operations.
///
/// Every variant except [`PromptError::Persistence`] means the operation was
/// rejected and nothing changed.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    /// A required field was empty.
    #[error("{operation}: {field} must not be empty")]
    Validation {
        operation: &'static str,
        field: &'static str,
    },

    /// No record has this id.
    #[error("{operation}: no prompt with id '{id}'")]
    NotFound {
        operation: &'static str,
        id: PromptId,
    },

    /// Pinning would exceed the pin quota.
    #[error("pin: cannot pin '{id}', already {limit} pinned prompts")]
    PinQuotaExceeded { id: PromptId, limit: usize },

    /// The operation does not apply to this record.
    #[error("{operation}: prompt '{id}' {reason}")]
    InvalidOperation {
        operation: &'static str,
        id: PromptId,
        reason: &'static str,
    },

    /// Target position is outside the list order.
    #[error("{operation}: position {requested} for '{id}' is out of range (0..{len})")]
    OutOfRange {
        operation: &'static str,
        id: PromptId,
        requested: usize,
        len: usize,
    },

    /// The change was applied in memory but could not be saved.
    #[error("{operation}: change applied but not saved: {source}")]
    Persistence {
        operation: &'static str,
        source: StoreError,
    },
}

impl PromptError {
    /// Whether the in-memory change went through despite the error.
    pub fn is_applied(&self) -> bool {
        matches!(self, PromptError::Persistence { .. })
    }
}
