//! Queue Error Types

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Queue is full (capacity: {capacity})")]
    QueueFull { capacity: usize },

    #[error("Message expired before enqueue: {id}")]
    MessageExpired { id: String },

    #[error("Consumer group not found: {group_id}")]
    GroupNotFound { group_id: String },

    #[error("Consumer group already exists: {group_id}")]
    GroupAlreadyExists { group_id: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Queue engine is shutting down")]
    ShuttingDown,
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Failure reported by a consumer's processing operation.
///
/// Consumers return this to signal that a message could not be processed;
/// the engine decides whether to retry or dead-letter. The reason is only
/// used for logging, never for routing decisions.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Processing failed: {reason}")]
pub struct ProcessingError {
    pub reason: String,
}

impl ProcessingError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
