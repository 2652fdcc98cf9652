//! Public API for the queue engine
//!
//! This module provides the complete public API for the priority queue
//! engine. External modules should import from here rather than directly
//! from internal modules. See the module documentation for architecture
//! details and usage examples.

// Engine facade
pub use crate::queue::manager::QueueManager;

// Message types
pub use crate::queue::message::{Message, MessageBatch, MessagePriority};

// Consumer contract and grouping
pub use crate::queue::consumer::MessageConsumer;
pub use crate::queue::group::{ConsumerGroup, ConsumerGroupRegistry};

// Terminal storage and diagnostics
pub use crate::queue::dead_letter::{DeadLetterEntry, DeadLetterReason};
pub use crate::queue::metrics::StatsSnapshot;

// Configuration
pub use crate::queue::config::QueueConfig;

// Error handling
pub use crate::queue::error::{ProcessingError, QueueError, QueueResult};
