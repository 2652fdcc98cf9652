//! Priority Message Queue Engine
//!
//! An in-process, at-least-once priority broker with batch dispatch,
//! consumer-group load balancing, retry with exponential backoff, TTL
//! expiry and dead-lettering.
//!
//! # Overview
//!
//! Producers hand messages to the engine; consumers register in named
//! groups and declare which priorities they handle. Key properties:
//!
//! - **Priority ordering**: messages drain by `(priority, created_at)`,
//!   most urgent first, FIFO within a priority level
//! - **Batch dispatch**: a dual size/time trigger drains bounded batches
//!   and dispatches each priority class independently
//! - **Load balancing**: round-robin across the eligible consumers of a
//!   group, with per-consumer dispatch counts
//! - **Self-healing**: failed messages retry with exponential backoff;
//!   exhausted, expired or unroutable messages are dead-lettered with a
//!   reason, never dropped silently
//! - **Backpressure**: a bounded scheduler reports `QueueFull` to
//!   producers instead of shedding load
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Producer A  │   │  Producer B  │   │  Producer C  │
//! └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!        │ produce          │ produce          │ produce
//!        ▼                  ▼                  ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                    QueueManager                     │
//! │  ┌───────────────────────────────┐                  │
//! │  │       PriorityScheduler       │◄── ExpiryReaper ─┼─► DeadLetterSink
//! │  │  [critical][high][normal]...  │                  │
//! │  └──────────────┬────────────────┘                  │
//! │                 │ drain(batch_size)                 │
//! │         BatchCollector ──► per-priority partitions  │
//! │                 │                                   │
//! │        ConsumerGroupRegistry (round-robin)          │
//! └─────────────────┼───────────────────────────────────┘
//!                   ▼
//!        Consumers (capability contract)
//!        failure ──► RetryCoordinator ──► backoff requeue │ DeadLetterSink
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use relayq::queue::{
//!     Message, MessageConsumer, MessagePriority, ProcessingError, QueueConfig, QueueManager,
//! };
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl MessageConsumer for Printer {
//!     async fn process_message(&self, message: &Message) -> Result<(), ProcessingError> {
//!         println!("{}", message.payload);
//!         Ok(())
//!     }
//!     fn consumer_id(&self) -> &str {
//!         "printer-1"
//!     }
//!     fn supported_priorities(&self) -> &[MessagePriority] {
//!         &[MessagePriority::Normal, MessagePriority::Low]
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = QueueManager::new(QueueConfig::default())?;
//! manager.start();
//! manager.create_consumer_group("printers")?;
//! manager.add_consumer("printers", Arc::new(Printer))?;
//!
//! manager.produce(manager.new_message("hello", MessagePriority::Normal))?;
//!
//! manager.shutdown().await?;
//! println!("{}", manager.stats());
//! # Ok(())
//! # }
//! ```

mod collector;
mod config;
mod consumer;
mod dead_letter;
mod error;
mod group;
mod manager;
mod message;
mod metrics;
mod reaper;
mod retry;
mod scheduler;

pub mod api;

pub use config::QueueConfig;
pub use consumer::MessageConsumer;
pub use dead_letter::{DeadLetterEntry, DeadLetterReason, DeadLetterSink};
pub use error::{ProcessingError, QueueError, QueueResult};
pub use group::{ConsumerGroup, ConsumerGroupRegistry};
pub use manager::QueueManager;
pub use message::{Message, MessageBatch, MessagePriority, PRIORITY_LEVELS};
pub use metrics::{MetricsRecorder, StatsSnapshot};
pub use reaper::ExpiryReaper;
pub use retry::RetryCoordinator;
pub use scheduler::PriorityScheduler;

#[cfg(test)]
mod tests;
