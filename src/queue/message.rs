//! Message Types for the Priority Queue Engine
//!
//! This module defines the unit of work moving through the engine: a
//! priority-tagged, TTL-bounded message, plus the ephemeral batch structure
//! the collector hands to dispatch.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, SystemTime};

use strum_macros::{Display, EnumIter};
use uuid::Uuid;

/// Number of distinct priority levels.
pub const PRIORITY_LEVELS: usize = 5;

/// Ordinal urgency tag on a message. Lower level drains first.
///
/// The ordering derives from the declaration order, so `Critical` sorts
/// before `Background` and the scheduler can rely on `Ord` directly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter,
)]
pub enum MessagePriority {
    /// System alerts, payment notifications
    Critical = 1,
    /// Real-time messages, calls
    High = 2,
    /// Regular traffic
    Normal = 3,
    /// File transfers, media
    Low = 4,
    /// Analytics, logs
    Background = 5,
}

impl MessagePriority {
    /// Numeric level (1 = most urgent).
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Zero-based bucket index used by the scheduler.
    pub(crate) fn bucket(self) -> usize {
        self as usize - 1
    }
}

/// Immutable unit of work with priority, TTL and a retry counter.
///
/// The priority and the expiry deadline are fixed at creation. The retry
/// count starts at zero and only ever increases; it is mutated exclusively
/// by the retry path after a processing failure. The sequence number is
/// assigned by the scheduler on first enqueue and kept across retries so
/// equal-priority messages drain in their original insertion order.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use relayq::queue::{Message, MessagePriority};
///
/// let message = Message::new("payment confirmed", MessagePriority::Critical)
///     .with_ttl(Duration::from_secs(300))
///     .with_header("order", "12345");
/// assert_eq!(message.retry_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct Message {
    /// Opaque unique token
    pub id: String,
    /// Application-specific payload blob
    pub payload: String,
    pub priority: MessagePriority,
    /// Optional application metadata
    pub headers: HashMap<String, String>,
    pub created_at: SystemTime,
    /// Fixed at creation: `created_at + ttl`
    pub expires_at: SystemTime,
    retry_count: u32,
    pub(crate) sequence: u64,
}

impl Message {
    /// Default time-to-live for messages that don't choose one: 24 hours.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

    /// Create a message with a generated id and the default TTL.
    pub fn new(payload: impl Into<String>, priority: MessagePriority) -> Self {
        Self::with_id(Uuid::now_v7().to_string(), payload, priority)
    }

    /// Create a message with a caller-supplied id and the default TTL.
    pub fn with_id(
        id: impl Into<String>,
        payload: impl Into<String>,
        priority: MessagePriority,
    ) -> Self {
        let created_at = SystemTime::now();
        Self {
            id: id.into(),
            payload: payload.into(),
            priority,
            headers: HashMap::new(),
            created_at,
            expires_at: created_at + Self::DEFAULT_TTL,
            retry_count: 0,
            sequence: 0, // assigned by the scheduler
        }
    }

    /// Replace the TTL, keeping `created_at` as the anchor.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.expires_at = self.created_at + ttl;
        self
    }

    /// Attach a header entry.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Whether the expiry deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.expired_at(SystemTime::now())
    }

    /// Expiry check against an explicit clock reading, so one sweep uses a
    /// single consistent `now`.
    pub(crate) fn expired_at(&self, now: SystemTime) -> bool {
        now > self.expires_at
    }

    /// Number of failed processing attempts so far.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub(crate) fn increment_retry_count(&mut self) -> u32 {
        self.retry_count += 1;
        self.retry_count
    }

    /// Scheduler-assigned monotonic sequence number. Zero until enqueued.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Ephemeral group of messages drained together at one collection tick.
///
/// Batches are never persisted; they exist only between drain and dispatch.
#[derive(Debug)]
pub struct MessageBatch {
    pub batch_id: Uuid,
    pub created_at: SystemTime,
    messages: Vec<Message>,
}

impl MessageBatch {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            batch_id: Uuid::now_v7(),
            created_at: SystemTime::now(),
            messages,
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Split the batch into per-priority partitions, preserving the drain
    /// order within each partition. Partitions dispatch independently so
    /// priority classes don't head-of-line block each other.
    pub fn partition_by_priority(self) -> BTreeMap<MessagePriority, Vec<Message>> {
        let mut partitions: BTreeMap<MessagePriority, Vec<Message>> = BTreeMap::new();
        for message in self.messages {
            partitions.entry(message.priority).or_default().push(message);
        }
        partitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_ordering_follows_level() {
        assert!(MessagePriority::Critical < MessagePriority::High);
        assert!(MessagePriority::High < MessagePriority::Normal);
        assert!(MessagePriority::Low < MessagePriority::Background);
        assert_eq!(MessagePriority::Critical.level(), 1);
        assert_eq!(MessagePriority::Background.level(), 5);
    }

    #[test]
    fn message_expiry_is_anchored_to_creation() {
        let message = Message::new("data", MessagePriority::Normal);
        assert_eq!(message.expires_at, message.created_at + Message::DEFAULT_TTL);
        assert!(!message.is_expired());

        let short = Message::new("data", MessagePriority::Normal)
            .with_ttl(Duration::from_millis(1));
        assert_eq!(short.expires_at, short.created_at + Duration::from_millis(1));
    }

    #[test]
    fn headers_accumulate() {
        let message = Message::new("data", MessagePriority::Low)
            .with_header("source", "billing")
            .with_header("tenant", "acme");
        assert_eq!(message.headers.get("source").map(String::as_str), Some("billing"));
        assert_eq!(message.headers.len(), 2);
    }

    #[test]
    fn batch_partitions_preserve_order_within_priority() {
        let batch = MessageBatch::new(vec![
            Message::with_id("a", "1", MessagePriority::Normal),
            Message::with_id("b", "2", MessagePriority::Critical),
            Message::with_id("c", "3", MessagePriority::Normal),
        ]);
        assert_eq!(batch.len(), 3);

        let partitions = batch.partition_by_priority();
        let normal: Vec<_> = partitions[&MessagePriority::Normal]
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(normal, vec!["a", "c"]);
        assert_eq!(partitions[&MessagePriority::Critical].len(), 1);

        // BTreeMap iteration yields the most urgent partition first
        let first = partitions.keys().next().copied();
        assert_eq!(first, Some(MessagePriority::Critical));
    }
}
