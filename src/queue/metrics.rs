//! Metrics Recorder - counters and the printable stats snapshot
//!
//! Purely observational: nothing here gates or alters a processing
//! decision. Per-consumer counts come from the group registry and
//! dead-letter figures from the sink; this module only owns the engine-wide
//! counters and the snapshot assembly.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use strum::IntoEnumIterator;

use crate::queue::dead_letter::DeadLetterReason;
use crate::queue::message::{MessagePriority, PRIORITY_LEVELS};

/// Thread-safe counters for the engine.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    produced: AtomicU64,
    consumed: AtomicU64,
    batches: AtomicU64,
    retries: AtomicU64,
    produced_by_priority: [AtomicU64; PRIORITY_LEVELS],
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_produced(&self, priority: MessagePriority) {
        self.produced.fetch_add(1, Ordering::SeqCst);
        self.produced_by_priority[priority.bucket()].fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_consumed(&self) {
        self.consumed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_batch(&self) {
        self.batches.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::SeqCst);
    }

    pub fn total_produced(&self) -> u64 {
        self.produced.load(Ordering::SeqCst)
    }

    pub fn total_consumed(&self) -> u64 {
        self.consumed.load(Ordering::SeqCst)
    }

    pub fn total_batches(&self) -> u64 {
        self.batches.load(Ordering::SeqCst)
    }

    pub fn total_retries(&self) -> u64 {
        self.retries.load(Ordering::SeqCst)
    }

    pub fn produced_by_priority(&self) -> Vec<(MessagePriority, u64)> {
        MessagePriority::iter()
            .map(|priority| {
                (
                    priority,
                    self.produced_by_priority[priority.bucket()].load(Ordering::SeqCst),
                )
            })
            .collect()
    }
}

/// Point-in-time view of the whole engine, assembled by the manager.
///
/// `Display` renders the operator-facing summary.
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub queue_name: String,
    pub captured_at: SystemTime,
    pub queue_size: usize,
    pub total_produced: u64,
    pub total_consumed: u64,
    pub total_batches: u64,
    pub total_retries: u64,
    pub produced_by_priority: Vec<(MessagePriority, u64)>,
    pub consumer_dispatch_counts: Vec<(String, u64)>,
    pub dead_letter_size: usize,
    pub dead_letter_reasons: Vec<(DeadLetterReason, u64)>,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let captured = chrono::DateTime::<chrono::Local>::from(self.captured_at);
        writeln!(
            f,
            "=== Queue Statistics: {} ({}) ===",
            self.queue_name,
            captured.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(f, "Queue size: {}", self.queue_size)?;
        writeln!(f, "Total produced: {}", self.total_produced)?;
        writeln!(f, "Total consumed: {}", self.total_consumed)?;
        writeln!(f, "Total batches: {}", self.total_batches)?;
        writeln!(f, "Total retries: {}", self.total_retries)?;
        writeln!(f, "Dead letters: {}", self.dead_letter_size)?;

        writeln!(f, "Priority distribution:")?;
        for (priority, count) in &self.produced_by_priority {
            writeln!(f, "  {priority}: {count}")?;
        }

        if !self.consumer_dispatch_counts.is_empty() {
            writeln!(f, "Consumer dispatch counts:")?;
            for (consumer_id, count) in &self.consumer_dispatch_counts {
                writeln!(f, "  {consumer_id}: {count}")?;
            }
        }

        if self.dead_letter_size > 0 {
            writeln!(f, "Dead-letter reasons:")?;
            for (reason, count) in &self.dead_letter_reasons {
                if *count > 0 {
                    writeln!(f, "  {reason}: {count}")?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_per_priority() {
        let metrics = MetricsRecorder::new();
        metrics.record_produced(MessagePriority::Critical);
        metrics.record_produced(MessagePriority::Critical);
        metrics.record_produced(MessagePriority::Low);
        metrics.record_consumed();
        metrics.record_batch();
        metrics.record_retry();

        assert_eq!(metrics.total_produced(), 3);
        assert_eq!(metrics.total_consumed(), 1);
        assert_eq!(metrics.total_batches(), 1);
        assert_eq!(metrics.total_retries(), 1);

        let by_priority = metrics.produced_by_priority();
        assert_eq!(by_priority.len(), PRIORITY_LEVELS);
        assert_eq!(by_priority[0], (MessagePriority::Critical, 2));
        assert_eq!(by_priority[3], (MessagePriority::Low, 1));
        assert_eq!(by_priority[4], (MessagePriority::Background, 0));
    }

    #[test]
    fn snapshot_renders_summary() {
        let snapshot = StatsSnapshot {
            queue_name: "orders".to_string(),
            captured_at: SystemTime::now(),
            queue_size: 4,
            total_produced: 10,
            total_consumed: 5,
            total_batches: 2,
            total_retries: 1,
            produced_by_priority: vec![(MessagePriority::Normal, 10)],
            consumer_dispatch_counts: vec![("worker-1".to_string(), 5)],
            dead_letter_size: 1,
            dead_letter_reasons: vec![(DeadLetterReason::Expired, 1)],
        };

        let rendered = snapshot.to_string();
        assert!(rendered.contains("Queue Statistics: orders"));
        assert!(rendered.contains("Total produced: 10"));
        assert!(rendered.contains("worker-1: 5"));
        assert!(rendered.contains("Expired: 1"));
    }
}
