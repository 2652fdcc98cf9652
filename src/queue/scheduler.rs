//! Priority Scheduler - ordered holding area for not-yet-dispatched messages
//!
//! The scheduler keeps one bucket per priority level, each independently
//! locked, so producers touching different priorities don't contend and the
//! reaper can sweep one bucket while another is being drained. Within a
//! bucket messages are kept in a min-heap keyed by `(created_at, sequence)`,
//! which together with the bucket ordering yields the total drain order
//! `(priority ascending, created_at ascending, sequence ascending)`.
//!
//! This is a logical priority order, not a real-time guarantee: a sustained
//! stream of high-priority messages starves lower priorities indefinitely.
//! No aging mechanism is applied.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::SystemTime;

use tokio::sync::Notify;

use crate::queue::error::{QueueError, QueueResult};
use crate::queue::message::{Message, PRIORITY_LEVELS};

/// Heap entry. Reversed comparison turns the std max-heap into a min-heap
/// on `(created_at, sequence)`.
#[derive(Debug)]
struct SchedulerEntry {
    message: Message,
}

impl SchedulerEntry {
    fn key(&self) -> (SystemTime, u64) {
        (self.message.created_at, self.message.sequence)
    }
}

impl PartialEq for SchedulerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for SchedulerEntry {}

impl PartialOrd for SchedulerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for SchedulerEntry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // Reversed: the heap's "greatest" element is the oldest message
        other.key().cmp(&self.key())
    }
}

/// Concurrency-safe, capacity-bounded priority scheduler.
///
/// `enqueue` assigns a monotonic sequence number (starting from 1) and
/// signals the ready notifier so the collector can trigger an early batch
/// when enough messages accumulate. `drain` removes up to `max` messages
/// in priority order.
#[derive(Debug)]
pub struct PriorityScheduler {
    buckets: [Mutex<BinaryHeap<SchedulerEntry>>; PRIORITY_LEVELS],
    next_sequence: AtomicU64,
    len: AtomicUsize,
    capacity: usize,
    ready: Notify,
}

impl PriorityScheduler {
    pub fn new(capacity: usize) -> Self {
        Self {
            buckets: std::array::from_fn(|_| Mutex::new(BinaryHeap::new())),
            next_sequence: AtomicU64::new(1),
            len: AtomicUsize::new(0),
            capacity,
            ready: Notify::new(),
        }
    }

    /// Insert a message, assigning its sequence number.
    ///
    /// Returns `QueueFull` when the scheduler is at capacity - a
    /// backpressure signal to the producer, never a silent drop.
    pub fn enqueue(&self, mut message: Message) -> QueueResult<u64> {
        if self.len.load(Ordering::SeqCst) >= self.capacity {
            return Err(QueueError::QueueFull {
                capacity: self.capacity,
            });
        }

        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        message.sequence = sequence;
        self.insert(message);
        Ok(sequence)
    }

    /// Re-insert a message that is coming back from the retry path.
    ///
    /// Keeps the original sequence number so the message drains in its
    /// original position among equal-priority peers, and bypasses the
    /// capacity check: backpressure applies to new work only.
    pub(crate) fn requeue(&self, message: Message) {
        self.insert(message);
    }

    fn insert(&self, message: Message) {
        {
            let mut bucket = self.buckets[message.priority.bucket()].lock().unwrap();
            bucket.push(SchedulerEntry { message });
        }
        self.len.fetch_add(1, Ordering::SeqCst);
        self.ready.notify_one();
    }

    /// Remove up to `max_count` messages in total drain order.
    pub fn drain(&self, max_count: usize) -> Vec<Message> {
        if max_count == 0 {
            return Vec::new();
        }

        let mut drained = Vec::new();
        for bucket in &self.buckets {
            if drained.len() >= max_count {
                break;
            }
            let mut bucket = bucket.lock().unwrap();
            while drained.len() < max_count {
                match bucket.pop() {
                    Some(entry) => drained.push(entry.message),
                    None => break,
                }
            }
        }

        self.len.fetch_sub(drained.len(), Ordering::SeqCst);
        drained
    }

    /// Remove and return every message whose deadline has passed at `now`.
    ///
    /// Each bucket is swept under its own lock; unexpired entries keep
    /// their heap order.
    pub(crate) fn remove_expired(&self, now: SystemTime) -> Vec<Message> {
        let mut expired = Vec::new();
        for bucket in &self.buckets {
            let mut bucket = bucket.lock().unwrap();
            if bucket.is_empty() {
                continue;
            }
            let entries = std::mem::take(&mut *bucket);
            for entry in entries {
                if entry.message.expired_at(now) {
                    expired.push(entry.message);
                } else {
                    bucket.push(entry);
                }
            }
        }
        self.len.fetch_sub(expired.len(), Ordering::SeqCst);
        expired
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resolves after the next enqueue. Used by the collector's size
    /// trigger; a spurious wake is harmless since the caller re-checks
    /// `len()`.
    pub(crate) async fn ready(&self) {
        self.ready.notified().await;
    }
}
