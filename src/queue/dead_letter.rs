//! Dead-Letter Sink - terminal storage for undeliverable messages
//!
//! Every message that leaves the engine without being successfully consumed
//! ends up here with a reason attached; nothing exits silently. Entries are
//! never purged by the engine itself - inspection and replay are operator
//! concerns.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

use crate::notifications::api::{DeadLetterEvent, Event, NotificationManager};
use crate::queue::message::Message;

/// Why a message was dead-lettered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum DeadLetterReason {
    /// TTL elapsed before delivery
    Expired,
    /// Processing failed more than the configured retry budget allows
    MaxRetriesExceeded,
    /// No registered consumer supports the message's priority
    NoEligibleConsumer,
}

/// A terminally failed message together with its failure reason.
#[derive(Debug, Clone)]
pub struct DeadLetterEntry {
    pub message: Message,
    pub reason: DeadLetterReason,
    pub recorded_at: SystemTime,
}

/// Append-only, thread-safe collection of dead-lettered messages.
pub struct DeadLetterSink {
    entries: Mutex<VecDeque<DeadLetterEntry>>,
    reasons: Mutex<HashMap<DeadLetterReason, u64>>,
    total_recorded: AtomicU64,
    notifications: Arc<NotificationManager>,
}

impl DeadLetterSink {
    pub fn new(notifications: Arc<NotificationManager>) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            reasons: Mutex::new(HashMap::new()),
            total_recorded: AtomicU64::new(0),
            notifications,
        }
    }

    /// Record a terminally failed message.
    pub fn record(&self, message: Message, reason: DeadLetterReason) {
        log::warn!(
            "Message moved to dead-letter sink: {} (reason: {})",
            message.id,
            reason
        );

        let event = Event::DeadLetter(DeadLetterEvent::new(message.id.clone(), reason));

        {
            let mut entries = self.entries.lock().unwrap();
            entries.push_back(DeadLetterEntry {
                message,
                reason,
                recorded_at: SystemTime::now(),
            });
        }
        *self.reasons.lock().unwrap().entry(reason).or_insert(0) += 1;
        self.total_recorded.fetch_add(1, Ordering::SeqCst);

        if let Err(e) = self.notifications.publish(event) {
            log::debug!("Dead-letter event not delivered: {e}");
        }
    }

    /// Remove and return the oldest entry (FIFO).
    pub fn poll(&self) -> Option<DeadLetterEntry> {
        self.entries.lock().unwrap().pop_front()
    }

    /// Number of entries currently held.
    pub fn size(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Monotonic count of everything ever recorded, unaffected by `poll`.
    pub fn total_recorded(&self) -> u64 {
        self.total_recorded.load(Ordering::SeqCst)
    }

    /// Count per reason, for diagnostics. Reasons never seen report zero.
    pub fn reason_histogram(&self) -> Vec<(DeadLetterReason, u64)> {
        let reasons = self.reasons.lock().unwrap();
        DeadLetterReason::iter()
            .map(|reason| (reason, reasons.get(&reason).copied().unwrap_or(0)))
            .collect()
    }
}
