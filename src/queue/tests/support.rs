//! Shared fixtures for the queue engine test suites

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::queue::api::{Message, MessageConsumer, MessagePriority, ProcessingError, QueueConfig};

/// Engine configuration tuned for fast tests: millisecond backoff units,
/// tight collection ticks.
pub(crate) fn fast_config() -> QueueConfig {
    QueueConfig {
        batch_timeout_ms: 20,
        reap_interval_ms: 20,
        backoff_unit_ms: 1,
        ..QueueConfig::default()
    }
}

/// A record of one successful processing call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProcessedMessage {
    pub id: String,
    pub retry_count: u32,
}

/// Deterministic scripted consumer: fails a fixed number of leading
/// attempts, then succeeds forever. Records every success and counts every
/// attempt.
pub(crate) struct ScriptedConsumer {
    id: String,
    priorities: Vec<MessagePriority>,
    failures_remaining: AtomicU32,
    attempts: AtomicU32,
    processed: Mutex<Vec<ProcessedMessage>>,
    process_delay: Duration,
}

impl ScriptedConsumer {
    pub(crate) fn new(id: &str, priorities: &[MessagePriority]) -> Arc<Self> {
        Self::failing_first(id, priorities, 0)
    }

    pub(crate) fn failing_first(
        id: &str,
        priorities: &[MessagePriority],
        failures: u32,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            priorities: priorities.to_vec(),
            failures_remaining: AtomicU32::new(failures),
            attempts: AtomicU32::new(0),
            processed: Mutex::new(Vec::new()),
            process_delay: Duration::ZERO,
        })
    }

    pub(crate) fn always_failing(id: &str, priorities: &[MessagePriority]) -> Arc<Self> {
        Self::failing_first(id, priorities, u32::MAX)
    }

    pub(crate) fn slow(id: &str, priorities: &[MessagePriority], delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            priorities: priorities.to_vec(),
            failures_remaining: AtomicU32::new(0),
            attempts: AtomicU32::new(0),
            processed: Mutex::new(Vec::new()),
            process_delay: delay,
        })
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn processed(&self) -> Vec<ProcessedMessage> {
        self.processed.lock().unwrap().clone()
    }

    pub(crate) fn processed_ids(&self) -> Vec<String> {
        self.processed().into_iter().map(|p| p.id).collect()
    }
}

#[async_trait]
impl MessageConsumer for ScriptedConsumer {
    async fn process_message(&self, message: &Message) -> Result<(), ProcessingError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.process_delay > Duration::ZERO {
            tokio::time::sleep(self.process_delay).await;
        }

        if self.failures_remaining.load(Ordering::SeqCst) > 0 {
            self.failures_remaining.fetch_sub(1, Ordering::SeqCst);
            return Err(ProcessingError::new("scripted failure"));
        }

        self.processed.lock().unwrap().push(ProcessedMessage {
            id: message.id.clone(),
            retry_count: message.retry_count(),
        });
        Ok(())
    }

    fn consumer_id(&self) -> &str {
        &self.id
    }

    fn supported_priorities(&self) -> &[MessagePriority] {
        &self.priorities
    }
}

/// Poll `condition` until it holds or the deadline passes. Returns the
/// final evaluation.
pub(crate) async fn wait_for(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
