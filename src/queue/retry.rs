//! Retry Coordinator - failure path for dispatched messages
//!
//! On a processing failure the retry counter is bumped and the message is
//! either re-inserted into the scheduler after an exponential backoff
//! delay, or dead-lettered once the retry budget is spent. The delay runs
//! as a detached timer task so no dispatch worker sits idle waiting.

use std::sync::Arc;

use crate::queue::config::QueueConfig;
use crate::queue::dead_letter::{DeadLetterReason, DeadLetterSink};
use crate::queue::message::Message;
use crate::queue::metrics::MetricsRecorder;
use crate::queue::scheduler::PriorityScheduler;

pub struct RetryCoordinator {
    scheduler: Arc<PriorityScheduler>,
    dead_letters: Arc<DeadLetterSink>,
    metrics: Arc<MetricsRecorder>,
    config: QueueConfig,
}

impl RetryCoordinator {
    pub fn new(
        scheduler: Arc<PriorityScheduler>,
        dead_letters: Arc<DeadLetterSink>,
        metrics: Arc<MetricsRecorder>,
        config: QueueConfig,
    ) -> Self {
        Self {
            scheduler,
            dead_letters,
            metrics,
            config,
        }
    }

    /// Handle one processing failure.
    ///
    /// Must run inside a tokio runtime; the requeue timer is spawned as a
    /// detached task. A message found expired here takes the expiry path
    /// instead of being requeued.
    pub fn handle_failure(&self, mut message: Message) {
        let retries = message.increment_retry_count();

        if message.is_expired() {
            self.dead_letters.record(message, DeadLetterReason::Expired);
            return;
        }

        if retries > self.config.max_retries {
            self.dead_letters
                .record(message, DeadLetterReason::MaxRetriesExceeded);
            return;
        }

        let delay = self.config.backoff_delay(retries);
        log::debug!(
            "Requeueing message {} in {:?} (retry {}/{})",
            message.id,
            delay,
            retries,
            self.config.max_retries
        );
        self.metrics.record_retry();

        let scheduler = Arc::clone(&self.scheduler);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            scheduler.requeue(message);
        });
    }
}
