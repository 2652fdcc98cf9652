//! Batch Collector - dual-trigger drain and dispatch fan-out
//!
//! Drains a bounded slice of ready messages either on a fixed period or as
//! soon as a full batch accumulates, whichever comes first. Each drained
//! batch is partitioned by priority and every partition dispatches as its
//! own task, bounded by a shared worker semaphore, so a slow partition in
//! one priority class never blocks another class.

use std::sync::Arc;

use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;

use crate::queue::config::QueueConfig;
use crate::queue::dead_letter::{DeadLetterReason, DeadLetterSink};
use crate::queue::group::ConsumerGroupRegistry;
use crate::queue::message::{Message, MessageBatch, MessagePriority};
use crate::queue::metrics::MetricsRecorder;
use crate::queue::retry::RetryCoordinator;
use crate::queue::scheduler::PriorityScheduler;

pub(crate) struct BatchCollector {
    scheduler: Arc<PriorityScheduler>,
    registry: Arc<ConsumerGroupRegistry>,
    dead_letters: Arc<DeadLetterSink>,
    metrics: Arc<MetricsRecorder>,
    retry: Arc<RetryCoordinator>,
    workers: Arc<Semaphore>,
    config: QueueConfig,
}

impl BatchCollector {
    pub(crate) fn new(
        scheduler: Arc<PriorityScheduler>,
        registry: Arc<ConsumerGroupRegistry>,
        dead_letters: Arc<DeadLetterSink>,
        metrics: Arc<MetricsRecorder>,
        retry: Arc<RetryCoordinator>,
        config: QueueConfig,
    ) -> Self {
        Self {
            scheduler,
            registry,
            dead_letters,
            metrics,
            retry,
            workers: Arc::new(Semaphore::new(config.dispatch_workers)),
            config,
        }
    }

    /// Collection loop. On shutdown, stops pulling new batches and drains
    /// the in-flight dispatch tasks before returning.
    pub(crate) async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.batch_timeout());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut dispatches: JoinSet<()> = JoinSet::new();

        log::debug!(
            "Batch collector started (batch_size: {}, timeout: {:?})",
            self.config.batch_size,
            self.config.batch_timeout()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.collect_once(&mut dispatches);
                }
                _ = self.scheduler.ready() => {
                    // Size trigger: only collect early on a full batch
                    if self.scheduler.len() >= self.config.batch_size {
                        self.collect_once(&mut dispatches);
                        ticker.reset();
                    }
                }
                _ = shutdown.changed() => break,
            }

            // Reap completed dispatch tasks so the set doesn't grow unbounded
            while dispatches.try_join_next().is_some() {}
        }

        // Bounded drain: let in-flight dispatches finish
        while dispatches.join_next().await.is_some() {}
        log::debug!("Batch collector stopped");
    }

    /// Drain one batch and fan out its priority partitions. Empty drains
    /// are a no-op and don't count as a batch.
    pub(crate) fn collect_once(self: &Arc<Self>, dispatches: &mut JoinSet<()>) {
        let drained = self.scheduler.drain(self.config.batch_size);
        if drained.is_empty() {
            return;
        }

        let batch = MessageBatch::new(drained);
        self.metrics.record_batch();
        log::debug!("Collected batch {} ({} messages)", batch.batch_id, batch.len());

        for (priority, messages) in batch.partition_by_priority() {
            let collector = Arc::clone(self);
            dispatches.spawn(async move {
                // Bound dispatch concurrency; a closed semaphore only
                // happens at teardown, where skipping is correct.
                let Ok(_permit) = collector.workers.acquire().await else {
                    return;
                };
                collector.dispatch_partition(priority, messages).await;
            });
        }
    }

    /// Dispatch one priority partition sequentially.
    async fn dispatch_partition(&self, priority: MessagePriority, messages: Vec<Message>) {
        for message in messages {
            // Expiry could have passed between draw and dispatch; an
            // expired message is never handed to a consumer.
            if message.is_expired() {
                self.dead_letters.record(message, DeadLetterReason::Expired);
                continue;
            }

            let Some(consumer) = self.registry.select_for_priority(priority) else {
                self.dead_letters
                    .record(message, DeadLetterReason::NoEligibleConsumer);
                continue;
            };

            match consumer.process_message(&message).await {
                Ok(()) => {
                    self.metrics.record_consumed();
                }
                Err(e) => {
                    log::debug!(
                        "Consumer {} failed on message {}: {e}",
                        consumer.consumer_id(),
                        message.id
                    );
                    self.retry.handle_failure(message);
                }
            }
        }
    }
}
