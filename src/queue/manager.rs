//! QueueManager - the explicitly owned queue engine instance
//!
//! The manager wires the scheduler, reaper, collector, retry coordinator,
//! consumer-group registry, dead-letter sink and metrics together and is
//! the single handle producers and operators interact with. There is no
//! process-wide instance: construct one, share it as `Arc<QueueManager>`,
//! and every collaborator receives the handle explicitly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::notifications::api::{
    Event, EventFilter, EventReceiver, NotificationManager, QueueEvent, QueueEventType,
};
use crate::queue::collector::BatchCollector;
use crate::queue::config::QueueConfig;
use crate::queue::consumer::MessageConsumer;
use crate::queue::dead_letter::{DeadLetterEntry, DeadLetterReason, DeadLetterSink};
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::group::ConsumerGroupRegistry;
use crate::queue::message::{Message, MessagePriority};
use crate::queue::metrics::{MetricsRecorder, StatsSnapshot};
use crate::queue::reaper::ExpiryReaper;
use crate::queue::retry::RetryCoordinator;
use crate::queue::scheduler::PriorityScheduler;

/// Priority queue engine.
///
/// # Thread Safety
///
/// Fully thread-safe behind `Arc<QueueManager>`. Producers call `produce`
/// concurrently from any number of tasks or threads; the background
/// collector and reaper run as tokio tasks started by [`QueueManager::start`].
///
/// # Example
///
/// ```rust,no_run
/// use relayq::queue::{Message, MessagePriority, QueueConfig, QueueManager};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = QueueManager::new(QueueConfig::default())?;
/// manager.start();
///
/// manager.create_consumer_group("workers")?;
/// // manager.add_consumer("workers", my_consumer)?;
///
/// let sequence = manager.produce(manager.new_message("hello", MessagePriority::Normal))?;
/// println!("queued with sequence {sequence}");
///
/// manager.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct QueueManager {
    config: QueueConfig,
    scheduler: Arc<PriorityScheduler>,
    registry: Arc<ConsumerGroupRegistry>,
    dead_letters: Arc<DeadLetterSink>,
    metrics: Arc<MetricsRecorder>,
    notifications: Arc<NotificationManager>,
    collector: Arc<BatchCollector>,
    reaper: Arc<ExpiryReaper>,
    shutdown_tx: watch::Sender<bool>,
    background_tasks: Mutex<Vec<JoinHandle<()>>>,
    accepting: AtomicBool,
}

impl QueueManager {
    /// Build an engine. Background tasks don't run until
    /// [`QueueManager::start`] is called, so event subscribers can attach
    /// first.
    pub fn new(config: QueueConfig) -> QueueResult<Arc<Self>> {
        config.validate()?;

        let notifications = Arc::new(NotificationManager::new());
        let scheduler = Arc::new(PriorityScheduler::new(config.capacity));
        let registry = Arc::new(ConsumerGroupRegistry::new());
        let dead_letters = Arc::new(DeadLetterSink::new(Arc::clone(&notifications)));
        let metrics = Arc::new(MetricsRecorder::new());

        let retry = Arc::new(RetryCoordinator::new(
            Arc::clone(&scheduler),
            Arc::clone(&dead_letters),
            Arc::clone(&metrics),
            config.clone(),
        ));
        let collector = Arc::new(BatchCollector::new(
            Arc::clone(&scheduler),
            Arc::clone(&registry),
            Arc::clone(&dead_letters),
            Arc::clone(&metrics),
            retry,
            config.clone(),
        ));
        let reaper = Arc::new(ExpiryReaper::new(
            Arc::clone(&scheduler),
            Arc::clone(&dead_letters),
            config.reap_interval(),
        ));

        let (shutdown_tx, _) = watch::channel(false);

        Ok(Arc::new(Self {
            config,
            scheduler,
            registry,
            dead_letters,
            metrics,
            notifications,
            collector,
            reaper,
            shutdown_tx,
            background_tasks: Mutex::new(Vec::new()),
            accepting: AtomicBool::new(true),
        }))
    }

    /// Spawn the collector and reaper tasks. Idempotent.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self: &Arc<Self>) {
        let mut tasks = self.background_tasks.lock().unwrap();
        if !tasks.is_empty() {
            return; // already running
        }

        tasks.push(tokio::spawn(
            Arc::clone(&self.collector).run(self.shutdown_tx.subscribe()),
        ));
        tasks.push(tokio::spawn(
            Arc::clone(&self.reaper).run(self.shutdown_tx.subscribe()),
        ));

        log::info!("Queue engine '{}' started", self.config.name);
        self.publish_event(Event::Queue(QueueEvent::new(
            QueueEventType::Started,
            self.config.name.clone(),
        )));
    }

    /// Create a message carrying this engine's default TTL.
    pub fn new_message(
        &self,
        payload: impl Into<String>,
        priority: MessagePriority,
    ) -> Message {
        Message::new(payload, priority).with_ttl(self.config.default_ttl())
    }

    /// Enqueue one message; returns its scheduler sequence.
    ///
    /// `QueueFull` is the backpressure signal - whether to retry, drop or
    /// block is the producer's policy. A message already past its deadline
    /// is dead-lettered immediately and reported as `MessageExpired`.
    pub fn produce(&self, message: Message) -> QueueResult<u64> {
        if !self.accepting.load(Ordering::SeqCst) {
            return Err(QueueError::ShuttingDown);
        }

        if message.is_expired() {
            let id = message.id.clone();
            self.dead_letters.record(message, DeadLetterReason::Expired);
            return Err(QueueError::MessageExpired { id });
        }

        let priority = message.priority;
        match self.scheduler.enqueue(message) {
            Ok(sequence) => {
                self.metrics.record_produced(priority);
                Ok(sequence)
            }
            Err(e) => {
                if matches!(e, QueueError::QueueFull { .. }) {
                    log::warn!("Queue '{}' is full", self.config.name);
                    self.publish_event(Event::Queue(QueueEvent::with_size(
                        QueueEventType::Full,
                        self.config.name.clone(),
                        self.scheduler.capacity(),
                    )));
                }
                Err(e)
            }
        }
    }

    /// Convenience wrapper over repeated `produce`; returns the number of
    /// messages accepted. Per-message failures are absorbed: full-queue
    /// rejections are logged, already-expired messages are dead-lettered.
    pub fn produce_batch(&self, messages: Vec<Message>) -> usize {
        let mut accepted = 0;
        for message in messages {
            match self.produce(message) {
                Ok(_) => accepted += 1,
                Err(e) => log::debug!("Batch produce dropped a message: {e}"),
            }
        }
        accepted
    }

    // Consumer group management

    pub fn create_consumer_group(&self, group_id: impl Into<String>) -> QueueResult<()> {
        self.registry.create_group(group_id)
    }

    pub fn add_consumer(
        &self,
        group_id: &str,
        consumer: Arc<dyn MessageConsumer>,
    ) -> QueueResult<()> {
        self.registry.add_consumer(group_id, consumer)
    }

    pub fn remove_consumer(&self, group_id: &str, consumer_id: &str) -> QueueResult<()> {
        self.registry.remove_consumer(group_id, consumer_id)
    }

    // Monitoring surface

    pub fn queue_size(&self) -> usize {
        self.scheduler.len()
    }

    pub fn total_produced(&self) -> u64 {
        self.metrics.total_produced()
    }

    pub fn total_consumed(&self) -> u64 {
        self.metrics.total_consumed()
    }

    pub fn dead_letter_size(&self) -> usize {
        self.dead_letters.size()
    }

    /// Remove and return the oldest dead-letter entry, for operator-driven
    /// inspection or replay.
    pub fn poll_dead_letter(&self) -> Option<DeadLetterEntry> {
        self.dead_letters.poll()
    }

    pub fn dead_letter_reasons(&self) -> Vec<(DeadLetterReason, u64)> {
        self.dead_letters.reason_histogram()
    }

    /// Assemble a point-in-time stats snapshot; its `Display` impl is the
    /// printable summary.
    pub fn stats(&self) -> StatsSnapshot {
        let mut consumer_dispatch_counts: Vec<(String, u64)> =
            self.registry.dispatch_counts().into_iter().collect();
        consumer_dispatch_counts.sort();

        StatsSnapshot {
            queue_name: self.config.name.clone(),
            captured_at: std::time::SystemTime::now(),
            queue_size: self.queue_size(),
            total_produced: self.metrics.total_produced(),
            total_consumed: self.metrics.total_consumed(),
            total_batches: self.metrics.total_batches(),
            total_retries: self.metrics.total_retries(),
            produced_by_priority: self.metrics.produced_by_priority(),
            consumer_dispatch_counts,
            dead_letter_size: self.dead_letter_size(),
            dead_letter_reasons: self.dead_letter_reasons(),
        }
    }

    /// Subscribe to engine events.
    pub fn subscribe_events(
        &self,
        subscriber_id: impl Into<String>,
        filter: EventFilter,
    ) -> EventReceiver {
        self.notifications
            .subscribe(subscriber_id, filter, self.config.name.clone())
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Graceful shutdown: stop accepting produces, signal the periodic
    /// tasks, and wait for in-flight dispatches to finish.
    ///
    /// Idempotent - a second call is a no-op.
    pub async fn shutdown(&self) -> QueueResult<()> {
        let first_call = self.accepting.swap(false, Ordering::SeqCst);
        if first_call {
            log::info!("Queue engine '{}' shutting down", self.config.name);
        }

        let _ = self.shutdown_tx.send(true);

        let tasks: Vec<JoinHandle<()>> = {
            let mut guard = self.background_tasks.lock().unwrap();
            guard.drain(..).collect()
        };
        for task in tasks {
            let _ = task.await;
        }

        if first_call {
            self.publish_event(Event::Queue(QueueEvent::new(
                QueueEventType::Shutdown,
                self.config.name.clone(),
            )));
            log::info!("Queue engine '{}' shutdown complete", self.config.name);
        }
        Ok(())
    }

    fn publish_event(&self, event: Event) {
        if let Err(e) = self.notifications.publish(event) {
            log::debug!("Event not delivered: {e}");
        }
    }
}
