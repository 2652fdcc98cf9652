//! Consumer groups and the group registry
//!
//! A consumer group is a named set of interchangeable consumers sharing
//! dispatch load. Selection filters the group down to consumers whose
//! declared priority set contains the requested priority, then picks the
//! next one round-robin. The registry holds groups in registration order
//! and is the dispatcher's single lookup point.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::queue::consumer::MessageConsumer;
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::message::MessagePriority;

/// Named set of capability-tagged consumers with round-robin selection.
pub struct ConsumerGroup {
    group_id: String,
    consumers: RwLock<Vec<Arc<dyn MessageConsumer>>>,
    round_robin: AtomicUsize,
    dispatch_counts: Mutex<HashMap<String, u64>>,
}

impl ConsumerGroup {
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            consumers: RwLock::new(Vec::new()),
            round_robin: AtomicUsize::new(0),
            dispatch_counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Add a consumer. Takes effect for subsequent selections only; an
    /// in-flight dispatch keeps the consumer it already selected.
    pub fn add_consumer(&self, consumer: Arc<dyn MessageConsumer>) {
        log::info!(
            "Added consumer {} to group {}",
            consumer.consumer_id(),
            self.group_id
        );
        self.dispatch_counts
            .lock()
            .unwrap()
            .insert(consumer.consumer_id().to_string(), 0);
        self.consumers.write().unwrap().push(consumer);
    }

    /// Remove a consumer by id, along with its dispatch counter.
    pub fn remove_consumer(&self, consumer_id: &str) {
        log::info!("Removed consumer {} from group {}", consumer_id, self.group_id);
        self.consumers
            .write()
            .unwrap()
            .retain(|c| c.consumer_id() != consumer_id);
        self.dispatch_counts.lock().unwrap().remove(consumer_id);
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers.read().unwrap().len()
    }

    /// Pick the next eligible consumer for `priority`, round-robin.
    ///
    /// The cursor increases monotonically and is taken modulo the eligible
    /// subset, so interleaved selections for different priorities share one
    /// rotation. Returns `None` when no consumer supports the priority.
    pub fn select_consumer(&self, priority: MessagePriority) -> Option<Arc<dyn MessageConsumer>> {
        let selected = {
            let consumers = self.consumers.read().unwrap();
            let eligible: Vec<&Arc<dyn MessageConsumer>> = consumers
                .iter()
                .filter(|c| c.supported_priorities().contains(&priority))
                .collect();

            if eligible.is_empty() {
                return None;
            }

            let index = self.round_robin.fetch_add(1, Ordering::SeqCst) % eligible.len();
            Arc::clone(eligible[index])
        };

        *self
            .dispatch_counts
            .lock()
            .unwrap()
            .entry(selected.consumer_id().to_string())
            .or_insert(0) += 1;

        Some(selected)
    }

    /// Per-consumer dispatched counts.
    pub fn dispatch_counts(&self) -> HashMap<String, u64> {
        self.dispatch_counts.lock().unwrap().clone()
    }
}

/// Registry of consumer groups, consulted in registration order.
pub struct ConsumerGroupRegistry {
    groups: RwLock<Vec<Arc<ConsumerGroup>>>,
}

impl ConsumerGroupRegistry {
    pub fn new() -> Self {
        Self {
            groups: RwLock::new(Vec::new()),
        }
    }

    pub fn create_group(&self, group_id: impl Into<String>) -> QueueResult<()> {
        let group_id = group_id.into();
        let mut groups = self.groups.write().unwrap();
        if groups.iter().any(|g| g.group_id() == group_id) {
            return Err(QueueError::GroupAlreadyExists { group_id });
        }
        log::info!("Created consumer group: {group_id}");
        groups.push(Arc::new(ConsumerGroup::new(group_id)));
        Ok(())
    }

    pub fn group(&self, group_id: &str) -> Option<Arc<ConsumerGroup>> {
        self.groups
            .read()
            .unwrap()
            .iter()
            .find(|g| g.group_id() == group_id)
            .cloned()
    }

    pub fn add_consumer(
        &self,
        group_id: &str,
        consumer: Arc<dyn MessageConsumer>,
    ) -> QueueResult<()> {
        let group = self.group(group_id).ok_or_else(|| QueueError::GroupNotFound {
            group_id: group_id.to_string(),
        })?;
        group.add_consumer(consumer);
        Ok(())
    }

    pub fn remove_consumer(&self, group_id: &str, consumer_id: &str) -> QueueResult<()> {
        let group = self.group(group_id).ok_or_else(|| QueueError::GroupNotFound {
            group_id: group_id.to_string(),
        })?;
        group.remove_consumer(consumer_id);
        Ok(())
    }

    pub fn group_count(&self) -> usize {
        self.groups.read().unwrap().len()
    }

    /// Find a consumer for `priority`, trying groups in registration order.
    pub(crate) fn select_for_priority(
        &self,
        priority: MessagePriority,
    ) -> Option<Arc<dyn MessageConsumer>> {
        let groups: Vec<Arc<ConsumerGroup>> = self.groups.read().unwrap().clone();
        groups.iter().find_map(|group| group.select_consumer(priority))
    }

    /// Dispatch counts merged across all groups, for the stats snapshot.
    pub fn dispatch_counts(&self) -> HashMap<String, u64> {
        let groups: Vec<Arc<ConsumerGroup>> = self.groups.read().unwrap().clone();
        let mut merged = HashMap::new();
        for group in groups {
            for (consumer_id, count) in group.dispatch_counts() {
                *merged.entry(consumer_id).or_insert(0) += count;
            }
        }
        merged
    }
}

impl Default for ConsumerGroupRegistry {
    fn default() -> Self {
        Self::new()
    }
}
