//! NotificationManager implementation
//!
//! Fan-out of engine events to subscribers over unbounded channels. Each
//! subscriber registers with a filter; publishing clones the event to every
//! subscriber whose filter accepts it. Subscribers whose receiving end has
//! been dropped are pruned on the next publish.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::notifications::error::NotificationError;
use crate::notifications::event::{Event, EventFilter};

/// Receiving end handed to a subscriber.
pub type EventReceiver = UnboundedReceiver<Event>;

struct SubscriberInfo {
    filter: EventFilter,
    source: String,
    sender: UnboundedSender<Event>,
}

/// Shared event hub. Interior-locked so it can be published to from any
/// thread through a plain `Arc` - publishing never awaits.
pub struct NotificationManager {
    subscribers: Mutex<HashMap<String, SubscriberInfo>>,
}

impl NotificationManager {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    /// Register a subscriber and return its event stream. Re-registering
    /// the same id replaces the previous subscription.
    pub fn subscribe(
        &self,
        subscriber_id: impl Into<String>,
        filter: EventFilter,
        source: impl Into<String>,
    ) -> EventReceiver {
        let subscriber_id = subscriber_id.into();
        let source = source.into();
        let (sender, receiver) = unbounded_channel();

        let info = SubscriberInfo {
            filter,
            source: source.clone(),
            sender,
        };

        let mut subscribers = self.subscribers.lock().unwrap();
        if let Some(existing) = subscribers.insert(subscriber_id.clone(), info) {
            log::warn!(
                "Subscriber '{}' replaced existing subscription (source: {} -> {})",
                subscriber_id,
                existing.source,
                source
            );
        }

        receiver
    }

    pub fn unsubscribe(&self, subscriber_id: &str) {
        self.subscribers.lock().unwrap().remove(subscriber_id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    pub fn has_subscriber(&self, subscriber_id: &str) -> bool {
        self.subscribers.lock().unwrap().contains_key(subscriber_id)
    }

    /// Publish an event to every subscriber whose filter accepts it.
    ///
    /// Subscribers with a closed channel are removed; their ids are
    /// reported in the error so callers can log them.
    pub fn publish(&self, event: Event) -> Result<(), NotificationError> {
        let event_type = match &event {
            Event::Queue(_) => "Queue",
            Event::DeadLetter(_) => "DeadLetter",
        }
        .to_string();

        let mut failed_subscribers = Vec::new();
        let mut subscribers = self.subscribers.lock().unwrap();

        for (subscriber_id, info) in subscribers.iter() {
            if info.filter.accepts(&event) && info.sender.send(event.clone()).is_err() {
                failed_subscribers.push(subscriber_id.clone());
            }
        }

        for subscriber_id in &failed_subscribers {
            subscribers.remove(subscriber_id);
        }

        if !failed_subscribers.is_empty() {
            return Err(NotificationError::PublishFailed {
                event_type,
                failed_subscribers,
            });
        }

        Ok(())
    }
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}
