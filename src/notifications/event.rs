//! Event types for the notification system

use std::time::SystemTime;

use crate::queue::DeadLetterReason;

#[derive(Clone, Debug, PartialEq)]
pub enum QueueEventType {
    Started,
    Shutdown,
    Full,
}

/// Engine lifecycle event.
#[derive(Clone, Debug)]
pub struct QueueEvent {
    pub event_type: QueueEventType,
    pub timestamp: SystemTime,
    pub queue_name: String,
    pub size: Option<usize>,
}

impl QueueEvent {
    pub fn new(event_type: QueueEventType, queue_name: String) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            queue_name,
            size: None,
        }
    }

    pub fn with_size(event_type: QueueEventType, queue_name: String, size: usize) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            queue_name,
            size: Some(size),
        }
    }
}

/// Emitted whenever a message is recorded in the dead-letter sink.
#[derive(Clone, Debug)]
pub struct DeadLetterEvent {
    pub timestamp: SystemTime,
    pub message_id: String,
    pub reason: DeadLetterReason,
}

impl DeadLetterEvent {
    pub fn new(message_id: String, reason: DeadLetterReason) -> Self {
        Self {
            timestamp: SystemTime::now(),
            message_id,
            reason,
        }
    }
}

/// Union of all events that can be published.
#[derive(Clone, Debug)]
pub enum Event {
    Queue(QueueEvent),
    DeadLetter(DeadLetterEvent),
}

/// Filter determining which event families a subscriber receives.
#[derive(Clone, Debug, PartialEq)]
pub enum EventFilter {
    QueueOnly,
    DeadLetterOnly,
    All,
}

impl EventFilter {
    /// Check if an event should be accepted by this filter
    pub fn accepts(&self, event: &Event) -> bool {
        matches!(
            (self, event),
            (EventFilter::QueueOnly, Event::Queue(_))
                | (EventFilter::DeadLetterOnly, Event::DeadLetter(_))
                | (EventFilter::All, _)
        )
    }
}
