//! Public API for the notification system
//!
//! External modules should import from here rather than directly from
//! internal modules.

// Core event types and enums
pub use crate::notifications::event::{
    DeadLetterEvent, Event, EventFilter, QueueEvent, QueueEventType,
};

// Manager and utilities
pub use crate::notifications::error::NotificationError;
pub use crate::notifications::manager::{EventReceiver, NotificationManager};
