//! Queue Engine Notification System
//!
//! Lightweight pub/sub for engine lifecycle and dead-letter events.
//! Components publish through a shared `NotificationManager` handle owned
//! by the engine instance; observers subscribe with a filter and receive
//! events over an unbounded channel.

// Internal modules - all access should go through the api module
pub(crate) mod error;
pub(crate) mod event;
pub(crate) mod manager;

// Public API module - the only public interface for the notification system
pub mod api;
