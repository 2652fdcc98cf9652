//! Error types for the notification system

#[derive(Debug, Clone, thiserror::Error)]
pub enum NotificationError {
    #[error("Failed to publish {event_type} event to {} subscribers: {failed_subscribers:?}", failed_subscribers.len())]
    PublishFailed {
        event_type: String,
        failed_subscribers: Vec<String>,
    },
}
