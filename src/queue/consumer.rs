//! Consumer capability contract
//!
//! Consumers are external collaborators. The engine only ever sees this
//! trait: an identifier, a processing operation, and the set of priorities
//! the consumer declares it can handle. Concrete consumer types stay
//! outside the crate.

use async_trait::async_trait;

use crate::queue::error::ProcessingError;
use crate::queue::message::{Message, MessagePriority};

/// Capability contract implemented by message consumers.
///
/// Implementations must be `Send + Sync`; the engine shares them across
/// dispatch tasks as `Arc<dyn MessageConsumer>`.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use relayq::queue::{Message, MessageConsumer, MessagePriority, ProcessingError};
///
/// struct AlertSender;
///
/// #[async_trait]
/// impl MessageConsumer for AlertSender {
///     async fn process_message(&self, message: &Message) -> Result<(), ProcessingError> {
///         println!("alert: {}", message.payload);
///         Ok(())
///     }
///
///     fn consumer_id(&self) -> &str {
///         "alert-sender-1"
///     }
///
///     fn supported_priorities(&self) -> &[MessagePriority] {
///         &[MessagePriority::Critical, MessagePriority::High]
///     }
/// }
/// ```
#[async_trait]
pub trait MessageConsumer: Send + Sync {
    /// Process one message. An `Err` sends the message to the retry path;
    /// the engine never inspects the failure beyond logging it.
    async fn process_message(&self, message: &Message) -> Result<(), ProcessingError>;

    /// Stable identifier, unique within a consumer group.
    fn consumer_id(&self) -> &str;

    /// Priorities this consumer is willing to handle.
    fn supported_priorities(&self) -> &[MessagePriority];
}
