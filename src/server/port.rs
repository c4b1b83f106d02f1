use crate::domain_model::TokensMessage;
use crate::domain_port::StoreError;
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;

/// Default polling period for the consumer drain loop.
pub const DEFAULT_POLL_PERIOD: std::time::Duration = std::time::Duration::from_secs(1);

/// Default capacity of the decoded-messages buffer.
pub const DEFAULT_MESSAGES_BUFFER_SIZE: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("empty queue name")]
    EmptyQueueName,
    #[error("operation cancelled")]
    Cancelled,
    #[error("bus unavailable: {0}")]
    Unavailable(String),
    #[error("message encoding failed: {0}")]
    Encode(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub(crate) fn validate_queue_name(queue_name: &str) -> Result<(), BusError> {
    if queue_name.is_empty() {
        return Err(BusError::EmptyQueueName);
    }
    Ok(())
}

/// Durable enqueue of token events onto the bus. Retry policy is the
/// caller's responsibility.
#[async_trait::async_trait]
pub trait TokensPublisher: Send + Sync {
    /// Establishes the channel and declares the durable queue. Idempotent.
    async fn open(&self) -> Result<(), BusError>;

    /// Tears the channel down.
    async fn close(&self) -> Result<(), BusError>;

    /// Serializes the message to JSON and enqueues it. Opens lazily when
    /// needed.
    async fn publish(&self, msg: &TokensMessage) -> Result<(), BusError>;
}

/// Blocking drain loop of a tokens-messages consumer. Decoded messages
/// arrive on the receiver returned alongside this handle; a full buffer
/// blocks the drain, which is the back-pressure.
#[async_trait::async_trait]
pub trait TokensMessagesConsumer: Send + Sync {
    /// Runs until cancellation, which yields `BusError::Cancelled`.
    async fn consume_tokens_messages(&self, cancel: CancellationToken) -> Result<(), BusError>;
}

/// Creates drain handles bound to the bus queue.
#[async_trait::async_trait]
pub trait TokensConsumer: Send + Sync {
    async fn create_tokens_messages_consumer(
        &self,
    ) -> Result<(Box<dyn TokensMessagesConsumer>, Receiver<TokensMessage>), BusError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_queue_name_is_rejected() {
        assert!(matches!(
            validate_queue_name("").unwrap_err(),
            BusError::EmptyQueueName
        ));
        validate_queue_name("tokens").unwrap();
    }
}
