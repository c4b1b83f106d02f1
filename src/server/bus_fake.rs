use crate::domain_model::TokensMessage;
use crate::server::{
    BusError, TokensConsumer, TokensMessagesConsumer, TokensPublisher,
    DEFAULT_MESSAGES_BUFFER_SIZE, DEFAULT_POLL_PERIOD,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// In-process stand-in for the AMQP bus: publishers append raw JSON
/// bodies to a shared queue and consumers drain it on a ticker, matching
/// the broker-backed pair closely enough for tests and local runs.
#[derive(Clone, Default)]
pub struct ChannelBus {
    queue: Arc<Mutex<VecDeque<Vec<u8>>>>,
}

impl ChannelBus {
    pub fn new() -> Self {
        ChannelBus::default()
    }

    /// Appends a raw body, bypassing serialization. Lets tests feed the
    /// consumer malformed payloads.
    pub fn publish_raw(&self, body: Vec<u8>) {
        self.queue.lock().expect("bus queue poisoned").push_back(body);
    }

    pub fn publisher(&self) -> ChannelBusPublisher {
        ChannelBusPublisher { bus: self.clone() }
    }

    pub fn consumer(
        &self,
        period: Option<Duration>,
        buffer_size: Option<usize>,
    ) -> ChannelBusConsumer {
        ChannelBusConsumer {
            bus: self.clone(),
            period: period.filter(|p| !p.is_zero()).unwrap_or(DEFAULT_POLL_PERIOD),
            buffer_size: buffer_size
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_MESSAGES_BUFFER_SIZE),
        }
    }
}

pub struct ChannelBusPublisher {
    bus: ChannelBus,
}

#[async_trait::async_trait]
impl TokensPublisher for ChannelBusPublisher {
    async fn open(&self) -> Result<(), BusError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), BusError> {
        Ok(())
    }

    async fn publish(&self, msg: &TokensMessage) -> Result<(), BusError> {
        let body = serde_json::to_vec(msg).map_err(|e| BusError::Encode(e.to_string()))?;
        self.bus.publish_raw(body);
        Ok(())
    }
}

pub struct ChannelBusConsumer {
    bus: ChannelBus,
    period: Duration,
    buffer_size: usize,
}

#[async_trait::async_trait]
impl TokensConsumer for ChannelBusConsumer {
    async fn create_tokens_messages_consumer(
        &self,
    ) -> Result<(Box<dyn TokensMessagesConsumer>, mpsc::Receiver<TokensMessage>), BusError> {
        let (sender, receiver) = mpsc::channel(self.buffer_size);
        let handle = ChannelBusMessagesConsumer {
            bus: self.bus.clone(),
            sender,
            period: self.period,
        };
        Ok((Box::new(handle), receiver))
    }
}

struct ChannelBusMessagesConsumer {
    bus: ChannelBus,
    sender: mpsc::Sender<TokensMessage>,
    period: Duration,
}

impl ChannelBusMessagesConsumer {
    fn pop_ready(&self) -> Option<Vec<u8>> {
        self.bus.queue.lock().expect("bus queue poisoned").pop_front()
    }

    async fn drain_ready(&self) -> Result<(), BusError> {
        while let Some(body) = self.pop_ready() {
            match serde_json::from_slice::<TokensMessage>(&body) {
                Ok(msg) => {
                    if self.sender.send(msg).await.is_err() {
                        return Err(BusError::Unavailable(
                            "messages receiver dropped".to_string(),
                        ));
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to decode tokens message, dropping");
                }
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TokensMessagesConsumer for ChannelBusMessagesConsumer {
    async fn consume_tokens_messages(&self, cancel: CancellationToken) -> Result<(), BusError> {
        let mut ticker = tokio::time::interval(self.period);
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(BusError::Cancelled),
                _ = ticker.tick() => self.drain_ready().await?,
            }
        }
    }
}
