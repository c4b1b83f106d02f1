use crate::domain_model::TokensMessage;
use crate::server::{
    validate_queue_name, BusError, TokensConsumer, TokensMessagesConsumer,
    DEFAULT_MESSAGES_BUFFER_SIZE, DEFAULT_POLL_PERIOD,
};
use futures_util::{FutureExt, StreamExt};
use lapin::options::{BasicConsumeOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{Connection, Consumer};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

fn bus_err(e: lapin::Error) -> BusError {
    BusError::Unavailable(e.to_string())
}

/// AMQP consumer factory for token events. Each created handle owns a
/// channel on the durable queue and drains it on a periodic ticker.
pub struct LapinConsumer {
    conn: Connection,
    queue_name: String,
    period: Duration,
    buffer_size: usize,
}

impl LapinConsumer {
    pub fn new(
        conn: Connection,
        queue_name: impl Into<String>,
        period: Option<Duration>,
        buffer_size: Option<usize>,
    ) -> Result<Self, BusError> {
        let queue_name = queue_name.into();
        validate_queue_name(&queue_name)?;
        Ok(LapinConsumer {
            conn,
            queue_name,
            period: period.filter(|p| !p.is_zero()).unwrap_or(DEFAULT_POLL_PERIOD),
            buffer_size: buffer_size
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_MESSAGES_BUFFER_SIZE),
        })
    }
}

#[async_trait::async_trait]
impl TokensConsumer for LapinConsumer {
    async fn create_tokens_messages_consumer(
        &self,
    ) -> Result<(Box<dyn TokensMessagesConsumer>, mpsc::Receiver<TokensMessage>), BusError> {
        let channel = self.conn.create_channel().await.map_err(bus_err)?;
        channel
            .queue_declare(
                &self.queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(bus_err)?;

        let deliveries = channel
            .basic_consume(
                &self.queue_name,
                "",
                BasicConsumeOptions {
                    no_ack: true,
                    ..BasicConsumeOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(bus_err)?;

        let (sender, receiver) = mpsc::channel(self.buffer_size);
        let handle = LapinTokensMessagesConsumer {
            deliveries: Mutex::new(deliveries),
            sender,
            period: self.period,
        };
        tracing::info!(queue = %self.queue_name, "consumer channel opened");

        Ok((Box::new(handle), receiver))
    }
}

struct LapinTokensMessagesConsumer {
    deliveries: Mutex<Consumer>,
    sender: mpsc::Sender<TokensMessage>,
    period: Duration,
}

impl LapinTokensMessagesConsumer {
    /// Drains every delivery that is already sitting in the stream.
    /// Malformed bodies are logged and dropped; a full downstream buffer
    /// blocks here, which is the intended back-pressure.
    async fn drain_ready(&self, deliveries: &mut Consumer) -> Result<(), BusError> {
        while let Some(ready) = deliveries.next().now_or_never() {
            let Some(result) = ready else {
                return Err(BusError::Unavailable(
                    "delivery stream closed".to_string(),
                ));
            };

            let delivery = match result {
                Ok(delivery) => delivery,
                Err(e) => {
                    tracing::warn!(error = %e, "delivery error, skipping");
                    continue;
                }
            };

            match serde_json::from_slice::<TokensMessage>(&delivery.data) {
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
impl TokensMessagesConsumer for LapinTokensMessagesConsumer {
    async fn consume_tokens_messages(&self, cancel: CancellationToken) -> Result<(), BusError> {
        let mut deliveries = self.deliveries.lock().await;
        let mut ticker = tokio::time::interval(self.period);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("consumer cancelled, exiting consume loop");
                    return Err(BusError::Cancelled);
                }
                _ = ticker.tick() => {
                    self.drain_ready(&mut deliveries).await?;
                }
            }
        }
    }
}
