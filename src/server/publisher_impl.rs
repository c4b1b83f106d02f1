use crate::domain_model::TokensMessage;
use crate::server::{validate_queue_name, BusError, TokensPublisher};
use lapin::options::{BasicPublishOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection};
use tokio::sync::Mutex;

const CONTENT_TYPE_JSON: &str = "application/json";

fn bus_err(e: lapin::Error) -> BusError {
    BusError::Unavailable(e.to_string())
}

/// AMQP publisher for token events. Holds at most one channel; `open`,
/// `close`, and `publish` are serialized under one mutex so a close can
/// never race a publish in flight.
pub struct LapinPublisher {
    conn: Connection,
    queue_name: String,
    channel: Mutex<Option<Channel>>,
}

impl LapinPublisher {
    pub fn new(conn: Connection, queue_name: impl Into<String>) -> Result<Self, BusError> {
        let queue_name = queue_name.into();
        validate_queue_name(&queue_name)?;
        Ok(LapinPublisher {
            conn,
            queue_name,
            channel: Mutex::new(None),
        })
    }

    async fn open_locked(&self, slot: &mut Option<Channel>) -> Result<(), BusError> {
        if slot.is_some() {
            return Ok(());
        }

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

        *slot = Some(channel);
        tracing::info!(queue = %self.queue_name, "publisher channel opened");
        Ok(())
    }
}

#[async_trait::async_trait]
impl TokensPublisher for LapinPublisher {
    async fn open(&self) -> Result<(), BusError> {
        let mut slot = self.channel.lock().await;
        self.open_locked(&mut slot).await
    }

    async fn close(&self) -> Result<(), BusError> {
        let mut slot = self.channel.lock().await;
        let Some(channel) = slot.take() else {
            return Ok(());
        };
        channel.close(200, "closing").await.map_err(bus_err)?;
        tracing::info!(queue = %self.queue_name, "publisher channel closed");
        Ok(())
    }

    async fn publish(&self, msg: &TokensMessage) -> Result<(), BusError> {
        let mut slot = self.channel.lock().await;
        self.open_locked(&mut slot).await?;
        let channel = slot.as_ref().ok_or_else(|| {
            BusError::Unavailable("publisher channel missing after open".to_string())
        })?;

        let body = serde_json::to_vec(msg).map_err(|e| BusError::Encode(e.to_string()))?;

        channel
            .basic_publish(
                "",
                &self.queue_name,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default().with_content_type(CONTENT_TYPE_JSON.into()),
            )
            .await
            .map_err(bus_err)?
            .await
            .map_err(bus_err)?;

        tracing::debug!(queue = %self.queue_name, bytes = body.len(), "tokens message published");
        Ok(())
    }
}
