use crate::domain_model::{TokenKind, TokensMessage};
use crate::domain_port::{StoreError, SyncWatermarkStore, TokenStore};
use crate::server::{BusError, TokensConsumer};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Applies bus token events to a store backend. This service is the only
/// writer for a replica backend; read paths hold the service itself,
/// which exposes the store capability by delegation.
pub struct TokensSyncService {
    consumer: Arc<dyn TokensConsumer>,
    store: Arc<dyn TokenStore>,
    watermark: Option<Arc<dyn SyncWatermarkStore>>,
}

impl TokensSyncService {
    pub fn new(consumer: Arc<dyn TokensConsumer>, store: Arc<dyn TokenStore>) -> Self {
        TokensSyncService {
            consumer,
            store,
            watermark: None,
        }
    }

    /// Also record a sync watermark after every applied message, for
    /// cold-start catch-up bounds.
    pub fn with_watermark_store(mut self, watermark: Arc<dyn SyncWatermarkStore>) -> Self {
        self.watermark = Some(watermark);
        self
    }

    async fn apply_message(&self, msg: &TokensMessage) -> Result<(), StoreError> {
        // Issued records land before any revocation that may name them.
        for pair in &msg.issued_token_pairs {
            self.store
                .add_refresh_token(&pair.refresh_token_id, pair.refresh_token_expires_at)
                .await?;
            self.store
                .add_access_token(
                    &pair.access_token_id,
                    &pair.refresh_token_id,
                    pair.access_token_expires_at,
                )
                .await?;
        }

        for id in &msg.revoked_refresh_tokens_id {
            self.store.revoke_token(TokenKind::RefreshToken, id).await?;
        }

        for id in &msg.revoked_access_tokens_id {
            self.store.revoke_token(TokenKind::AccessToken, id).await?;
        }

        if let Some(watermark) = &self.watermark {
            watermark.update_last_sync_tokens_updated_at(Utc::now()).await?;
        }

        Ok(())
    }

    /// Runs the consume loop and the applier loop together until
    /// cancellation or the first error; either side failing tears the
    /// other one down.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), BusError> {
        let (messages_consumer, mut messages) =
            self.consumer.create_tokens_messages_consumer().await?;

        let consume_cancel = cancel.clone();
        let consume = async move {
            messages_consumer
                .consume_tokens_messages(consume_cancel)
                .await
        };

        let apply = async {
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::info!("sync service cancelled, stopping applier");
                        return Err(BusError::Cancelled);
                    }
                    msg = messages.recv() => {
                        let Some(msg) = msg else {
                            tracing::info!("messages channel closed, stopping applier");
                            return Ok(());
                        };
                        self.apply_message(&msg).await?;
                    }
                }
            }
        };

        tokio::try_join!(consume, apply)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TokenStore for TokensSyncService {
    async fn add_refresh_token(
        &self,
        id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.store.add_refresh_token(id, expires_at).await
    }

    async fn add_access_token(
        &self,
        id: &str,
        parent_refresh_token_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.store
            .add_access_token(id, parent_refresh_token_id, expires_at)
            .await
    }

    async fn revoke_token(&self, kind: TokenKind, id: &str) -> Result<(), StoreError> {
        self.store.revoke_token(kind, id).await
    }

    async fn is_token_valid(&self, kind: TokenKind, id: &str) -> Result<bool, StoreError> {
        self.store.is_token_valid(kind, id).await
    }
}
