use crate::domain_port::{SyncWatermarkStore, TokenStore};
use crate::infra_cache::CacheTokenStore;
use crate::infra_redis::RedisTokenStore;
use crate::infra_sqlite::{SqliteSyncWatermarkStore, SqliteTokenStore};
use crate::logger::*;
use crate::server::{BusError, LapinConsumer, TokensSyncService};
use crate::settings::Settings;
use lapin::{Connection, ConnectionProperties};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A replica node: a store backend fed only by the bus consumer. Request
/// code validates against `store`, which delegates reads to the backend.
pub struct ReplicaServer {
    pub store: Arc<TokensSyncService>,
    sync_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl ReplicaServer {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let mut watermark: Option<Arc<dyn SyncWatermarkStore>> = None;

        let backend: Arc<dyn TokenStore> = match settings.store.backend.as_str() {
            "cache" => Arc::new(CacheTokenStore::new()),
            "redis" => {
                let client = redis::Client::open(settings.store.redis_dsn.as_str())?;
                let manager = client.get_connection_manager().await?;
                Arc::new(RedisTokenStore::new(manager))
            }
            "sqlite" => {
                let pool = SqlitePoolOptions::new()
                    .connect(&settings.store.sqlite_dsn)
                    .await?;
                // The watermark log shares the backend's database.
                watermark = Some(Arc::new(SqliteSyncWatermarkStore::connect(pool.clone()).await?));
                Arc::new(SqliteTokenStore::connect(pool).await?)
            }
            other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        };

        let conn =
            Connection::connect(&settings.bus.amqp_dsn, ConnectionProperties::default()).await?;
        let consumer = Arc::new(LapinConsumer::new(
            conn,
            settings.bus.queue_name.clone(),
            Some(Duration::from_millis(settings.bus.poll_period_ms)),
            Some(settings.bus.messages_buffer_size),
        )?);

        let mut service = TokensSyncService::new(consumer, backend);
        if let Some(watermark) = watermark {
            service = service.with_watermark_store(watermark);
        }
        let service = Arc::new(service);

        let cancel = CancellationToken::new();
        let run_service = service.clone();
        let run_cancel = cancel.clone();
        let sync_handle = tokio::spawn(async move {
            match run_service.run(run_cancel).await {
                Ok(()) | Err(BusError::Cancelled) => info!("sync service stopped"),
                Err(e) => error!("sync service failed: {e:#}"),
            }
        });

        info!("replica server started");

        Ok(Self {
            store: service,
            sync_handle: Mutex::new(Some(sync_handle)),
            cancel,
        })
    }

    pub async fn shutdown(&self) {
        info!("replica server shutting down...");

        self.cancel.cancel();

        let handle = match self.sync_handle.lock() {
            Ok(mut lock) => lock.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            let r = handle.await;
            info!("sync handle dropped: {:?}", r);
        }
    }
}
