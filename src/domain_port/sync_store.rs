use crate::domain_port::StoreError;
use chrono::{DateTime, Utc};

/// Persists the timestamp a replica last applied token changes at, so
/// cold-start code can bound its catch-up query against an authoritative
/// store. The log is append-only; the newest row wins.
#[async_trait::async_trait]
pub trait SyncWatermarkStore: Send + Sync {
    /// Record `updated_at` as the newest watermark. One second is
    /// subtracted before persisting so changes landing within the same
    /// second as the poll are not skipped on the next catch-up.
    async fn update_last_sync_tokens_updated_at(
        &self,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// The newest recorded watermark, or `None` when nothing has been
    /// recorded yet.
    async fn last_sync_tokens_updated_at(&self) -> Result<Option<DateTime<Utc>>, StoreError>;
}
