use crate::domain_port::{StoreError, SyncWatermarkStore};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

fn store_err(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

/// SQLite-backed sync watermark: an append-only log of Unix-second
/// timestamps where the newest row wins.
pub struct SqliteSyncWatermarkStore {
    pool: SqlitePool,
}

impl SqliteSyncWatermarkStore {
    /// Binds the store to a pool and runs the idempotent table DDL.
    pub async fn connect(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(
            r#"
CREATE TABLE IF NOT EXISTS sync_tokens (
  id         INTEGER PRIMARY KEY AUTOINCREMENT,
  updated_at DATETIME NOT NULL
)
"#,
        )
        .execute(&pool)
        .await
        .map_err(store_err)?;

        Ok(SqliteSyncWatermarkStore { pool })
    }
}

#[async_trait::async_trait]
impl SyncWatermarkStore for SqliteSyncWatermarkStore {
    async fn update_last_sync_tokens_updated_at(
        &self,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        // One second back so changes landing within the same second as
        // the poll are not skipped by the next catch-up query.
        sqlx::query(r#"INSERT INTO sync_tokens (updated_at) VALUES (?)"#)
            .bind(updated_at.timestamp() - 1)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(())
    }

    async fn last_sync_tokens_updated_at(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let newest: Option<i64> = sqlx::query_scalar(
            r#"SELECT updated_at FROM sync_tokens ORDER BY updated_at DESC LIMIT 1"#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(newest.and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn store() -> SqliteSyncWatermarkStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteSyncWatermarkStore::connect(pool).await.unwrap()
    }

    #[tokio::test]
    async fn empty_log_has_no_watermark() {
        let store = store().await;
        assert_eq!(store.last_sync_tokens_updated_at().await.unwrap(), None);
    }

    #[tokio::test]
    async fn newest_row_wins_and_is_one_second_back() {
        let store = store().await;
        let older = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let newer = DateTime::<Utc>::from_timestamp(1_700_000_100, 0).unwrap();

        store.update_last_sync_tokens_updated_at(newer).await.unwrap();
        store.update_last_sync_tokens_updated_at(older).await.unwrap();

        let got = store.last_sync_tokens_updated_at().await.unwrap().unwrap();
        assert_eq!(got.timestamp(), newer.timestamp() - 1);
    }
}
