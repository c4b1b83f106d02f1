use crate::domain_model::TokenKind;
use crate::domain_port::{StoreError, TokenStore};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

fn store_err(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

/// SQLite-backed token store over a refresh/access table pair.
///
/// This backend is authoritative and persistent, so it carries no
/// liveness column: revocation deletes rows and absence reads as revoked,
/// while expired rows are fenced off by the `expires_at` predicate.
pub struct SqliteTokenStore {
    pool: SqlitePool,
}

impl SqliteTokenStore {
    /// Binds the store to a pool and runs the idempotent table DDL.
    pub async fn connect(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(
            r#"
CREATE TABLE IF NOT EXISTS refresh_tokens (
  id         TEXT PRIMARY KEY,
  expires_at DATETIME NOT NULL
)
"#,
        )
        .execute(&pool)
        .await
        .map_err(store_err)?;

        sqlx::query(
            r#"
CREATE TABLE IF NOT EXISTS access_tokens (
  id                      TEXT PRIMARY KEY,
  parent_refresh_token_id TEXT,
  expires_at              DATETIME NOT NULL
)
"#,
        )
        .execute(&pool)
        .await
        .map_err(store_err)?;

        Ok(SqliteTokenStore { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl TokenStore for SqliteTokenStore {
    async fn add_refresh_token(
        &self,
        id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
INSERT OR IGNORE INTO refresh_tokens (id, expires_at) VALUES (?, ?)
"#,
        )
        .bind(id)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }

    async fn add_access_token(
        &self,
        id: &str,
        parent_refresh_token_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
INSERT OR IGNORE INTO access_tokens (id, parent_refresh_token_id, expires_at)
VALUES (?, ?, ?)
"#,
        )
        .bind(id)
        .bind(parent_refresh_token_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }

    async fn revoke_token(&self, kind: TokenKind, id: &str) -> Result<(), StoreError> {
        match kind {
            TokenKind::AccessToken => {
                sqlx::query(r#"DELETE FROM access_tokens WHERE id = ?"#)
                    .bind(id)
                    .execute(&self.pool)
                    .await
                    .map_err(store_err)?;
            }
            TokenKind::RefreshToken => {
                sqlx::query(r#"DELETE FROM refresh_tokens WHERE id = ?"#)
                    .bind(id)
                    .execute(&self.pool)
                    .await
                    .map_err(store_err)?;

                sqlx::query(r#"DELETE FROM access_tokens WHERE parent_refresh_token_id = ?"#)
                    .bind(id)
                    .execute(&self.pool)
                    .await
                    .map_err(store_err)?;
            }
        }
        Ok(())
    }

    async fn is_token_valid(&self, kind: TokenKind, id: &str) -> Result<bool, StoreError> {
        let query = match kind {
            TokenKind::RefreshToken => {
                r#"SELECT COUNT(1) FROM refresh_tokens WHERE id = ? AND expires_at > ?"#
            }
            TokenKind::AccessToken => {
                r#"SELECT COUNT(1) FROM access_tokens WHERE id = ? AND expires_at > ?"#
            }
        };

        let count: i64 = sqlx::query_scalar(query)
            .bind(id)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(count > 0)
    }
}
