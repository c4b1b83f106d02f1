use crate::domain_model::{parent_refresh_token_key, token_key, TokenKind};
use crate::domain_port::{StoreError, TokenStore};
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

const LIVE: &str = "1";
const REVOKED: &str = "0";

// TTL replies for a missing key / a key without expiry.
const TTL_MISSING: i64 = -2;
const TTL_NO_EXPIRY: i64 = -1;

fn store_err(e: redis::RedisError) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn decode_live(value: &str) -> Result<bool, StoreError> {
    match value {
        LIVE | "true" => Ok(true),
        REVOKED | "false" => Ok(false),
        other => Err(StoreError::Serialization(format!(
            "unexpected token value: {other}"
        ))),
    }
}

/// Redis-backed token store. Record keys hold `"1"`/`"0"` liveness with a
/// TTL tracking `expires_at`; the parent-link key holds the access token
/// id. Expiry is Redis's job, so a vanished key simply reads as invalid.
pub struct RedisTokenStore {
    conn: ConnectionManager,
}

impl RedisTokenStore {
    pub fn new(conn: ConnectionManager) -> Self {
        RedisTokenStore { conn }
    }

    async fn set_key(
        &self,
        key: &str,
        live: bool,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let value = if live { LIVE } else { REVOKED };
        let _: () = conn.set(key, value).await.map_err(store_err)?;
        let _: () = conn
            .expire_at(key, expires_at.timestamp())
            .await
            .map_err(store_err)?;
        Ok(())
    }

    /// Rewrites the value under `key` while keeping its remaining TTL, so
    /// a revocation can never resurrect an already-expired record.
    async fn set_preserving_ttl(&self, key: &str, live: bool) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let ttl: i64 = conn.ttl(key).await.map_err(store_err)?;
        match ttl {
            TTL_MISSING => Ok(false),
            TTL_NO_EXPIRY => {
                let value = if live { LIVE } else { REVOKED };
                let _: () = conn.set(key, value).await.map_err(store_err)?;
                Ok(true)
            }
            remaining => {
                let value = if live { LIVE } else { REVOKED };
                let _: () = conn.set(key, value).await.map_err(store_err)?;
                let _: () = conn.expire(key, remaining).await.map_err(store_err)?;
                Ok(true)
            }
        }
    }
}

#[async_trait::async_trait]
impl TokenStore for RedisTokenStore {
    async fn add_refresh_token(
        &self,
        id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.set_key(&token_key(TokenKind::RefreshToken, id), true, expires_at)
            .await
    }

    async fn add_access_token(
        &self,
        id: &str,
        parent_refresh_token_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let ttl_secs = (expires_at - Utc::now()).num_seconds().max(1) as u64;

        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(
                parent_refresh_token_key(parent_refresh_token_id),
                id,
                ttl_secs,
            )
            .await
            .map_err(store_err)?;

        self.set_key(&token_key(TokenKind::AccessToken, id), true, expires_at)
            .await
    }

    async fn revoke_token(&self, kind: TokenKind, id: &str) -> Result<(), StoreError> {
        if !self
            .set_preserving_ttl(&token_key(kind, id), false)
            .await?
        {
            return Err(StoreError::NotFound);
        }

        if kind != TokenKind::RefreshToken {
            return Ok(());
        }

        // Cascade through the parent link; a missing link means the
        // access token already expired away.
        let mut conn = self.conn.clone();
        let access_id: Option<String> = conn
            .get(parent_refresh_token_key(id))
            .await
            .map_err(store_err)?;
        let Some(access_id) = access_id else {
            return Ok(());
        };

        self.set_preserving_ttl(&token_key(TokenKind::AccessToken, &access_id), false)
            .await?;
        Ok(())
    }

    async fn is_token_valid(&self, kind: TokenKind, id: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn
            .get(token_key(kind, id))
            .await
            .map_err(store_err)?;
        match value {
            None => Ok(false),
            Some(value) => decode_live(&value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_values_decode() {
        assert!(decode_live("1").unwrap());
        assert!(!decode_live("0").unwrap());
        assert!(matches!(
            decode_live("yes").unwrap_err(),
            StoreError::Serialization(_)
        ));
    }
}
