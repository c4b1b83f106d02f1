use crate::domain_model::{parent_refresh_token_key, token_key, TokenKind};
use crate::domain_port::{StoreError, TokenStore};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum EntryValue {
    /// A token record: true = live, false = revoked.
    Live(bool),
    /// A parent link: the access token id issued under a refresh token.
    AccessTokenId(String),
}

#[derive(Debug, Clone)]
struct Entry {
    value: EntryValue,
    expires_at: DateTime<Utc>,
}

impl Entry {
    fn has_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// In-memory timed-cache token store. One mutex guards the whole map, so
/// a refresh revocation and its cascaded access revocation are applied
/// atomically. Expired entries read as absent and are purged on access.
#[derive(Default)]
pub struct CacheTokenStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl CacheTokenStore {
    pub fn new() -> Self {
        CacheTokenStore::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Entry>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Unavailable("cache mutex poisoned".to_string()))
    }

    fn revoke_entry(
        entries: &mut HashMap<String, Entry>,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        match entries.get_mut(key) {
            None => Err(StoreError::NotFound),
            Some(entry) if entry.has_expired(now) => {
                entries.remove(key);
                Err(StoreError::NotFound)
            }
            Some(entry) => match &mut entry.value {
                // Flip in place; expires_at stays untouched.
                EntryValue::Live(live) => {
                    *live = false;
                    Ok(())
                }
                EntryValue::AccessTokenId(_) => Err(StoreError::InvalidTokenItem),
            },
        }
    }
}

#[async_trait::async_trait]
impl TokenStore for CacheTokenStore {
    async fn add_refresh_token(
        &self,
        id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut entries = self.lock()?;
        entries.insert(
            token_key(TokenKind::RefreshToken, id),
            Entry {
                value: EntryValue::Live(true),
                expires_at,
            },
        );
        Ok(())
    }

    async fn add_access_token(
        &self,
        id: &str,
        parent_refresh_token_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut entries = self.lock()?;

        let parent = entries
            .get(&token_key(TokenKind::RefreshToken, parent_refresh_token_id))
            .ok_or(StoreError::ParentRefreshTokenNotFound)?;
        match parent.value {
            EntryValue::Live(_) => {}
            EntryValue::AccessTokenId(_) => return Err(StoreError::InvalidParentRefreshTokenItem),
        }
        // A refresh token that already expired cannot hold children; the
        // insert quietly becomes a no-op.
        if parent.has_expired(now) {
            return Ok(());
        }

        entries.insert(
            token_key(TokenKind::AccessToken, id),
            Entry {
                value: EntryValue::Live(true),
                expires_at,
            },
        );
        entries.insert(
            parent_refresh_token_key(parent_refresh_token_id),
            Entry {
                value: EntryValue::AccessTokenId(id.to_string()),
                expires_at,
            },
        );
        Ok(())
    }

    async fn revoke_token(&self, kind: TokenKind, id: &str) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut entries = self.lock()?;

        Self::revoke_entry(&mut entries, &token_key(kind, id), now)?;

        if kind != TokenKind::RefreshToken {
            return Ok(());
        }

        // Cascade to the access token issued under this refresh token.
        let access_id = match entries.get(&parent_refresh_token_key(id)) {
            None => return Ok(()),
            Some(link) if link.has_expired(now) => return Ok(()),
            Some(link) => match &link.value {
                EntryValue::AccessTokenId(access_id) => access_id.clone(),
                EntryValue::Live(_) => return Err(StoreError::InvalidParentRefreshTokenItem),
            },
        };

        match Self::revoke_entry(&mut entries, &token_key(TokenKind::AccessToken, &access_id), now)
        {
            // The linked access token already expired away; same outcome.
            Err(StoreError::NotFound) => Ok(()),
            other => other,
        }
    }

    async fn is_token_valid(&self, kind: TokenKind, id: &str) -> Result<bool, StoreError> {
        let now = Utc::now();
        let key = token_key(kind, id);
        let mut entries = self.lock()?;

        match entries.get(&key) {
            None => Ok(false),
            Some(entry) if entry.has_expired(now) => {
                entries.remove(&key);
                Ok(false)
            }
            Some(entry) => match entry.value {
                EntryValue::Live(live) => Ok(live),
                EntryValue::AccessTokenId(_) => Err(StoreError::InvalidTokenItem),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn in_one_hour() -> DateTime<Utc> {
        Utc::now() + Duration::seconds(3600)
    }

    #[tokio::test]
    async fn added_tokens_are_valid() {
        let store = CacheTokenStore::new();
        store.add_refresh_token("r1", in_one_hour()).await.unwrap();
        store
            .add_access_token("a1", "r1", in_one_hour())
            .await
            .unwrap();

        assert!(store
            .is_token_valid(TokenKind::RefreshToken, "r1")
            .await
            .unwrap());
        assert!(store
            .is_token_valid(TokenKind::AccessToken, "a1")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn missing_token_is_invalid_without_error() {
        let store = CacheTokenStore::new();
        assert!(!store
            .is_token_valid(TokenKind::RefreshToken, "nope")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn expired_token_reads_as_absent() {
        let store = CacheTokenStore::new();
        store
            .add_refresh_token("r1", Utc::now() - Duration::seconds(1))
            .await
            .unwrap();
        assert!(!store
            .is_token_valid(TokenKind::RefreshToken, "r1")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn revoking_refresh_cascades_to_access() {
        let store = CacheTokenStore::new();
        store.add_refresh_token("r1", in_one_hour()).await.unwrap();
        store
            .add_access_token("a1", "r1", Utc::now() + Duration::seconds(900))
            .await
            .unwrap();

        store
            .revoke_token(TokenKind::RefreshToken, "r1")
            .await
            .unwrap();

        assert!(!store
            .is_token_valid(TokenKind::RefreshToken, "r1")
            .await
            .unwrap());
        assert!(!store
            .is_token_valid(TokenKind::AccessToken, "a1")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn revoking_access_leaves_refresh_live() {
        let store = CacheTokenStore::new();
        store.add_refresh_token("r1", in_one_hour()).await.unwrap();
        store
            .add_access_token("a1", "r1", in_one_hour())
            .await
            .unwrap();

        store
            .revoke_token(TokenKind::AccessToken, "a1")
            .await
            .unwrap();

        assert!(store
            .is_token_valid(TokenKind::RefreshToken, "r1")
            .await
            .unwrap());
        assert!(!store
            .is_token_valid(TokenKind::AccessToken, "a1")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn revoking_missing_token_is_not_found() {
        let store = CacheTokenStore::new();
        let err = store
            .revoke_token(TokenKind::RefreshToken, "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn revocation_preserves_expiry() {
        let store = CacheTokenStore::new();
        store.add_refresh_token("r1", in_one_hour()).await.unwrap();
        store
            .revoke_token(TokenKind::RefreshToken, "r1")
            .await
            .unwrap();

        // The revoked record still exists with its original expiry: a
        // child insert under it succeeds rather than reporting a missing
        // or expired parent.
        store
            .add_access_token("a1", "r1", in_one_hour())
            .await
            .unwrap();
        assert!(store
            .is_token_valid(TokenKind::AccessToken, "a1")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn access_token_requires_present_parent() {
        let store = CacheTokenStore::new();
        let err = store
            .add_access_token("a1", "ghost", in_one_hour())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ParentRefreshTokenNotFound));
    }

    #[tokio::test]
    async fn expired_parent_makes_access_insert_a_noop() {
        let store = CacheTokenStore::new();
        store
            .add_refresh_token("r1", Utc::now() - Duration::seconds(1))
            .await
            .unwrap();

        store
            .add_access_token("a1", "r1", in_one_hour())
            .await
            .unwrap();
        assert!(!store
            .is_token_valid(TokenKind::AccessToken, "a1")
            .await
            .unwrap());
    }
}
