use crate::domain_model::{TokenKind, UnknownTokenKind};
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("token not found")]
    NotFound,
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("bad stored value: {0}")]
    Serialization(String),
    #[error(transparent)]
    UnknownTokenKind(#[from] UnknownTokenKind),
    #[error("parent refresh token not found")]
    ParentRefreshTokenNotFound,
    #[error("invalid parent refresh token item")]
    InvalidParentRefreshTokenItem,
    #[error("invalid token item")]
    InvalidTokenItem,
}

/// The token-state capability shared by every backend.
///
/// Implementations record which token ids are live, when they expire, and
/// which access token descends from which refresh token, so that revoking
/// a refresh token also revokes its access token.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    /// Insert a live refresh token record.
    async fn add_refresh_token(
        &self,
        id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Insert a live access token record together with the parent link
    /// that lets a refresh revocation find it.
    async fn add_access_token(
        &self,
        id: &str,
        parent_refresh_token_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Mark a token as revoked. Revoking a refresh token cascades to the
    /// access token named by its parent link. Expiry is never extended.
    async fn revoke_token(&self, kind: TokenKind, id: &str) -> Result<(), StoreError>;

    /// True iff a record exists, has not expired, and has not been
    /// revoked. A missing record is `Ok(false)`, not an error.
    async fn is_token_valid(&self, kind: TokenKind, id: &str) -> Result<bool, StoreError>;
}
