use crate::application_port::{build_claims, expiration_at, TokenError, TokenIssuer};
use crate::domain_model::{
    Claims, IssuedTokenPair, TokenKind, TokensMessage, ID_CLAIM, SUBJECT_CLAIM,
};
use crate::domain_port::{StoreError, TokenStore};
use crate::server::{BusError, TokensPublisher};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum AuthorityError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Bus(#[from] BusError),
}

/// A freshly issued refresh/access pair: the signed tokens plus the
/// identifiers and expiries recorded in the store and announced on the bus.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub refresh_token: String,
    pub refresh_token_id: String,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub access_token: String,
    pub access_token_id: String,
    pub access_token_expires_at: DateTime<Utc>,
}

/// The authoritative write path: issues token pairs, records them in the
/// local store, and announces every mutation on the bus so replicas
/// converge. Replicas run the sync service instead and never hold one of
/// these.
pub struct TokenAuthority {
    issuer: Arc<dyn TokenIssuer>,
    store: Arc<dyn TokenStore>,
    publisher: Arc<dyn TokensPublisher>,
    refresh_lifetime: Duration,
    access_lifetime: Duration,
}

impl TokenAuthority {
    pub fn new(
        issuer: Arc<dyn TokenIssuer>,
        store: Arc<dyn TokenStore>,
        publisher: Arc<dyn TokensPublisher>,
        refresh_lifetime: Duration,
        access_lifetime: Duration,
    ) -> Self {
        TokenAuthority {
            issuer,
            store,
            publisher,
            refresh_lifetime,
            access_lifetime,
        }
    }

    fn new_token_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn signed_token(
        &self,
        id: &str,
        subject: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let mut extra = Claims::new();
        extra.insert(ID_CLAIM, id).insert(SUBJECT_CLAIM, subject);
        self.issuer
            .issue_token(&build_claims(issued_at, expires_at, extra))
    }

    /// Issues a refresh/access pair for a subject: sign both tokens,
    /// record them (refresh first, so the parent link resolves), then
    /// announce the pair.
    pub async fn issue_pair(&self, subject: &str) -> Result<IssuedTokens, AuthorityError> {
        let issued_at = Utc::now();
        let refresh_token_id = Self::new_token_id();
        let access_token_id = Self::new_token_id();
        let refresh_expires_at = expiration_at(issued_at, self.refresh_lifetime);
        let access_expires_at = expiration_at(issued_at, self.access_lifetime);

        let refresh_token =
            self.signed_token(&refresh_token_id, subject, issued_at, refresh_expires_at)?;
        let access_token =
            self.signed_token(&access_token_id, subject, issued_at, access_expires_at)?;

        self.store
            .add_refresh_token(&refresh_token_id, refresh_expires_at)
            .await?;
        self.store
            .add_access_token(&access_token_id, &refresh_token_id, access_expires_at)
            .await?;

        self.publisher
            .publish(&TokensMessage {
                issued_token_pairs: vec![IssuedTokenPair {
                    refresh_token_id: refresh_token_id.clone(),
                    refresh_token_expires_at: refresh_expires_at,
                    access_token_id: access_token_id.clone(),
                    access_token_expires_at: access_expires_at,
                }],
                ..TokensMessage::default()
            })
            .await?;

        Ok(IssuedTokens {
            refresh_token,
            refresh_token_id,
            refresh_token_expires_at: refresh_expires_at,
            access_token,
            access_token_id,
            access_token_expires_at: access_expires_at,
        })
    }

    /// Revokes a token locally and announces the revocation. Revoking a
    /// refresh token also revokes its access token through the store
    /// cascade, and replicas repeat that cascade on their side.
    pub async fn revoke(&self, kind: TokenKind, id: &str) -> Result<(), AuthorityError> {
        self.store.revoke_token(kind, id).await?;

        let mut msg = TokensMessage::default();
        match kind {
            TokenKind::RefreshToken => msg.revoked_refresh_tokens_id.push(id.to_string()),
            TokenKind::AccessToken => msg.revoked_access_tokens_id.push(id.to_string()),
        }
        self.publisher.publish(&msg).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_keys;
    use crate::domain::Ed25519Issuer;
    use crate::infra_cache::CacheTokenStore;
    use crate::server::port::TokensConsumer;
    use crate::server::ChannelBus;

    fn authority(bus: &ChannelBus, store: Arc<dyn TokenStore>) -> TokenAuthority {
        let issuer = Arc::new(Ed25519Issuer::new(test_keys::PRIVATE_PEM.as_bytes()).unwrap());
        TokenAuthority::new(
            issuer,
            store,
            Arc::new(bus.publisher()),
            Duration::seconds(3600),
            Duration::seconds(900),
        )
    }

    async fn drain_one(bus: &ChannelBus) -> TokensMessage {
        let consumer = bus.consumer(Some(std::time::Duration::from_millis(10)), None);
        let (handle, mut messages) = consumer.create_tokens_messages_consumer().await.unwrap();
        let cancel = tokio_util::sync::CancellationToken::new();
        let loop_cancel = cancel.clone();
        let loop_handle =
            tokio::spawn(async move { handle.consume_tokens_messages(loop_cancel).await });
        let msg = messages.recv().await.unwrap();
        cancel.cancel();
        let _ = loop_handle.await.unwrap();
        msg
    }

    #[tokio::test]
    async fn issuing_records_and_announces_the_pair() {
        let bus = ChannelBus::new();
        let store: Arc<dyn TokenStore> = Arc::new(CacheTokenStore::new());
        let authority = authority(&bus, store.clone());

        let issued = authority.issue_pair("u1").await.unwrap();

        assert!(store
            .is_token_valid(TokenKind::RefreshToken, &issued.refresh_token_id)
            .await
            .unwrap());
        assert!(store
            .is_token_valid(TokenKind::AccessToken, &issued.access_token_id)
            .await
            .unwrap());
        assert_eq!(issued.refresh_token.split('.').count(), 3);

        let msg = drain_one(&bus).await;
        assert_eq!(msg.issued_token_pairs.len(), 1);
        assert_eq!(msg.issued_token_pairs[0].refresh_token_id, issued.refresh_token_id);
        assert_eq!(msg.issued_token_pairs[0].access_token_id, issued.access_token_id);
    }

    #[tokio::test]
    async fn revoking_cascades_locally_and_announces() {
        let bus = ChannelBus::new();
        let store: Arc<dyn TokenStore> = Arc::new(CacheTokenStore::new());
        let authority = authority(&bus, store.clone());

        let issued = authority.issue_pair("u1").await.unwrap();
        let _ = drain_one(&bus).await;

        authority
            .revoke(TokenKind::RefreshToken, &issued.refresh_token_id)
            .await
            .unwrap();

        assert!(!store
            .is_token_valid(TokenKind::RefreshToken, &issued.refresh_token_id)
            .await
            .unwrap());
        assert!(!store
            .is_token_valid(TokenKind::AccessToken, &issued.access_token_id)
            .await
            .unwrap());

        let msg = drain_one(&bus).await;
        assert_eq!(
            msg.revoked_refresh_tokens_id,
            vec![issued.refresh_token_id.clone()]
        );
        assert!(msg.revoked_access_tokens_id.is_empty());
    }
}
