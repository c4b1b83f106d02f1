use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tessera::application_port::{build_claims, expiration_at, Mode, TokenIssuer, TokenValidator};
use tessera::domain::{Ed25519Issuer, Ed25519Validator};
use tessera::domain_model::{Claims, TokenKind, EXPIRATION_CLAIM, ID_CLAIM, ISSUED_AT_CLAIM, SUBJECT_CLAIM};
use tessera::domain_port::TokenStore;
use tessera::infra_cache::CacheTokenStore;
use tessera::infra_sqlite::SqliteTokenStore;

const PRIVATE_PEM: &str = include_str!("fixtures/ed25519_private.pem");
const PUBLIC_PEM: &str = include_str!("fixtures/ed25519_public.pem");

fn issuer() -> Ed25519Issuer {
    Ed25519Issuer::new(PRIVATE_PEM.as_bytes()).unwrap()
}

async fn sqlite_store() -> SqliteTokenStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    SqliteTokenStore::connect(pool).await.unwrap()
}

#[tokio::test]
async fn issue_then_validate_against_each_backend() {
    let stores: Vec<Arc<dyn TokenStore>> =
        vec![Arc::new(CacheTokenStore::new()), Arc::new(sqlite_store().await)];

    for store in stores {
        let iat = Utc::now();
        let exp = expiration_at(iat, Duration::seconds(3600));
        let mut extra = Claims::new();
        extra.insert(ID_CLAIM, "r1").insert(SUBJECT_CLAIM, "u1");
        let raw = issuer().issue_token(&build_claims(iat, exp, extra)).unwrap();

        store.add_refresh_token("r1", exp).await.unwrap();

        let validator =
            Ed25519Validator::new(PUBLIC_PEM.as_bytes(), store.clone(), Mode::Prod).unwrap();
        let claims = validator
            .validate_claims(&raw, TokenKind::RefreshToken)
            .await
            .unwrap();

        assert_eq!(claims.subject(), Some("u1"));
        assert_eq!(claims.id(), Some("r1"));
    }
}

#[tokio::test]
async fn issued_claims_survive_the_round_trip_bit_exact() {
    let iat = Utc::now();
    let exp = expiration_at(iat, Duration::seconds(3600));
    let mut extra = Claims::new();
    extra
        .insert(ID_CLAIM, "r1")
        .insert(SUBJECT_CLAIM, "u1")
        .insert("tenant", "acme");
    let input = build_claims(iat, exp, extra);
    let raw = issuer().issue_token(&input).unwrap();

    let store: Arc<dyn TokenStore> = Arc::new(CacheTokenStore::new());
    store.add_refresh_token("r1", exp).await.unwrap();
    let validator = Ed25519Validator::new(PUBLIC_PEM.as_bytes(), store, Mode::Debug).unwrap();
    let output = validator
        .validate_claims(&raw, TokenKind::RefreshToken)
        .await
        .unwrap();

    for key in [ID_CLAIM, SUBJECT_CLAIM, ISSUED_AT_CLAIM, EXPIRATION_CLAIM, "tenant"] {
        assert_eq!(output.get(key), input.get(key), "claim {key} changed");
    }
}

#[tokio::test]
async fn cascade_revocation_on_each_backend() {
    let stores: Vec<Arc<dyn TokenStore>> =
        vec![Arc::new(CacheTokenStore::new()), Arc::new(sqlite_store().await)];

    for store in stores {
        let now = Utc::now();
        store
            .add_refresh_token("r1", now + Duration::seconds(3600))
            .await
            .unwrap();
        store
            .add_access_token("a1", "r1", now + Duration::seconds(900))
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
}

#[tokio::test]
async fn expiry_acts_as_revocation() {
    let stores: Vec<Arc<dyn TokenStore>> =
        vec![Arc::new(CacheTokenStore::new()), Arc::new(sqlite_store().await)];

    for store in stores {
        store
            .add_refresh_token("r3", Utc::now() + Duration::seconds(3600))
            .await
            .unwrap();
        store
            .add_access_token("a3", "r3", Utc::now() - Duration::seconds(1))
            .await
            .unwrap();

        assert!(!store
            .is_token_valid(TokenKind::AccessToken, "a3")
            .await
            .unwrap());
    }
}
