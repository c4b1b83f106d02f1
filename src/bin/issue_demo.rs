use chrono::{Duration, Utc};
use std::sync::Arc;
use tessera::application_port::*;
use tessera::domain::*;
use tessera::domain_model::*;
use tessera::domain_port::TokenStore;
use tessera::infra_cache::CacheTokenStore;
use tessera::settings::*;
use uuid::Uuid;

// Issue a refresh token against the in-memory backend, validate it, then
// revoke and validate again.
// $ cargo run --bin issue_demo -- --settings=settings/dev.toml
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let project_settings = parse_settings(cli.settings.as_deref())?;

    let private_pem = std::fs::read(&project_settings.keys.private_key_path)?;
    let public_pem = std::fs::read(&project_settings.keys.public_key_path)?;

    let issuer = Ed25519Issuer::new(&private_pem)?;
    let store = Arc::new(CacheTokenStore::new());
    let validator = Ed25519Validator::new(&public_pem, store.clone(), project_settings.mode)?;

    let refresh_id = Uuid::new_v4().to_string();
    let iat = Utc::now();
    let exp = expiration_at(iat, Duration::seconds(3600));

    let mut extra = Claims::new();
    extra
        .insert(ID_CLAIM, refresh_id.as_str())
        .insert(SUBJECT_CLAIM, "demo-user");
    let raw = issuer.issue_token(&build_claims(iat, exp, extra))?;
    store.add_refresh_token(&refresh_id, exp).await?;
    println!("issued: {raw}");

    let claims = validator
        .validate_claims(&raw, TokenKind::RefreshToken)
        .await?;
    println!("validated subject: {:?}", claims.subject());

    store
        .revoke_token(TokenKind::RefreshToken, &refresh_id)
        .await?;
    let revoked = validator.validate_claims(&raw, TokenKind::RefreshToken).await;
    println!("after revoke: {:?}", revoked.err());

    Ok(())
}
