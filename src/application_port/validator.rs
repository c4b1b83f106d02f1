use crate::domain_model::{Claims, TokenKind};
use crate::domain_port::StoreError;
use serde::Deserialize;

/// Governs how much of a JWT-layer failure is surfaced to callers. Prod
/// collapses causes that are not part of the public contract into
/// `TokenError::InvalidToken`; Debug preserves the raw cause.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Debug,
    Prod,
}

impl Mode {
    pub fn is_prod(&self) -> bool {
        matches!(self, Mode::Prod)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    MalformedToken,
    #[error("unexpected signing method")]
    UnexpectedSigningMethod,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    TokenExpired,
    #[error("token not yet valid")]
    TokenNotYetValid,
    #[error("invalid token")]
    InvalidToken,
    #[error("id claim not found")]
    MissingId,
    #[error("invalid id claim")]
    InvalidId,
    #[error("unable to parse private key")]
    UnableToParsePrivateKey,
    #[error("unable to parse public key")]
    UnableToParsePublicKey,
    #[error("invalid key type")]
    InvalidKeyType,
    #[error("signing failed: {0}")]
    Signing(String),
    /// Raw JWT-library cause, surfaced in Debug mode only.
    #[error(transparent)]
    Jwt(jsonwebtoken::errors::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Parses a signed compact JWT, verifies its signature and temporal
/// claims, extracts its identifier, and consults the token-state store
/// before handing the claims back.
#[async_trait::async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate_claims(
        &self,
        raw_token: &str,
        kind: TokenKind,
    ) -> Result<Claims, TokenError>;
}
