use crate::domain_model::{Claims, TokenKind};
use std::collections::HashMap;

const RAW_TOKEN_KEY_PREFIX: &str = "authorization";
const TOKEN_CLAIMS_KEY_PREFIX: &str = "jwt_claims";

/// Scope key under which the raw bearer credential of a kind is stashed.
pub fn raw_token_key(kind: TokenKind) -> String {
    format!("{RAW_TOKEN_KEY_PREFIX}.{}", kind.as_str())
}

/// Scope key under which the parsed claims of a kind are stashed.
pub fn token_claims_key(kind: TokenKind) -> String {
    format!("{TOKEN_CLAIMS_KEY_PREFIX}.{}", kind.as_str())
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScopeValue {
    RawToken(String),
    TokenClaims(Claims),
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ScopeError {
    #[error("empty token")]
    EmptyToken,
    #[error("no token in scope")]
    MissingToken,
    #[error("no token claims in scope")]
    MissingTokenClaims,
    #[error("unexpected token type in scope")]
    UnexpectedTokenType,
    #[error("unexpected token claims type in scope")]
    UnexpectedTokenClaimsType,
    #[error("missing token claims subject")]
    MissingTokenClaimsSubject,
    #[error("missing token claims id")]
    MissingTokenClaimsId,
}

/// A request-scoped key/value carrier. Each transport supplies its own
/// implementation (an HTTP request extension map, an RPC call context, a
/// handler-local map); the accessors below are the shared contract.
pub trait RequestScope {
    fn insert(&mut self, key: String, value: ScopeValue);
    fn get(&self, key: &str) -> Option<&ScopeValue>;
    fn remove(&mut self, key: &str);
}

/// Plain map-backed carrier, fine for handler-local scopes and tests.
#[derive(Debug, Default)]
pub struct MapScope(HashMap<String, ScopeValue>);

impl MapScope {
    pub fn new() -> Self {
        MapScope::default()
    }
}

impl RequestScope for MapScope {
    fn insert(&mut self, key: String, value: ScopeValue) {
        self.0.insert(key, value);
    }

    fn get(&self, key: &str) -> Option<&ScopeValue> {
        self.0.get(key)
    }

    fn remove(&mut self, key: &str) {
        self.0.remove(key);
    }
}

/// Stashes the raw bearer credential for a kind. Empty bearers are refused.
pub fn set_raw_token(
    scope: &mut dyn RequestScope,
    kind: TokenKind,
    raw_token: &str,
) -> Result<(), ScopeError> {
    if raw_token.is_empty() {
        return Err(ScopeError::EmptyToken);
    }
    scope.insert(
        raw_token_key(kind),
        ScopeValue::RawToken(raw_token.to_string()),
    );
    Ok(())
}

/// Retrieves the raw bearer credential for a kind.
pub fn raw_token(scope: &dyn RequestScope, kind: TokenKind) -> Result<String, ScopeError> {
    match scope.get(&raw_token_key(kind)) {
        None => Err(ScopeError::MissingToken),
        Some(ScopeValue::RawToken(raw_token)) => Ok(raw_token.clone()),
        Some(_) => Err(ScopeError::UnexpectedTokenType),
    }
}

pub fn clear_raw_token(scope: &mut dyn RequestScope, kind: TokenKind) {
    scope.remove(&raw_token_key(kind));
}

/// Stashes the parsed claims for a kind.
pub fn set_token_claims(scope: &mut dyn RequestScope, kind: TokenKind, claims: Claims) {
    scope.insert(token_claims_key(kind), ScopeValue::TokenClaims(claims));
}

/// Retrieves the parsed claims for a kind.
pub fn token_claims(scope: &dyn RequestScope, kind: TokenKind) -> Result<Claims, ScopeError> {
    match scope.get(&token_claims_key(kind)) {
        None => Err(ScopeError::MissingTokenClaims),
        Some(ScopeValue::TokenClaims(claims)) => Ok(claims.clone()),
        Some(_) => Err(ScopeError::UnexpectedTokenClaimsType),
    }
}

pub fn clear_token_claims(scope: &mut dyn RequestScope, kind: TokenKind) {
    scope.remove(&token_claims_key(kind));
}

/// The `sub` scalar of the stashed claims.
pub fn token_claims_subject(
    scope: &dyn RequestScope,
    kind: TokenKind,
) -> Result<String, ScopeError> {
    let claims = token_claims(scope, kind)?;
    claims
        .subject()
        .map(str::to_string)
        .ok_or(ScopeError::MissingTokenClaimsSubject)
}

/// The `jti` scalar of the stashed claims.
pub fn token_claims_id(scope: &dyn RequestScope, kind: TokenKind) -> Result<String, ScopeError> {
    let claims = token_claims(scope, kind)?;
    claims
        .id()
        .map(str::to_string)
        .ok_or(ScopeError::MissingTokenClaimsId)
}
