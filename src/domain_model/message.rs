use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A refresh/access token pair issued together, as carried on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedTokenPair {
    pub refresh_token_id: String,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub access_token_id: String,
    pub access_token_expires_at: DateTime<Utc>,
}

/// One bus message describing store mutations: tokens issued since the
/// last message and tokens revoked since then. Every list may be empty;
/// an all-empty message is a valid no-op.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokensMessage {
    #[serde(default)]
    pub issued_token_pairs: Vec<IssuedTokenPair>,
    #[serde(default)]
    pub revoked_refresh_tokens_id: Vec<String>,
    #[serde(default)]
    pub revoked_access_tokens_id: Vec<String>,
}

impl TokensMessage {
    pub fn is_empty(&self) -> bool {
        self.issued_token_pairs.is_empty()
            && self.revoked_refresh_tokens_id.is_empty()
            && self.revoked_access_tokens_id.is_empty()
    }
}
