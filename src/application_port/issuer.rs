use crate::application_port::TokenError;
use crate::domain_model::{Claims, EXPIRATION_CLAIM, ISSUED_AT_CLAIM};
use chrono::{DateTime, Duration, Utc};

/// Signs a claims mapping into a compact JWT. Issuing never writes to the
/// token-state store; callers sequence issue, store add, and publish.
pub trait TokenIssuer: Send + Sync {
    fn issue_token(&self, claims: &Claims) -> Result<String, TokenError>;
}

/// Expiration instant for a token issued at `issued_at` with the given
/// lifetime.
pub fn expiration_at(issued_at: DateTime<Utc>, lifetime: Duration) -> DateTime<Utc> {
    issued_at + lifetime
}

/// Assembles a claims mapping with `iat`/`exp` set to the given instants
/// (Unix seconds) plus any caller-supplied claims. Caller entries win on
/// key collision.
pub fn build_claims(
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    additional: Claims,
) -> Claims {
    let mut claims = Claims::new();
    claims.insert(ISSUED_AT_CLAIM, issued_at.timestamp());
    claims.insert(EXPIRATION_CLAIM, expires_at.timestamp());
    for (key, value) in additional.0 {
        claims.insert(key, value);
    }
    claims
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_model::{ID_CLAIM, SUBJECT_CLAIM};

    #[test]
    fn expiration_adds_lifetime() {
        let iat = Utc::now();
        assert_eq!(expiration_at(iat, Duration::seconds(3600)) - iat, Duration::seconds(3600));
    }

    #[test]
    fn build_claims_sets_temporal_claims_and_merges() {
        let iat = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let exp = expiration_at(iat, Duration::seconds(900));

        let mut extra = Claims::new();
        extra.insert(ID_CLAIM, "a1").insert(SUBJECT_CLAIM, "u1");

        let claims = build_claims(iat, exp, extra);
        assert_eq!(claims.issued_at().unwrap(), iat);
        assert_eq!(claims.expires_at().unwrap(), exp);
        assert_eq!(claims.id(), Some("a1"));
        assert_eq!(claims.subject(), Some("u1"));
    }
}
