use crate::application_port::{TokenError, TokenIssuer};
use crate::domain::signing;
use crate::domain_model::Claims;
use jsonwebtoken::{Algorithm, EncodingKey, Header};

/// Issues Ed25519-signed compact JWTs over caller-supplied claims.
pub struct Ed25519Issuer {
    encoding_key: EncodingKey,
}

impl Ed25519Issuer {
    /// Builds an issuer from a PEM-encoded Ed25519 private key.
    pub fn new(private_key_pem: &[u8]) -> Result<Self, TokenError> {
        let encoding_key = signing::encoding_key_from_pem(private_key_pem)?;
        Ok(Ed25519Issuer { encoding_key })
    }
}

impl TokenIssuer for Ed25519Issuer {
    fn issue_token(&self, claims: &Claims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::EdDSA), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_port::{build_claims, expiration_at};
    use crate::domain::test_keys;
    use crate::domain_model::{ID_CLAIM, SUBJECT_CLAIM};
    use chrono::{Duration, Utc};

    #[test]
    fn issued_token_is_compact_jwt() {
        let issuer = Ed25519Issuer::new(test_keys::PRIVATE_PEM.as_bytes()).unwrap();

        let iat = Utc::now();
        let mut extra = Claims::new();
        extra.insert(ID_CLAIM, "r1").insert(SUBJECT_CLAIM, "u1");
        let claims = build_claims(iat, expiration_at(iat, Duration::seconds(3600)), extra);

        let raw = issuer.issue_token(&claims).unwrap();
        assert_eq!(raw.split('.').count(), 3);
    }
}
