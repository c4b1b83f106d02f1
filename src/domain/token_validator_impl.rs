use crate::application_port::{Mode, TokenError, TokenValidator};
use crate::domain::signing;
use crate::domain_model::{Claims, TokenKind, ID_CLAIM};
use crate::domain_port::TokenStore;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use std::sync::Arc;

/// Verifies Ed25519-signed JWTs against the configured public key and the
/// token-state store.
pub struct Ed25519Validator {
    decoding_key: DecodingKey,
    store: Arc<dyn TokenStore>,
    mode: Mode,
}

impl Ed25519Validator {
    /// Builds a validator from a PEM-encoded Ed25519 public key.
    pub fn new(
        public_key_pem: &[u8],
        store: Arc<dyn TokenStore>,
        mode: Mode,
    ) -> Result<Self, TokenError> {
        let decoding_key = signing::decoding_key_from_pem(public_key_pem)?;
        Ok(Ed25519Validator {
            decoding_key,
            store,
            mode,
        })
    }

    fn decode(&self, raw_token: &str) -> Result<Claims, TokenError> {
        let header =
            jsonwebtoken::decode_header(raw_token).map_err(|_| TokenError::MalformedToken)?;
        if header.alg != Algorithm::EdDSA {
            return Err(TokenError::UnexpectedSigningMethod);
        }

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.validate_nbf = true;
        validation.validate_aud = false;

        match jsonwebtoken::decode::<Claims>(raw_token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => Err(self.map_jwt_error(e)),
        }
    }

    // Causes outside the public contract leak library internals, so Prod
    // collapses them to InvalidToken. This is the only place the mode
    // flag is consulted.
    fn map_jwt_error(&self, e: jsonwebtoken::errors::Error) -> TokenError {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::TokenExpired,
            ErrorKind::ImmatureSignature => TokenError::TokenNotYetValid,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::InvalidAlgorithm => TokenError::UnexpectedSigningMethod,
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => TokenError::MalformedToken,
            _ if self.mode.is_prod() => TokenError::InvalidToken,
            _ => TokenError::Jwt(e),
        }
    }
}

#[async_trait::async_trait]
impl TokenValidator for Ed25519Validator {
    async fn validate_claims(
        &self,
        raw_token: &str,
        kind: TokenKind,
    ) -> Result<Claims, TokenError> {
        let claims = self.decode(raw_token)?;

        let id = match claims.get(ID_CLAIM) {
            None => return Err(TokenError::MissingId),
            Some(value) => value.as_str().ok_or(TokenError::InvalidId)?,
        };

        if !self.store.is_token_valid(kind, id).await? {
            return Err(TokenError::InvalidToken);
        }

        Ok(claims)
    }
}
