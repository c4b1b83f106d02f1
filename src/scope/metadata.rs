use std::collections::HashMap;

/// Metadata entry carrying the bearer credential.
pub const AUTHORIZATION_METADATA_KEY: &str = "authorization";

/// Scheme prefix of the authorization value. Case-sensitive.
pub const BEARER_PREFIX: &str = "Bearer";

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum MetadataError {
    #[error("authorization metadata is not provided")]
    AuthorizationMetadataNotProvided,
    #[error("authorization metadata invalid")]
    AuthorizationMetadataInvalid,
}

/// Read-only view over transport metadata (HTTP headers, RPC metadata).
pub trait MetadataMap {
    fn get(&self, key: &str) -> Option<&str>;
}

impl MetadataMap for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        HashMap::get(self, key).map(String::as_str)
    }
}

/// Extracts the compact JWT from an `authorization` value of the exact
/// shape `Bearer <token>`: two space-delimited fields, case-sensitive
/// scheme.
pub fn bearer_from_authorization(value: &str) -> Result<&str, MetadataError> {
    let fields: Vec<&str> = value.split(' ').collect();
    if fields.len() != 2 || fields[0] != BEARER_PREFIX {
        return Err(MetadataError::AuthorizationMetadataInvalid);
    }
    Ok(fields[1])
}

/// Reads the `authorization` metadata entry and extracts its bearer token.
pub fn bearer_from_metadata(metadata: &dyn MetadataMap) -> Result<String, MetadataError> {
    let value = metadata
        .get(AUTHORIZATION_METADATA_KEY)
        .ok_or(MetadataError::AuthorizationMetadataNotProvided)?;
    bearer_from_authorization(value).map(str::to_string)
}
