use crate::domain_model::TokenKind;

/// Separator between a token id and its kind prefix in derived keys.
/// Callers keep ids separator-free (UUIDs qualify), which makes the
/// derivation injective.
pub const KEY_SEPARATOR: &str = ".";

/// Prefix of the auxiliary key that maps a refresh token id to the id of
/// the access token issued alongside it.
pub const PARENT_REFRESH_TOKEN_PREFIX: &str = "prt";

/// Derives the store key for a token: `<id>.RT` or `<id>.AT`.
pub fn token_key(kind: TokenKind, id: &str) -> String {
    format!("{id}{KEY_SEPARATOR}{}", kind.abbreviation())
}

/// Derives the parent-link key for a refresh token: `<id>.prt`.
pub fn parent_refresh_token_key(refresh_id: &str) -> String {
    format!("{refresh_id}{KEY_SEPARATOR}{PARENT_REFRESH_TOKEN_PREFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_keys_carry_kind_prefix() {
        assert_eq!(token_key(TokenKind::RefreshToken, "r1"), "r1.RT");
        assert_eq!(token_key(TokenKind::AccessToken, "a1"), "a1.AT");
    }

    #[test]
    fn parent_key_uses_prt_prefix() {
        assert_eq!(parent_refresh_token_key("r1"), "r1.prt");
    }

    #[test]
    fn derivation_is_injective_for_separator_free_ids() {
        let keys = [
            token_key(TokenKind::RefreshToken, "x"),
            token_key(TokenKind::AccessToken, "x"),
            parent_refresh_token_key("x"),
            token_key(TokenKind::RefreshToken, "y"),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in keys.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
