use serde::{Deserialize, Serialize};
use std::fmt;

/// The two kinds of token this system tracks. The canonical strings and
/// short prefixes live here and nowhere else.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    RefreshToken,
    AccessToken,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::RefreshToken => "refresh_token",
            TokenKind::AccessToken => "access_token",
        }
    }

    /// Two-letter prefix used in derived store keys.
    pub fn abbreviation(&self) -> &'static str {
        match self {
            TokenKind::RefreshToken => "RT",
            TokenKind::AccessToken => "AT",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown token kind: {0}")]
pub struct UnknownTokenKind(pub String);

impl std::str::FromStr for TokenKind {
    type Err = UnknownTokenKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "refresh_token" => Ok(TokenKind::RefreshToken),
            "access_token" => Ok(TokenKind::AccessToken),
            other => Err(UnknownTokenKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn canonical_strings_round_trip() {
        for kind in [TokenKind::RefreshToken, TokenKind::AccessToken] {
            assert_eq!(TokenKind::from_str(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_fails_to_parse() {
        let err = TokenKind::from_str("id_token").unwrap_err();
        assert_eq!(err.0, "id_token");
    }

    #[test]
    fn abbreviations() {
        assert_eq!(TokenKind::RefreshToken.abbreviation(), "RT");
        assert_eq!(TokenKind::AccessToken.abbreviation(), "AT");
    }
}
