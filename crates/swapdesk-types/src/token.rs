//! Token registry types: whitelist classification and ledger metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of a token in the whitelist.
///
/// Any type other than [`TokenType::NotWhitelisted`] enables the token as an
/// offer asset. The remaining variants are informative, except that
/// [`TokenType::SecurityToken`] sell tokens get a compliance pre-check when
/// an offer is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TokenType {
    #[default]
    NotWhitelisted,
    /// Compliance-gated asset (transfers subject to the ledger's rules).
    SecurityToken,
    /// Fungible asset that supports signed authorizations.
    PermitToken,
    /// Fungible asset without signed authorization support.
    PlainToken,
}

impl TokenType {
    #[must_use]
    pub fn is_whitelisted(self) -> bool {
        self != Self::NotWhitelisted
    }

    /// Numeric code, stable across versions.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::NotWhitelisted => 0,
            Self::SecurityToken => 1,
            Self::PermitToken => 2,
            Self::PlainToken => 3,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotWhitelisted => write!(f, "NOT_WHITELISTED"),
            Self::SecurityToken => write!(f, "SECURITY_TOKEN"),
            Self::PermitToken => write!(f, "PERMIT_TOKEN"),
            Self::PlainToken => write!(f, "PLAIN_TOKEN"),
        }
    }
}

/// Metadata the ledger reports for a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub decimals: u8,
    pub symbol: String,
    pub name: String,
}

impl TokenInfo {
    #[must_use]
    pub fn new(decimals: u8, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            decimals,
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_whitelisted() {
        assert_eq!(TokenType::default(), TokenType::NotWhitelisted);
        assert!(!TokenType::default().is_whitelisted());
    }

    #[test]
    fn whitelisted_types() {
        assert!(TokenType::SecurityToken.is_whitelisted());
        assert!(TokenType::PermitToken.is_whitelisted());
        assert!(TokenType::PlainToken.is_whitelisted());
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(TokenType::NotWhitelisted.code(), 0);
        assert_eq!(TokenType::SecurityToken.code(), 1);
        assert_eq!(TokenType::PermitToken.code(), 2);
        assert_eq!(TokenType::PlainToken.code(), 3);
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", TokenType::PermitToken), "PERMIT_TOKEN");
    }
}
