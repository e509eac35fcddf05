//! Token whitelist.

use std::collections::BTreeMap;

use swapdesk_types::{TokenId, TokenType};

/// Maps token identity to its whitelist classification. Unknown tokens are
/// [`TokenType::NotWhitelisted`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenRegistry {
    types: BTreeMap<TokenId, TokenType>,
}

impl TokenRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the classification and return the previous one.
    pub fn set(&mut self, token: TokenId, token_type: TokenType) -> TokenType {
        let previous = if token_type.is_whitelisted() {
            self.types.insert(token, token_type)
        } else {
            self.types.remove(&token)
        };
        previous.unwrap_or_default()
    }

    #[must_use]
    pub fn token_type(&self, token: &TokenId) -> TokenType {
        self.types.get(token).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn is_whitelisted(&self, token: &TokenId) -> bool {
        self.token_type(token).is_whitelisted()
    }

    /// Whitelisted tokens in identity order.
    pub fn whitelisted(&self) -> impl Iterator<Item = (&TokenId, TokenType)> {
        self.types.iter().map(|(token, ty)| (token, *ty))
    }
}
