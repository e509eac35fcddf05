//! Events emitted by the engine for indexers and observers.
//!
//! Events are only published for committed calls. A call that fails leaves
//! no events behind.

use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, Height, OfferId, Price, Role, TokenId, TokenType};

/// A state change observable from outside the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    OfferCreated {
        sell_token: TokenId,
        buy_token: TokenId,
        seller: AccountId,
        reserved_buyer: Option<AccountId>,
        offer_id: OfferId,
        price: Price,
        amount: Amount,
    },
    OfferUpdated {
        offer_id: OfferId,
        old_price: Price,
        new_price: Price,
        old_amount: Amount,
        new_amount: Amount,
    },
    OfferDeleted {
        offer_id: OfferId,
    },
    OfferAccepted {
        offer_id: OfferId,
        seller: AccountId,
        buyer: AccountId,
        sell_token: TokenId,
        buy_token: TokenId,
        price: Price,
        amount: Amount,
    },
    /// One per `set_whitelist` call. `previous[i]` is the type `tokens[i]`
    /// had before the call, `types[i]` the type it has now.
    TokenWhitelistToggled {
        tokens: Vec<TokenId>,
        types: Vec<TokenType>,
        previous: Vec<TokenType>,
    },
    FeeChanged {
        old: u16,
        new: u16,
    },
    Paused {
        account: AccountId,
    },
    Unpaused {
        account: AccountId,
    },
    RoleGranted {
        role: Role,
        account: AccountId,
        sender: AccountId,
    },
    RoleRevoked {
        role: Role,
        account: AccountId,
        sender: AccountId,
    },
    LostTokensRecovered {
        token: TokenId,
        to: AccountId,
        amount: Amount,
    },
}

impl Event {
    /// Short name for log lines.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OfferCreated { .. } => "offer_created",
            Self::OfferUpdated { .. } => "offer_updated",
            Self::OfferDeleted { .. } => "offer_deleted",
            Self::OfferAccepted { .. } => "offer_accepted",
            Self::TokenWhitelistToggled { .. } => "token_whitelist_toggled",
            Self::FeeChanged { .. } => "fee_changed",
            Self::Paused { .. } => "paused",
            Self::Unpaused { .. } => "unpaused",
            Self::RoleGranted { .. } => "role_granted",
            Self::RoleRevoked { .. } => "role_revoked",
            Self::LostTokensRecovered { .. } => "lost_tokens_recovered",
        }
    }

    /// The offer this event refers to, if any.
    #[must_use]
    pub fn offer_id(&self) -> Option<OfferId> {
        match self {
            Self::OfferCreated { offer_id, .. }
            | Self::OfferUpdated { offer_id, .. }
            | Self::OfferDeleted { offer_id }
            | Self::OfferAccepted { offer_id, .. } => Some(*offer_id),
            _ => None,
        }
    }
}

/// A committed event with its position in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Settlement period the emitting call ran in.
    pub height: Height,
    /// Position in the log, starting at zero. Gap-free across commits.
    pub sequence: u64,
    pub event: Event,
}
