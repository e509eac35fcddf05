//! Offer records and the values derived from them.
//!
//! An [`Offer`] is a standing, partially fillable commitment by a seller to
//! exchange `sell_token` for `buy_token` at a fixed `price`. The engine never
//! holds the seller's funds: `amount` is only the ceiling the seller is
//! willing to sell, and the spendable quantity is recomputed against the
//! ledger on every read (see [`OfferView::available`]).

use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, Height, OfferId, Price, TokenId};

/// A stored offer.
///
/// Invariant: `amount > 0` for every offer present in the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub sell_token: TokenId,
    pub buy_token: TokenId,
    pub seller: AccountId,
    /// If set, only this account may accept the offer.
    pub reserved_buyer: Option<AccountId>,
    /// `buy_token` base units per whole unit of `sell_token`.
    pub price: Price,
    /// Remaining `sell_token` quantity.
    pub amount: Amount,
    /// Settlement period in which the offer was created.
    pub created_at: Height,
}

impl Offer {
    /// Whether `account` may accept this offer.
    #[must_use]
    pub fn is_open_to(&self, account: &AccountId) -> bool {
        self.reserved_buyer.is_none_or(|reserved| reserved == *account)
    }

    #[must_use]
    pub fn is_private(&self) -> bool {
        self.reserved_buyer.is_some()
    }
}

/// Parameters of a new offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOffer {
    pub sell_token: TokenId,
    pub buy_token: TokenId,
    pub reserved_buyer: Option<AccountId>,
    pub price: Price,
    pub amount: Amount,
}

impl NewOffer {
    #[must_use]
    pub fn public(
        sell_token: impl Into<TokenId>,
        buy_token: impl Into<TokenId>,
        price: Price,
        amount: Amount,
    ) -> Self {
        Self {
            sell_token: sell_token.into(),
            buy_token: buy_token.into(),
            reserved_buyer: None,
            price,
            amount,
        }
    }

    /// Restrict the offer to a single buyer. The zero account means public.
    #[must_use]
    pub fn reserved_for(mut self, buyer: AccountId) -> Self {
        self.reserved_buyer = (!buyer.is_zero()).then_some(buyer);
        self
    }
}

/// Public read of an offer: the stored terms plus the quantity the seller
/// can actually deliver right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferView {
    pub id: OfferId,
    pub sell_token: TokenId,
    pub buy_token: TokenId,
    pub seller: AccountId,
    pub reserved_buyer: Option<AccountId>,
    pub price: Price,
    /// `min(allowance, balance, amount)` at read time.
    pub available: Amount,
}

/// The parameters of one acceptance. Exists only for a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeIntent {
    pub offer_id: OfferId,
    /// The price the buyer observed; must equal the current offer price.
    pub expected_price: Price,
    /// `sell_token` quantity to take.
    pub amount: Amount,
}

/// Outcome of a settled acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub offer_id: OfferId,
    pub seller: AccountId,
    pub buyer: AccountId,
    pub sell_token: TokenId,
    pub buy_token: TokenId,
    pub price: Price,
    /// `sell_token` moved seller → buyer.
    pub amount: Amount,
    /// `buy_token` moved buyer → seller.
    pub buy_amount: Amount,
    /// Offer amount left after the fill. Zero means the offer was removed.
    pub remaining: Amount,
}

impl Fill {
    #[must_use]
    pub fn exhausted(&self) -> bool {
        self.remaining == 0
    }
}

impl std::fmt::Display for Fill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Fill[{}] {} {} for {} {} @ {}",
            self.offer_id, self.amount, self.sell_token, self.buy_amount, self.buy_token, self.price,
        )
    }
}
