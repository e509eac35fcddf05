//! The offer book: authoritative mapping of offer ids to offer records.
//!
//! The book is pure storage. Authorization, whitelist and liquidity rules
//! are applied by the engine before it calls in here.

use std::collections::BTreeMap;

use swapdesk_types::{AccountId, Amount, Height, NewOffer, Offer, OfferId, Result, SwapdeskError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferBook {
    offers: BTreeMap<OfferId, Offer>,
    next_id: OfferId,
}

impl OfferBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new offer under the next sequential id.
    ///
    /// # Errors
    /// `InvalidAmount` if `params.amount` is zero.
    pub fn insert(&mut self, seller: AccountId, params: NewOffer, height: Height) -> Result<OfferId> {
        if params.amount == 0 {
            return Err(SwapdeskError::InvalidAmount {
                reason: "offer amount must be positive".into(),
            });
        }
        let id = self.next_id;
        self.next_id = id.next();
        self.offers.insert(
            id,
            Offer {
                id,
                sell_token: params.sell_token,
                buy_token: params.buy_token,
                seller,
                reserved_buyer: params.reserved_buyer,
                price: params.price,
                amount: params.amount,
                created_at: height,
            },
        );
        Ok(id)
    }

    pub fn get(&self, id: OfferId) -> Result<&Offer> {
        self.offers.get(&id).ok_or(SwapdeskError::OfferNotFound(id))
    }

    pub fn get_mut(&mut self, id: OfferId) -> Result<&mut Offer> {
        self.offers
            .get_mut(&id)
            .ok_or(SwapdeskError::OfferNotFound(id))
    }

    pub fn remove(&mut self, id: OfferId) -> Result<Offer> {
        self.offers
            .remove(&id)
            .ok_or(SwapdeskError::OfferNotFound(id))
    }

    /// Reduce the remaining amount of an offer, removing it at zero.
    /// Returns the amount left.
    pub fn consume(&mut self, id: OfferId, amount: Amount) -> Result<Amount> {
        let offer = self.get_mut(id)?;
        let remaining =
            offer
                .amount
                .checked_sub(amount)
                .ok_or(SwapdeskError::InsufficientLiquidity {
                    requested: amount,
                    available: offer.amount,
                })?;
        offer.amount = remaining;
        if remaining == 0 {
            self.offers.remove(&id);
        }
        Ok(remaining)
    }

    /// Number of ids ever assigned, including removed offers.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.next_id.0
    }

    /// Number of offers currently in the book.
    #[must_use]
    pub fn active(&self) -> usize {
        self.offers.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Offer> {
        self.offers.values()
    }

    pub fn by_seller<'a>(&'a self, seller: &'a AccountId) -> impl Iterator<Item = &'a Offer> + 'a {
        self.offers.values().filter(move |o| o.seller == *seller)
    }
}
