//! Settlement: accept an offer and move both legs in one call.
//!
//! ## Steps
//!
//! 1. **Lookup**: the offer must be in the book
//! 2. **Private offer**: a reserved offer only accepts its reserved buyer
//! 3. **Price pinning**: the caller's observed price must equal the current one
//! 4. **Front-running guard**: the offer must predate the current period
//! 5. **Liquidity**: the amount must not exceed `min(allowance, balance, amount)`
//! 6. **Price**: compute `buy_amount` with the shared pricing function
//! 7. **Dual pull**: `sell_token` seller → buyer, `buy_token` buyer → seller,
//!    both through the engine account's allowances
//! 8. **Bookkeeping**: reduce the offer, removing it at zero
//! 9. **Emit** `OfferAccepted`
//!
//! Any failure aborts the enclosing transaction, so a rejected second leg
//! also undoes the first.

use swapdesk_ledger::Ledger;
use swapdesk_types::{AccountId, Amount, Event, Fill, Offer, Result, SwapdeskError, TradeIntent};

use crate::engine::Txn;
use crate::pricing::PriceScale;

/// What the seller can deliver right now.
pub(crate) fn available<L: Ledger>(ledger: &L, engine_account: &AccountId, offer: &Offer) -> Amount {
    let allowance = ledger.allowance(&offer.seller, engine_account, &offer.sell_token);
    let balance = ledger.balance_of(&offer.seller, &offer.sell_token);
    allowance.min(balance).min(offer.amount)
}

/// `buy_token` owed for `sell_amount` at the offer's price.
pub(crate) fn quote<L: Ledger>(ledger: &L, offer: &Offer, sell_amount: Amount) -> Result<Amount> {
    let scale = PriceScale::from_info(
        &ledger.token_info(&offer.sell_token)?,
        &ledger.token_info(&offer.buy_token)?,
    );
    scale.buy_amount(sell_amount, offer.price)
}

impl<L: Ledger> Txn<L> {
    pub fn buy(&mut self, buyer: &AccountId, intent: TradeIntent) -> Result<Fill> {
        self.ensure_running()?;
        if intent.amount == 0 {
            return Err(SwapdeskError::InvalidAmount {
                reason: "buy amount must be positive".into(),
            });
        }

        let offer = self.state.book.get(intent.offer_id)?.clone();
        if !offer.is_open_to(buyer) {
            return Err(SwapdeskError::NotReservedBuyer {
                offer_id: offer.id,
            });
        }
        if intent.expected_price != offer.price {
            return Err(SwapdeskError::OfferPriceWrong {
                current: offer.price,
                supplied: intent.expected_price,
            });
        }
        if offer.created_at == self.state.period.height {
            return Err(SwapdeskError::SameBlockTrade {
                offer_id: offer.id,
                height: offer.created_at,
            });
        }

        let engine_account = self.settings.engine_account;
        let liquidity = available(&self.ledger, &engine_account, &offer);
        if intent.amount > liquidity {
            return Err(SwapdeskError::InsufficientLiquidity {
                requested: intent.amount,
                available: liquidity,
            });
        }
        let buy_amount = quote(&self.ledger, &offer, intent.amount)?;

        tracing::debug!(
            offer = %offer.id,
            amount = intent.amount,
            buy_amount,
            "Pulling both legs"
        );
        self.ledger.transfer_from(
            &offer.sell_token,
            &engine_account,
            &offer.seller,
            buyer,
            intent.amount,
        )?;
        self.ledger.transfer_from(
            &offer.buy_token,
            &engine_account,
            buyer,
            &offer.seller,
            buy_amount,
        )?;

        let remaining = self.state.book.consume(offer.id, intent.amount)?;
        self.emit(Event::OfferAccepted {
            offer_id: offer.id,
            seller: offer.seller,
            buyer: *buyer,
            sell_token: offer.sell_token.clone(),
            buy_token: offer.buy_token.clone(),
            price: offer.price,
            amount: intent.amount,
        });

        Ok(Fill {
            offer_id: offer.id,
            seller: offer.seller,
            buyer: *buyer,
            sell_token: offer.sell_token,
            buy_token: offer.buy_token,
            price: offer.price,
            amount: intent.amount,
            buy_amount,
            remaining,
        })
    }
}
