//! Offer lifecycle: create, update, delete.
//!
//! Nothing here looks at the seller's balance or allowance. Liquidity is
//! evaluated lazily by `preview_available` and at settlement.

use swapdesk_ledger::Ledger;
use swapdesk_types::{
    AccountId, Amount, Event, NewOffer, OfferId, Price, Result, SwapdeskError, TokenType,
};

use crate::access::Requirement;
use crate::engine::Txn;

impl<L: Ledger> Txn<L> {
    pub fn create_offer(&mut self, seller: &AccountId, mut params: NewOffer) -> Result<OfferId> {
        self.ensure_running()?;
        // The zero account means public on every create path.
        params.reserved_buyer = params.reserved_buyer.filter(|b| !b.is_zero());
        for token in [&params.sell_token, &params.buy_token] {
            if !self.state.registry.is_whitelisted(token) {
                return Err(SwapdeskError::TokenNotWhitelisted(token.clone()));
            }
        }
        if params.amount == 0 {
            return Err(SwapdeskError::InvalidAmount {
                reason: "offer amount must be positive".into(),
            });
        }
        if self.state.registry.token_type(&params.sell_token) == TokenType::SecurityToken {
            self.check_seller_can_transfer(seller, &params)?;
        }

        let id = self
            .state
            .book
            .insert(*seller, params, self.state.period.height)?;
        let offer = self.state.book.get(id)?;
        let event = Event::OfferCreated {
            sell_token: offer.sell_token.clone(),
            buy_token: offer.buy_token.clone(),
            seller: offer.seller,
            reserved_buyer: offer.reserved_buyer,
            offer_id: id,
            price: offer.price,
            amount: offer.amount,
        };
        self.emit(event);
        Ok(id)
    }

    /// Compliance pre-check for compliance-gated sell tokens: the seller
    /// must be allowed to send the full amount to the reserved buyer, or to
    /// the engine account for public offers.
    fn check_seller_can_transfer(&self, seller: &AccountId, params: &NewOffer) -> Result<()> {
        let recipient = params
            .reserved_buyer
            .unwrap_or(self.settings.engine_account);
        self.ledger
            .can_transfer(&params.sell_token, seller, &recipient, params.amount)
            .map_err(|e| match e {
                SwapdeskError::TransferRejected { reason } => SwapdeskError::TransferRejected {
                    reason: format!("seller can not transfer tokens: {reason}"),
                },
                other => other,
            })
    }

    pub fn update_offer(
        &mut self,
        caller: &AccountId,
        offer_id: OfferId,
        price: Price,
        amount: Amount,
    ) -> Result<()> {
        self.ensure_running()?;
        let offer = self.state.book.get_mut(offer_id)?;
        if offer.seller != *caller {
            return Err(SwapdeskError::NotSeller { offer_id });
        }
        let (old_price, old_amount) = (offer.price, offer.amount);
        offer.price = price;
        offer.amount = amount;

        self.emit(Event::OfferUpdated {
            offer_id,
            old_price,
            new_price: price,
            old_amount,
            new_amount: amount,
        });
        if amount == 0 {
            self.state.book.remove(offer_id)?;
            self.emit(Event::OfferDeleted { offer_id });
        }
        Ok(())
    }

    pub fn delete_offer(&mut self, caller: &AccountId, offer_id: OfferId) -> Result<()> {
        self.ensure_running()?;
        if self.state.book.get(offer_id)?.seller != *caller {
            return Err(SwapdeskError::NotSeller { offer_id });
        }
        self.state.book.remove(offer_id)?;
        self.emit(Event::OfferDeleted { offer_id });
        Ok(())
    }

    pub fn delete_offer_by_admin(&mut self, caller: &AccountId, offer_id: OfferId) -> Result<()> {
        self.ensure_running()?;
        self.state.access.require(Requirement::Admin, caller)?;
        self.state.book.remove(offer_id)?;
        self.emit(Event::OfferDeleted { offer_id });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use swapdesk_ledger::InMemoryLedger;
    use swapdesk_types::{EngineConfig, TokenId, TokenInfo};

    use super::*;
    use crate::Engine;

    const DESK: AccountId = AccountId([0xD0; 32]);
    const ADMIN: AccountId = AccountId([0xAD; 32]);
    const SELLER: AccountId = AccountId([1u8; 32]);
    const BUYER: AccountId = AccountId([2u8; 32]);

    fn rtt() -> TokenId {
        TokenId::from("RTT")
    }

    fn engine() -> Engine<InMemoryLedger> {
        let mut ledger = InMemoryLedger::new();
        ledger
            .register_token("RTT", TokenInfo::new(18, "RTT", "Real Token Test"))
            .unwrap();
        ledger
            .register_token("USDC", TokenInfo::new(6, "USDC", "USD Coin"))
            .unwrap();
        let mut engine = Engine::new(&EngineConfig::new(DESK, ADMIN), ledger, Utc::now()).unwrap();
        engine
            .set_whitelist(
                &ADMIN,
                &[rtt(), TokenId::from("USDC")],
                &[TokenType::SecurityToken, TokenType::PermitToken],
            )
            .unwrap();
        engine.take_events();
        engine
    }

    fn params() -> NewOffer {
        NewOffer::public("RTT", "USDC", 1_000_000, 500)
    }

    #[test]
    fn create_emits_offer_created() {
        let mut e = engine();
        let id = e.create_offer(&SELLER, params()).unwrap();
        assert_eq!(id, OfferId(0));
        let events = e.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0].event,
            Event::OfferCreated { offer_id, seller, amount: 500, .. }
                if *offer_id == id && *seller == SELLER
        ));
    }

    #[test]
    fn create_requires_both_tokens_whitelisted() {
        let mut e = engine();
        let err = e
            .create_offer(&SELLER, NewOffer::public("RTT", "DAI", 1, 1))
            .unwrap_err();
        assert!(matches!(err, SwapdeskError::TokenNotWhitelisted(t) if t.as_str() == "DAI"));
        let err = e
            .create_offer(&SELLER, NewOffer::public("DAI", "USDC", 1, 1))
            .unwrap_err();
        assert!(matches!(err, SwapdeskError::TokenNotWhitelisted(_)));
    }

    #[test]
    fn zero_amount_rejected() {
        let mut e = engine();
        let err = e
            .create_offer(&SELLER, NewOffer::public("RTT", "USDC", 1, 0))
            .unwrap_err();
        assert!(matches!(err, SwapdeskError::InvalidAmount { .. }));
    }

    #[test]
    fn security_token_compliance_precheck() {
        let mut e = engine();
        e.ledger_mut().compliance_mut().freeze_account(&rtt(), SELLER);
        let err = e.create_offer(&SELLER, params()).unwrap_err();
        assert!(
            matches!(&err, SwapdeskError::TransferRejected { reason } if reason.starts_with("seller can not transfer tokens"))
        );
        assert_eq!(e.get_offer_count(), 0);
    }

    #[test]
    fn private_offer_precheck_targets_reserved_buyer() {
        let mut e = engine();
        e.ledger_mut().compliance_mut().freeze_account(&rtt(), BUYER);
        // Public offer checks against the engine account and passes.
        e.create_offer(&SELLER, params()).unwrap();
        let err = e
            .create_offer(&SELLER, params().reserved_for(BUYER))
            .unwrap_err();
        assert!(matches!(err, SwapdeskError::TransferRejected { .. }));
    }

    #[test]
    fn zero_reserved_buyer_stored_as_public() {
        let mut e = engine();
        e.ledger_mut().mint(&rtt(), &SELLER, 500).unwrap();
        e.ledger_mut().approve(&rtt(), &SELLER, &DESK, 500).unwrap();
        e.ledger_mut().mint(&TokenId::from("USDC"), &BUYER, 1_000_000).unwrap();
        e.ledger_mut()
            .approve(&TokenId::from("USDC"), &BUYER, &DESK, 1_000_000)
            .unwrap();

        let json = format!(
            r#"{{"sell_token":"RTT","buy_token":"USDC","reserved_buyer":"{}","price":1000000,"amount":500}}"#,
            AccountId::ZERO
        );
        let params: NewOffer = serde_json::from_str(&json).unwrap();
        assert_eq!(params.reserved_buyer, Some(AccountId::ZERO));

        let id = e.create_offer(&SELLER, params).unwrap();
        assert_eq!(e.get_initial_offer(id).unwrap().reserved_buyer, None);
        assert!(matches!(
            &e.events()[0].event,
            Event::OfferCreated { reserved_buyer: None, .. }
        ));

        e.begin_period(e.period().timestamp);
        e.buy(&BUYER, id, 1_000_000, 1).unwrap();
    }

    #[test]
    fn update_by_non_seller_fails() {
        let mut e = engine();
        let id = e.create_offer(&SELLER, params()).unwrap();
        let err = e.update_offer(&BUYER, id, 2, 2).unwrap_err();
        assert!(matches!(err, SwapdeskError::NotSeller { offer_id } if offer_id == id));
    }

    #[test]
    fn update_carries_old_and_new() {
        let mut e = engine();
        let id = e.create_offer(&SELLER, params()).unwrap();
        e.take_events();
        e.update_offer(&SELLER, id, 2_000_000, 300).unwrap();
        let offer = e.get_initial_offer(id).unwrap();
        assert_eq!((offer.price, offer.amount), (2_000_000, 300));
        assert_eq!(
            e.events()[0].event,
            Event::OfferUpdated {
                offer_id: id,
                old_price: 1_000_000,
                new_price: 2_000_000,
                old_amount: 500,
                new_amount: 300,
            }
        );
    }

    #[test]
    fn update_to_zero_removes_offer() {
        let mut e = engine();
        let id = e.create_offer(&SELLER, params()).unwrap();
        e.take_events();
        e.update_offer(&SELLER, id, 1_000_000, 0).unwrap();
        assert!(matches!(
            e.get_initial_offer(id),
            Err(SwapdeskError::OfferNotFound(_))
        ));
        let kinds: Vec<_> = e.events().iter().map(|r| r.event.kind()).collect();
        assert_eq!(kinds, vec!["offer_updated", "offer_deleted"]);
    }

    #[test]
    fn delete_seller_only() {
        let mut e = engine();
        let id = e.create_offer(&SELLER, params()).unwrap();
        assert!(matches!(
            e.delete_offer(&BUYER, id),
            Err(SwapdeskError::NotSeller { .. })
        ));
        e.delete_offer(&SELLER, id).unwrap();
        assert!(matches!(
            e.delete_offer(&SELLER, id),
            Err(SwapdeskError::OfferNotFound(_))
        ));
    }

    #[test]
    fn delete_by_admin() {
        let mut e = engine();
        let id = e.create_offer(&SELLER, params()).unwrap();
        assert!(matches!(
            e.delete_offer_by_admin(&SELLER, id),
            Err(SwapdeskError::NotAuthorized { .. })
        ));
        e.delete_offer_by_admin(&ADMIN, id).unwrap();
        assert!(e.show_offer(id).is_err());
    }

    #[test]
    fn batch_mismatch_creates_nothing() {
        let mut e = engine();
        let err = e
            .create_offer_batch(
                &SELLER,
                &[rtt(), rtt()],
                &[TokenId::from("USDC"), TokenId::from("USDC")],
                &[None, None],
                &[1, 1],
                &[10],
            )
            .unwrap_err();
        assert!(matches!(err, SwapdeskError::LengthMismatch { .. }));
        assert_eq!(e.get_offer_count(), 0);
        assert!(e.events().is_empty());
    }

    #[test]
    fn batch_failure_midway_is_atomic() {
        let mut e = engine();
        let err = e
            .create_offer_batch(
                &SELLER,
                &[rtt(), rtt()],
                &[TokenId::from("USDC"), TokenId::from("DAI")],
                &[None, Some(BUYER)],
                &[1, 1],
                &[10, 10],
            )
            .unwrap_err();
        assert!(matches!(err, SwapdeskError::TokenNotWhitelisted(_)));
        assert_eq!(e.get_offer_count(), 0);
    }

    #[test]
    fn update_and_delete_batches() {
        let mut e = engine();
        let ids = e
            .create_offer_batch(
                &SELLER,
                &[rtt(), rtt()],
                &[TokenId::from("USDC"), TokenId::from("USDC")],
                &[None, Some(AccountId::ZERO)],
                &[1, 2],
                &[10, 20],
            )
            .unwrap();
        assert_eq!(ids, vec![OfferId(0), OfferId(1)]);
        assert_eq!(e.get_initial_offer(ids[1]).unwrap().reserved_buyer, None);

        e.update_offer_batch(&SELLER, &ids, &[3, 4], &[30, 40]).unwrap();
        assert_eq!(e.get_initial_offer(ids[1]).unwrap().amount, 40);
        assert!(matches!(
            e.update_offer_batch(&SELLER, &ids, &[3], &[30, 40]),
            Err(SwapdeskError::LengthMismatch { .. })
        ));

        e.delete_offer_batch(&SELLER, &ids).unwrap();
        assert_eq!(e.offers().count(), 0);
        assert_eq!(e.get_offer_count(), 2);
    }
}
