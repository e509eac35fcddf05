//! Authorize-then-invoke: the shared path of every `*_with_permit` call.
//!
//! The permit is redeemed against the staged ledger before the base
//! operation runs. If the base operation fails afterwards, the enclosing
//! transaction drops the redemption too, so the nonce is not consumed.

use swapdesk_ledger::Ledger;
use swapdesk_types::{AccountId, Result, SignedPermit, SwapdeskError, TokenId};

use crate::engine::Txn;

impl<L: Ledger> Txn<L> {
    /// Redeem `permit` for `token`, then run `op`.
    ///
    /// The permit must be signed by the caller, grant the engine account,
    /// and cover `token`.
    pub fn with_permit<T>(
        &mut self,
        caller: &AccountId,
        permit: &SignedPermit,
        token: &TokenId,
        op: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.ensure_running()?;
        if permit.owner != *caller {
            return Err(SwapdeskError::InvalidAuthorization {
                reason: format!(
                    "permit owner {} is not the caller {}",
                    permit.owner.short(),
                    caller.short()
                ),
            });
        }
        if permit.spender != self.settings.engine_account {
            return Err(SwapdeskError::InvalidAuthorization {
                reason: format!("permit spender {} is not the engine", permit.spender.short()),
            });
        }
        if permit.token != *token {
            return Err(SwapdeskError::InvalidAuthorization {
                reason: format!("permit covers {}, operation needs {token}", permit.token),
            });
        }
        let now = self.state.period.timestamp;
        self.ledger.authorize(permit, now)?;
        op(self)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use swapdesk_ledger::InMemoryLedger;
    use swapdesk_types::{
        test_keypair, EngineConfig, NewOffer, Permit, TokenInfo, TokenType,
    };

    use super::*;
    use crate::Engine;

    const DESK: AccountId = AccountId([0xD0; 32]);
    const ADMIN: AccountId = AccountId([0xAD; 32]);

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
        engine
    }

    fn permit(owner: AccountId, spender: AccountId, token: TokenId, e: &Engine<InMemoryLedger>) -> Permit {
        Permit {
            owner,
            spender,
            token,
            value: 1_000,
            nonce: 0,
            deadline: e.period().timestamp + Duration::hours(1),
        }
    }

    #[test]
    fn create_with_permit_sets_allowance() {
        let mut e = engine();
        let (key, seller) = test_keypair();
        let signed = permit(seller, DESK, rtt(), &e).sign(&key);
        let id = e
            .create_offer_with_permit(&seller, NewOffer::public("RTT", "USDC", 1, 500), &signed)
            .unwrap();
        assert_eq!(e.ledger().allowance(&seller, &DESK, &rtt()), 1_000);
        assert_eq!(e.ledger().nonce(&seller, &rtt()), 1);
        assert_eq!(e.get_initial_offer(id).unwrap().seller, seller);
    }

    #[test]
    fn permit_from_someone_else_rejected() {
        let mut e = engine();
        let (key, owner) = test_keypair();
        let (_, caller) = test_keypair();
        let signed = permit(owner, DESK, rtt(), &e).sign(&key);
        let err = e
            .create_offer_with_permit(&caller, NewOffer::public("RTT", "USDC", 1, 500), &signed)
            .unwrap_err();
        assert!(matches!(err, SwapdeskError::InvalidAuthorization { .. }));
        assert_eq!(e.get_offer_count(), 0);
    }

    #[test]
    fn permit_for_wrong_spender_or_token_rejected() {
        let mut e = engine();
        let (key, seller) = test_keypair();
        let wrong_spender = permit(seller, ADMIN, rtt(), &e).sign(&key);
        assert!(e
            .create_offer_with_permit(&seller, NewOffer::public("RTT", "USDC", 1, 5), &wrong_spender)
            .is_err());
        let wrong_token = permit(seller, DESK, TokenId::from("USDC"), &e).sign(&key);
        let err = e
            .create_offer_with_permit(&seller, NewOffer::public("RTT", "USDC", 1, 5), &wrong_token)
            .unwrap_err();
        assert!(format!("{err}").contains("operation needs RTT"));
    }

    #[test]
    fn failed_base_operation_keeps_nonce() {
        let mut e = engine();
        let (key, seller) = test_keypair();
        let signed = permit(seller, DESK, rtt(), &e).sign(&key);
        // Buy token not whitelisted: the create fails after redemption.
        let err = e
            .create_offer_with_permit(&seller, NewOffer::public("RTT", "DAI", 1, 5), &signed)
            .unwrap_err();
        assert!(matches!(err, SwapdeskError::TokenNotWhitelisted(_)));
        assert_eq!(e.ledger().nonce(&seller, &rtt()), 0);
        // The same permit is still good.
        e.create_offer_with_permit(&seller, NewOffer::public("RTT", "USDC", 1, 5), &signed)
            .unwrap();
    }

    #[test]
    fn expired_permit_rejected_against_period_clock() {
        let mut e = engine();
        let (key, seller) = test_keypair();
        let mut terms = permit(seller, DESK, rtt(), &e);
        terms.deadline = e.period().timestamp;
        let signed = terms.sign(&key);
        e.begin_period(e.period().timestamp + Duration::seconds(1));
        let err = e
            .create_offer_with_permit(&seller, NewOffer::public("RTT", "USDC", 1, 5), &signed)
            .unwrap_err();
        assert!(matches!(err, SwapdeskError::InvalidAuthorization { .. }));
    }
}
