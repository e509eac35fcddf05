//! Administrative controls: whitelist, fee, pause, roles, token recovery.
//!
//! None of these are blocked by pause; an admin must be able to reconfigure
//! and resume a paused engine.

use swapdesk_ledger::Ledger;
use swapdesk_types::{
    constants, AccountId, Amount, Event, Result, Role, SwapdeskError, TokenId, TokenType,
};

use crate::access::Requirement;
use crate::engine::Txn;

impl<L: Ledger> Txn<L> {
    pub fn set_whitelist(
        &mut self,
        caller: &AccountId,
        tokens: &[TokenId],
        types: &[TokenType],
    ) -> Result<()> {
        self.state.access.require(Requirement::Admin, caller)?;
        self.check_batch(&[tokens.len(), types.len()])?;
        let previous = tokens
            .iter()
            .zip(types)
            .map(|(token, ty)| self.state.registry.set(token.clone(), *ty))
            .collect();
        self.emit(Event::TokenWhitelistToggled {
            tokens: tokens.to_vec(),
            types: types.to_vec(),
            previous,
        });
        Ok(())
    }

    /// Returns the previous fee.
    pub fn set_fee(&mut self, caller: &AccountId, fee_bps: u16) -> Result<u16> {
        self.state.access.require(Requirement::Admin, caller)?;
        if fee_bps > constants::MAX_FEE_BPS {
            return Err(SwapdeskError::InvalidAmount {
                reason: format!("fee {fee_bps} bps exceeds {}", constants::MAX_FEE_BPS),
            });
        }
        let old = std::mem::replace(&mut self.state.fee_bps, fee_bps);
        self.emit(Event::FeeChanged { old, new: fee_bps });
        Ok(old)
    }

    pub fn pause(&mut self, caller: &AccountId) -> Result<()> {
        self.state.access.require(Requirement::Admin, caller)?;
        self.ensure_running()?;
        self.state.paused = true;
        self.emit(Event::Paused { account: *caller });
        Ok(())
    }

    pub fn unpause(&mut self, caller: &AccountId) -> Result<()> {
        self.state.access.require(Requirement::Admin, caller)?;
        if !self.state.paused {
            return Err(SwapdeskError::NotPaused);
        }
        self.state.paused = false;
        self.emit(Event::Unpaused { account: *caller });
        Ok(())
    }

    /// Sweep the engine account's balance of `token` to the caller.
    pub fn save_lost_tokens(&mut self, caller: &AccountId, token: &TokenId) -> Result<Amount> {
        self.state
            .access
            .require(Requirement::ModeratorOrAdmin, caller)?;
        let engine_account = self.settings.engine_account;
        let amount = self.ledger.balance_of(&engine_account, token);
        if amount > 0 {
            self.ledger.transfer(token, &engine_account, caller, amount)?;
        }
        self.emit(Event::LostTokensRecovered {
            token: token.clone(),
            to: *caller,
            amount,
        });
        Ok(amount)
    }

    pub fn grant_role(&mut self, caller: &AccountId, role: Role, account: AccountId) -> Result<bool> {
        self.state.access.require(Requirement::Admin, caller)?;
        let changed = self.state.access.grant(role, account);
        if changed {
            self.emit(Event::RoleGranted {
                role,
                account,
                sender: *caller,
            });
        }
        Ok(changed)
    }

    pub fn revoke_role(&mut self, caller: &AccountId, role: Role, account: AccountId) -> Result<bool> {
        self.state.access.require(Requirement::Admin, caller)?;
        let changed = self.state.access.revoke(role, &account);
        if changed {
            self.emit(Event::RoleRevoked {
                role,
                account,
                sender: *caller,
            });
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use swapdesk_ledger::InMemoryLedger;
    use swapdesk_types::{EngineConfig, NewOffer, TokenInfo};

    use super::*;
    use crate::Engine;

    const DESK: AccountId = AccountId([0xD0; 32]);
    const ADMIN: AccountId = AccountId([0xAD; 32]);
    const MODERATOR: AccountId = AccountId([0x30; 32]);
    const USER: AccountId = AccountId([1u8; 32]);

    fn rtt() -> TokenId {
        TokenId::from("RTT")
    }

    fn engine() -> Engine<InMemoryLedger> {
        let mut ledger = InMemoryLedger::new();
        ledger
            .register_token("RTT", TokenInfo::new(18, "RTT", "Real Token Test"))
            .unwrap();
        let config = EngineConfig::new(DESK, ADMIN).with_moderator(MODERATOR);
        Engine::new(&config, ledger, Utc::now()).unwrap()
    }

    #[test]
    fn whitelist_toggle_twice_restores() {
        let mut e = engine();
        assert!(!e.is_whitelisted(&rtt()));
        e.set_whitelist(&ADMIN, &[rtt()], &[TokenType::SecurityToken]).unwrap();
        assert!(e.is_whitelisted(&rtt()));
        e.set_whitelist(&ADMIN, &[rtt()], &[TokenType::NotWhitelisted]).unwrap();
        assert!(!e.is_whitelisted(&rtt()));

        let last = &e.events().last().unwrap().event;
        assert_eq!(
            *last,
            Event::TokenWhitelistToggled {
                tokens: vec![rtt()],
                types: vec![TokenType::NotWhitelisted],
                previous: vec![TokenType::SecurityToken],
            }
        );
    }

    #[test]
    fn whitelist_admin_only_and_shape_checked() {
        let mut e = engine();
        assert!(matches!(
            e.set_whitelist(&USER, &[rtt()], &[TokenType::PlainToken]),
            Err(SwapdeskError::NotAuthorized { .. })
        ));
        assert!(matches!(
            e.set_whitelist(&ADMIN, &[rtt()], &[]),
            Err(SwapdeskError::LengthMismatch { .. })
        ));
        assert_eq!(e.token_type(&rtt()), TokenType::NotWhitelisted);
    }

    #[test]
    fn fee_bounds_and_event() {
        let mut e = engine();
        e.set_fee(&ADMIN, 25).unwrap();
        assert_eq!(e.fee(), 25);
        assert!(matches!(
            e.set_fee(&ADMIN, 10_001),
            Err(SwapdeskError::InvalidAmount { .. })
        ));
        assert!(matches!(
            e.set_fee(&USER, 1),
            Err(SwapdeskError::NotAuthorized { .. })
        ));
        assert_eq!(
            e.events().last().unwrap().event,
            Event::FeeChanged { old: 0, new: 25 }
        );
    }

    #[test]
    fn pause_blocks_offer_mutations() {
        let mut e = engine();
        e.set_whitelist(&ADMIN, &[rtt()], &[TokenType::PlainToken]).unwrap();
        e.pause(&ADMIN).unwrap();
        assert!(e.is_paused());
        assert!(matches!(
            e.create_offer(&USER, NewOffer::public("RTT", "RTT", 1, 1)),
            Err(SwapdeskError::ContractPaused)
        ));
        assert!(matches!(e.pause(&ADMIN), Err(SwapdeskError::ContractPaused)));
        // Admin controls remain available.
        e.set_fee(&ADMIN, 1).unwrap();
        e.unpause(&ADMIN).unwrap();
        assert!(matches!(e.unpause(&ADMIN), Err(SwapdeskError::NotPaused)));
        e.create_offer(&USER, NewOffer::public("RTT", "RTT", 1, 1)).unwrap();
    }

    #[test]
    fn pause_admin_only() {
        let mut e = engine();
        assert!(matches!(
            e.pause(&MODERATOR),
            Err(SwapdeskError::NotAuthorized { .. })
        ));
    }

    #[test]
    fn save_lost_tokens_sweeps_engine_balance() {
        let mut e = engine();
        e.ledger_mut().mint(&rtt(), &DESK, 77).unwrap();
        assert!(matches!(
            e.save_lost_tokens(&USER, &rtt()),
            Err(SwapdeskError::NotModeratorOrAdmin { .. })
        ));
        assert_eq!(e.save_lost_tokens(&MODERATOR, &rtt()).unwrap(), 77);
        assert_eq!(e.ledger().balance_of(&MODERATOR, &rtt()), 77);
        assert_eq!(e.ledger().balance_of(&DESK, &rtt()), 0);
        assert_eq!(e.save_lost_tokens(&ADMIN, &rtt()).unwrap(), 0);
    }

    #[test]
    fn roles_emit_only_on_change() {
        let mut e = engine();
        assert!(e.grant_role(&ADMIN, Role::Moderator, USER).unwrap());
        assert!(!e.grant_role(&ADMIN, Role::Moderator, USER).unwrap());
        assert!(e.has_role(Role::Moderator, &USER));
        assert!(matches!(
            e.grant_role(&USER, Role::Admin, USER),
            Err(SwapdeskError::NotAuthorized { .. })
        ));
        assert!(e.revoke_role(&ADMIN, Role::Moderator, USER).unwrap());
        assert!(!e.revoke_role(&ADMIN, Role::Moderator, USER).unwrap());

        let kinds: Vec<_> = e.events().iter().map(|r| r.event.kind()).collect();
        assert_eq!(kinds, vec!["role_granted", "role_revoked"]);
    }
}
