//! In-memory reference ledger.
//!
//! Tracks per-(account, token) balances, per-(owner, spender, token)
//! allowances and per-(owner, token) authorization nonces. Every mutation
//! validates first and writes last, so a failed call leaves the ledger
//! unchanged.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use swapdesk_types::{
    constants, AccountId, Amount, Result, SignedPermit, SwapdeskError, TokenId, TokenInfo,
};

use crate::compliance::ComplianceRules;
use crate::ledger::Ledger;
use crate::supply_conservation::SupplyConservation;

#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    tokens: HashMap<TokenId, TokenInfo>,
    balances: HashMap<(AccountId, TokenId), Amount>,
    allowances: HashMap<(AccountId, AccountId, TokenId), Amount>,
    nonces: HashMap<(AccountId, TokenId), u64>,
    compliance: ComplianceRules,
    supply: SupplyConservation,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token with its metadata.
    ///
    /// # Errors
    /// `Configuration` if the token already exists or declares more decimals
    /// than `u128` can scale.
    pub fn register_token(&mut self, token: impl Into<TokenId>, info: TokenInfo) -> Result<()> {
        let token = token.into();
        if info.decimals > constants::MAX_TOKEN_DECIMALS {
            return Err(SwapdeskError::Configuration(format!(
                "token {token} declares {} decimals, max is {}",
                info.decimals,
                constants::MAX_TOKEN_DECIMALS
            )));
        }
        if self.tokens.contains_key(&token) {
            return Err(SwapdeskError::Configuration(format!(
                "token {token} is already registered"
            )));
        }
        tracing::debug!(token = %token, decimals = info.decimals, "Token registered");
        self.tokens.insert(token, info);
        Ok(())
    }

    /// Issue new supply to `to`.
    pub fn mint(&mut self, token: &TokenId, to: &AccountId, amount: Amount) -> Result<()> {
        self.ensure_registered(token)?;
        let credited = self
            .balance_of(to, token)
            .checked_add(amount)
            .ok_or(SwapdeskError::ArithmeticOverflow { context: "mint" })?;
        self.supply.record_mint(token, amount)?;
        self.balances.insert((*to, token.clone()), credited);
        Ok(())
    }

    /// Destroy supply held by `from`.
    pub fn burn(&mut self, token: &TokenId, from: &AccountId, amount: Amount) -> Result<()> {
        self.ensure_registered(token)?;
        let available = self.balance_of(from, token);
        let remaining =
            available
                .checked_sub(amount)
                .ok_or(SwapdeskError::InsufficientLiquidity {
                    requested: amount,
                    available,
                })?;
        self.supply.record_burn(token, amount)?;
        self.balances.insert((*from, token.clone()), remaining);
        Ok(())
    }

    pub fn compliance_mut(&mut self) -> &mut ComplianceRules {
        &mut self.compliance
    }

    /// Sum of all balances of `token`.
    #[must_use]
    pub fn total_supply(&self, token: &TokenId) -> Amount {
        self.balances
            .iter()
            .filter(|((_, t), _)| t == token)
            .fold(0u128, |acc, (_, amount)| acc.saturating_add(*amount))
    }

    /// Check that balances of `token` still add up to its issuance.
    pub fn verify_supply(&self, token: &TokenId) -> Result<()> {
        self.supply.verify(token, self.total_supply(token))
    }

    /// [`Self::verify_supply`] for every token ever issued.
    pub fn verify_all_supply(&self) -> Result<()> {
        self.supply
            .tracked_tokens()
            .iter()
            .try_for_each(|token| self.verify_supply(token))
    }

    fn ensure_registered(&self, token: &TokenId) -> Result<()> {
        if self.tokens.contains_key(token) {
            Ok(())
        } else {
            Err(SwapdeskError::UnknownToken(token.clone()))
        }
    }

    /// Validate and apply a balance move. Caller has already handled
    /// allowance.
    fn move_balance(
        &mut self,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        self.ensure_registered(token)?;
        self.compliance.check(token, from, to)?;

        let available = self.balance_of(from, token);
        if available < amount {
            return Err(SwapdeskError::InsufficientLiquidity {
                requested: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(to, token)
            .checked_add(amount)
            .ok_or(SwapdeskError::ArithmeticOverflow { context: "transfer" })?;

        self.balances
            .insert((*from, token.clone()), available - amount);
        self.balances.insert((*to, token.clone()), credited);

        tracing::debug!(
            token = %token,
            from = %from.short(),
            to = %to.short(),
            amount,
            "Transfer applied"
        );
        Ok(())
    }

    fn redeem(&mut self, signed: &SignedPermit, now: DateTime<Utc>) -> Result<()> {
        let permit = &signed.permit;
        if !self.tokens.contains_key(&permit.token) {
            return Err(SwapdeskError::InvalidAuthorization {
                reason: format!("unknown token {}", permit.token),
            });
        }
        if permit.is_expired_at(now) {
            return Err(SwapdeskError::InvalidAuthorization {
                reason: format!("permit expired at {}", permit.deadline),
            });
        }
        let expected = self.nonce(&permit.owner, &permit.token);
        if permit.nonce != expected {
            return Err(SwapdeskError::InvalidAuthorization {
                reason: format!("nonce {} does not match expected {expected}", permit.nonce),
            });
        }
        signed.verify_signature()?;

        self.allowances.insert(
            (permit.owner, permit.spender, permit.token.clone()),
            permit.value,
        );
        self.nonces
            .insert((permit.owner, permit.token.clone()), expected + 1);
        Ok(())
    }
}

impl Ledger for InMemoryLedger {
    fn token_info(&self, token: &TokenId) -> Result<TokenInfo> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| SwapdeskError::UnknownToken(token.clone()))
    }

    fn balance_of(&self, owner: &AccountId, token: &TokenId) -> Amount {
        self.balances
            .get(&(*owner, token.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId, token: &TokenId) -> Amount {
        self.allowances
            .get(&(*owner, *spender, token.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn nonce(&self, owner: &AccountId, token: &TokenId) -> u64 {
        self.nonces
            .get(&(*owner, token.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn approve(
        &mut self,
        token: &TokenId,
        owner: &AccountId,
        spender: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        self.ensure_registered(token)?;
        self.allowances
            .insert((*owner, *spender, token.clone()), amount);
        Ok(())
    }

    fn can_transfer(
        &self,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
        _amount: Amount,
    ) -> Result<()> {
        self.ensure_registered(token)?;
        self.compliance.check(token, from, to)
    }

    fn transfer(
        &mut self,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        self.move_balance(token, from, to, amount)
    }

    fn transfer_from(
        &mut self,
        token: &TokenId,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        let allowed = self.allowance(from, spender, token);
        if allowed < amount {
            return Err(SwapdeskError::InsufficientLiquidity {
                requested: amount,
                available: allowed,
            });
        }
        self.move_balance(token, from, to, amount)?;
        self.allowances
            .insert((*from, *spender, token.clone()), allowed - amount);
        Ok(())
    }

    fn authorize(&mut self, permit: &SignedPermit, now: DateTime<Utc>) -> Result<()> {
        let result = self.redeem(permit, now);
        match &result {
            Ok(()) => tracing::debug!(
                owner = %permit.owner.short(),
                spender = %permit.spender.short(),
                token = %permit.token,
                value = permit.value,
                nonce = permit.nonce,
                "Permit redeemed"
            ),
            Err(e) => tracing::warn!(
                owner = %permit.owner.short(),
                token = %permit.token,
                nonce = permit.nonce,
                error = %e,
                "Permit rejected"
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use swapdesk_types::{test_keypair, Permit};

    use super::*;

    const ALICE: AccountId = AccountId([1u8; 32]);
    const BOB: AccountId = AccountId([2u8; 32]);
    const DESK: AccountId = AccountId([3u8; 32]);

    fn usdc() -> TokenId {
        TokenId::from("USDC")
    }

    fn ledger() -> InMemoryLedger {
        let mut l = InMemoryLedger::new();
        l.register_token("USDC", TokenInfo::new(6, "USDC", "USD Coin"))
            .unwrap();
        l.mint(&usdc(), &ALICE, 1_000).unwrap();
        l
    }

    #[test]
    fn register_rejects_duplicates_and_huge_decimals() {
        let mut l = ledger();
        assert!(matches!(
            l.register_token("USDC", TokenInfo::new(6, "USDC", "again")),
            Err(SwapdeskError::Configuration(_))
        ));
        assert!(l
            .register_token("BIG", TokenInfo::new(39, "BIG", "too many decimals"))
            .is_err());
    }

    #[test]
    fn unknown_token() {
        let l = ledger();
        let err = l.token_info(&TokenId::from("NOPE")).unwrap_err();
        assert!(matches!(err, SwapdeskError::UnknownToken(_)));
    }

    #[test]
    fn transfer_moves_balance() {
        let mut l = ledger();
        l.transfer(&usdc(), &ALICE, &BOB, 400).unwrap();
        assert_eq!(l.balance_of(&ALICE, &usdc()), 600);
        assert_eq!(l.balance_of(&BOB, &usdc()), 400);
        l.verify_supply(&usdc()).unwrap();
    }

    #[test]
    fn transfer_insufficient_balance_leaves_state() {
        let mut l = ledger();
        let err = l.transfer(&usdc(), &ALICE, &BOB, 1_001).unwrap_err();
        assert!(matches!(
            err,
            SwapdeskError::InsufficientLiquidity {
                requested: 1_001,
                available: 1_000
            }
        ));
        assert_eq!(l.balance_of(&ALICE, &usdc()), 1_000);
        assert_eq!(l.balance_of(&BOB, &usdc()), 0);
    }

    #[test]
    fn transfer_from_consumes_allowance() {
        let mut l = ledger();
        l.approve(&usdc(), &ALICE, &DESK, 300).unwrap();
        l.transfer_from(&usdc(), &DESK, &ALICE, &BOB, 200).unwrap();
        assert_eq!(l.allowance(&ALICE, &DESK, &usdc()), 100);
        let err = l.transfer_from(&usdc(), &DESK, &ALICE, &BOB, 101).unwrap_err();
        assert!(matches!(err, SwapdeskError::InsufficientLiquidity { .. }));
        assert_eq!(l.balance_of(&BOB, &usdc()), 200);
    }

    #[test]
    fn compliance_rejection_keeps_allowance() {
        let mut l = ledger();
        l.approve(&usdc(), &ALICE, &DESK, 300).unwrap();
        l.compliance_mut().freeze_account(&usdc(), BOB);
        let err = l.transfer_from(&usdc(), &DESK, &ALICE, &BOB, 100).unwrap_err();
        assert!(matches!(err, SwapdeskError::TransferRejected { .. }));
        assert_eq!(l.allowance(&ALICE, &DESK, &usdc()), 300);
        assert!(l.can_transfer(&usdc(), &ALICE, &BOB, 1).is_err());
        assert!(l.can_transfer(&usdc(), &ALICE, &DESK, 1).is_ok());
    }

    #[test]
    fn burn_reduces_supply() {
        let mut l = ledger();
        l.burn(&usdc(), &ALICE, 250).unwrap();
        assert_eq!(l.total_supply(&usdc()), 750);
        l.verify_all_supply().unwrap();
        assert!(l.burn(&usdc(), &ALICE, 751).is_err());
    }

    #[test]
    fn permit_sets_allowance_and_bumps_nonce() {
        let (key, owner) = test_keypair();
        let mut l = ledger();
        let now = Utc::now();
        let permit = Permit {
            owner,
            spender: DESK,
            token: usdc(),
            value: 500,
            nonce: 0,
            deadline: now + Duration::minutes(5),
        }
        .sign(&key);

        l.authorize(&permit, now).unwrap();
        assert_eq!(l.allowance(&owner, &DESK, &usdc()), 500);
        assert_eq!(l.nonce(&owner, &usdc()), 1);

        // Replay fails on the nonce.
        let err = l.authorize(&permit, now).unwrap_err();
        assert!(format!("{err}").contains("nonce"));
    }

    #[test]
    fn expired_permit_rejected() {
        let (key, owner) = test_keypair();
        let mut l = ledger();
        let now = Utc::now();
        let permit = Permit {
            owner,
            spender: DESK,
            token: usdc(),
            value: 500,
            nonce: 0,
            deadline: now - Duration::seconds(1),
        }
        .sign(&key);
        let err = l.authorize(&permit, now).unwrap_err();
        assert!(matches!(err, SwapdeskError::InvalidAuthorization { .. }));
        assert_eq!(l.nonce(&owner, &usdc()), 0);
        assert_eq!(l.allowance(&owner, &DESK, &usdc()), 0);
    }

    #[test]
    fn extended_deadline_rejected_after_signed_deadline() {
        let (key, owner) = test_keypair();
        let mut l = ledger();
        let deadline = DateTime::from_timestamp(1_900_000_000, 0).unwrap();
        let mut permit = Permit {
            owner,
            spender: DESK,
            token: usdc(),
            value: 500,
            nonce: 0,
            deadline,
        }
        .sign(&key);
        permit.permit.deadline = deadline + Duration::milliseconds(900);

        let err = l
            .authorize(&permit, deadline + Duration::milliseconds(500))
            .unwrap_err();
        assert!(matches!(err, SwapdeskError::InvalidAuthorization { .. }));
        assert_eq!(l.nonce(&owner, &usdc()), 0);
        assert_eq!(l.allowance(&owner, &DESK, &usdc()), 0);
    }

    #[test]
    fn forged_permit_rejected() {
        let (_, owner) = test_keypair();
        let (mallory, _) = test_keypair();
        let mut l = ledger();
        let now = Utc::now();
        let permit = Permit {
            owner,
            spender: DESK,
            token: usdc(),
            value: 500,
            nonce: 0,
            deadline: now + Duration::minutes(5),
        }
        .sign(&mallory);
        assert!(matches!(
            l.authorize(&permit, now),
            Err(SwapdeskError::InvalidAuthorization { .. })
        ));
    }
}
