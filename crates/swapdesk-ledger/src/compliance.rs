//! Transfer compliance gate.
//!
//! A deliberately small rule set standing in for an external compliance
//! oracle: per-token frozen accounts, and tokens that may only be held by
//! registered (identity-verified) accounts.

use std::collections::{HashMap, HashSet};

use swapdesk_types::{AccountId, Result, SwapdeskError, TokenId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplianceRules {
    frozen: HashMap<TokenId, HashSet<AccountId>>,
    registration_required: HashSet<TokenId>,
    registered: HashMap<TokenId, HashSet<AccountId>>,
}

impl ComplianceRules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Block every transfer of `token` to or from `account`.
    pub fn freeze_account(&mut self, token: &TokenId, account: AccountId) {
        self.frozen.entry(token.clone()).or_default().insert(account);
    }

    pub fn unfreeze_account(&mut self, token: &TokenId, account: &AccountId) {
        if let Some(set) = self.frozen.get_mut(token) {
            set.remove(account);
        }
    }

    /// Only registered accounts may send or receive `token`.
    pub fn require_registration(&mut self, token: &TokenId) {
        self.registration_required.insert(token.clone());
    }

    pub fn register_account(&mut self, token: &TokenId, account: AccountId) {
        self.registered
            .entry(token.clone())
            .or_default()
            .insert(account);
    }

    #[must_use]
    pub fn is_frozen(&self, token: &TokenId, account: &AccountId) -> bool {
        self.frozen
            .get(token)
            .is_some_and(|set| set.contains(account))
    }

    #[must_use]
    pub fn is_registered(&self, token: &TokenId, account: &AccountId) -> bool {
        !self.registration_required.contains(token)
            || self
                .registered
                .get(token)
                .is_some_and(|set| set.contains(account))
    }

    /// # Errors
    /// `TransferRejected` naming the first rule that refuses.
    pub fn check(&self, token: &TokenId, from: &AccountId, to: &AccountId) -> Result<()> {
        for (side, account) in [("sender", from), ("recipient", to)] {
            if self.is_frozen(token, account) {
                return Err(SwapdeskError::TransferRejected {
                    reason: format!("{side} {} is frozen for {token}", account.short()),
                });
            }
            if !self.is_registered(token, account) {
                return Err(SwapdeskError::TransferRejected {
                    reason: format!("{side} {} is not registered for {token}", account.short()),
                });
            }
        }
        Ok(())
    }
}
