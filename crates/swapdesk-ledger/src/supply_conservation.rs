//! Supply conservation invariant checker.
//!
//! ```text
//! ∀ token: Σ(balances) == Σ(minted) - Σ(burned)
//! ```
//!
//! Transfers move value between accounts and never change the total. If
//! the sum of balances drifts from the issuance record, value was created
//! or destroyed somewhere it must not be.

use std::collections::{BTreeSet, HashMap};

use swapdesk_types::{Amount, Result, SwapdeskError, TokenId};

/// Tracks per-token issuance and validates balances against it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupplyConservation {
    minted: HashMap<TokenId, Amount>,
    burned: HashMap<TokenId, Amount>,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_mint(&mut self, token: &TokenId, amount: Amount) -> Result<()> {
        let total = self.minted.entry(token.clone()).or_insert(0);
        *total = total
            .checked_add(amount)
            .ok_or(SwapdeskError::ArithmeticOverflow {
                context: "minted supply",
            })?;
        Ok(())
    }

    pub fn record_burn(&mut self, token: &TokenId, amount: Amount) -> Result<()> {
        let total = self.burned.entry(token.clone()).or_insert(0);
        *total = total
            .checked_add(amount)
            .ok_or(SwapdeskError::ArithmeticOverflow {
                context: "burned supply",
            })?;
        Ok(())
    }

    #[must_use]
    pub fn total_minted(&self, token: &TokenId) -> Amount {
        self.minted.get(token).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_burned(&self, token: &TokenId) -> Amount {
        self.burned.get(token).copied().unwrap_or(0)
    }

    /// Minted minus burned.
    #[must_use]
    pub fn expected_supply(&self, token: &TokenId) -> Amount {
        self.total_minted(token)
            .saturating_sub(self.total_burned(token))
    }

    /// Compare `actual_supply` (sum of balances) to the issuance record.
    ///
    /// # Errors
    /// [`SwapdeskError::SupplyInvariantViolation`] if they differ.
    pub fn verify(&self, token: &TokenId, actual_supply: Amount) -> Result<()> {
        let expected = self.expected_supply(token);
        if actual_supply != expected {
            return Err(SwapdeskError::SupplyInvariantViolation {
                reason: format!(
                    "token {token}: actual supply {actual_supply} != expected {expected} \
                     (minted={}, burned={})",
                    self.total_minted(token),
                    self.total_burned(token),
                ),
            });
        }
        Ok(())
    }

    /// Every token with recorded issuance, sorted.
    #[must_use]
    pub fn tracked_tokens(&self) -> Vec<TokenId> {
        let tokens: BTreeSet<&TokenId> = self.minted.keys().chain(self.burned.keys()).collect();
        tokens.into_iter().cloned().collect()
    }
}
