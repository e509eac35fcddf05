//! The ledger boundary.
//!
//! The engine never holds balances of its own. Everything it knows about
//! who owns what, and everything it moves, goes through this trait.

use chrono::{DateTime, Utc};
use swapdesk_types::{AccountId, Amount, Result, SignedPermit, TokenId, TokenInfo};

/// Balance, allowance and authorization capability of the host ledger.
///
/// Implementations must be deterministic: the same sequence of calls on
/// equal ledgers produces equal ledgers. The engine relies on this to stage
/// a call against a clone and commit the clone only on success.
pub trait Ledger {
    /// Metadata for a registered token.
    ///
    /// # Errors
    /// `UnknownToken` if the token is not registered.
    fn token_info(&self, token: &TokenId) -> Result<TokenInfo>;

    fn balance_of(&self, owner: &AccountId, token: &TokenId) -> Amount;

    fn allowance(&self, owner: &AccountId, spender: &AccountId, token: &TokenId) -> Amount;

    /// Current authorization nonce of `owner` for `token`.
    fn nonce(&self, owner: &AccountId, token: &TokenId) -> u64;

    /// Set `spender`'s allowance over `owner`'s `token` balance.
    fn approve(
        &mut self,
        token: &TokenId,
        owner: &AccountId,
        spender: &AccountId,
        amount: Amount,
    ) -> Result<()>;

    /// Compliance-only check: would a transfer of `amount` be permitted?
    /// Does not look at balances.
    ///
    /// # Errors
    /// `TransferRejected` if the compliance gate refuses.
    fn can_transfer(
        &self,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()>;

    /// Move `amount` from `from` to `to`, acting as `from`.
    fn transfer(
        &mut self,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()>;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// `spender`'s allowance.
    ///
    /// # Errors
    /// `InsufficientLiquidity` on missing balance or allowance,
    /// `TransferRejected` on compliance denial.
    fn transfer_from(
        &mut self,
        token: &TokenId,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()>;

    /// Redeem a signed authorization at time `now`: set the allowance to
    /// `permit.value` and advance the owner's nonce.
    ///
    /// # Errors
    /// `InvalidAuthorization` for a bad signature, an expired deadline, a
    /// nonce mismatch, or an unknown token.
    fn authorize(&mut self, permit: &SignedPermit, now: DateTime<Utc>) -> Result<()>;
}
