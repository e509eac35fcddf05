//! Error types for the Swapdesk engine.
//!
//! All errors use the `SD_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Offer errors
//! - 2xx: Ledger / transfer errors
//! - 3xx: Registry and batch-shape errors
//! - 4xx: Access control errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{AccountId, Amount, Height, OfferId, Price, TokenId};

/// Central error enum for all Swapdesk operations.
#[derive(Debug, Error)]
pub enum SwapdeskError {
    // =================================================================
    // Offer Errors (1xx)
    // =================================================================
    /// No active offer exists under this id.
    #[error("SD_ERR_100: Offer not found: {0}")]
    OfferNotFound(OfferId),

    /// Only the seller may change or delete the offer.
    #[error("SD_ERR_101: Only the seller can modify {offer_id}")]
    NotSeller { offer_id: OfferId },

    /// The offer is private and reserved for another buyer.
    #[error("SD_ERR_102: {offer_id} is reserved for another buyer")]
    NotReservedBuyer { offer_id: OfferId },

    /// The price the buyer observed differs from the current offer price.
    #[error("SD_ERR_103: Offer price wrong: current {current}, supplied {supplied}")]
    OfferPriceWrong { current: Price, supplied: Price },

    /// The offer was created in the current settlement period.
    #[error("SD_ERR_104: {offer_id} cannot be accepted in its creation period ({height})")]
    SameBlockTrade { offer_id: OfferId, height: Height },

    /// An amount or parameter is out of range.
    #[error("SD_ERR_105: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    // =================================================================
    // Ledger Errors (2xx)
    // =================================================================
    /// Requested more than the spendable balance/allowance.
    #[error("SD_ERR_200: Insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity { requested: Amount, available: Amount },

    /// The ledger refused the transfer (compliance denial).
    #[error("SD_ERR_201: Transfer rejected: {reason}")]
    TransferRejected { reason: String },

    /// A signed authorization was malformed, expired, replayed or forged.
    #[error("SD_ERR_202: Invalid authorization: {reason}")]
    InvalidAuthorization { reason: String },

    /// Integer arithmetic would overflow.
    #[error("SD_ERR_203: Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: &'static str },

    /// The ledger has no metadata for this token.
    #[error("SD_ERR_204: Unknown token: {0}")]
    UnknownToken(TokenId),

    /// Ledger balances no longer add up to minted minus burned supply.
    #[error("SD_ERR_205: Supply invariant violated: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // Registry Errors (3xx)
    // =================================================================
    /// The token is not whitelisted as an offer asset.
    #[error("SD_ERR_300: Token is not whitelisted: {0}")]
    TokenNotWhitelisted(TokenId),

    /// Parallel batch inputs differ in length.
    #[error("SD_ERR_301: Length mismatch: {lengths:?}")]
    LengthMismatch { lengths: Vec<usize> },

    /// Batch exceeds the configured maximum length.
    #[error("SD_ERR_302: Batch too large: {len} > {max}")]
    BatchTooLarge { len: usize, max: usize },

    // =================================================================
    // Access Errors (4xx)
    // =================================================================
    /// The caller lacks the Admin role.
    #[error("SD_ERR_400: Account {account} is not authorized")]
    NotAuthorized { account: AccountId },

    /// The caller is neither Moderator nor Admin.
    #[error("SD_ERR_401: Account {account} is not moderator or admin")]
    NotModeratorOrAdmin { account: AccountId },

    /// State-mutating operations are disabled.
    #[error("SD_ERR_402: Engine is paused")]
    ContractPaused,

    /// `unpause` was called while the engine is running.
    #[error("SD_ERR_403: Engine is not paused")]
    NotPaused,

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("SD_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("SD_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("SD_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("SD_ERR_903: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SwapdeskError>;

impl From<std::io::Error> for SwapdeskError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SwapdeskError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
