//! # swapdesk-types
//!
//! Shared types, errors, and configuration for the **Swapdesk** offer book
//! and settlement engine.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`TokenId`], [`OfferId`], [`Height`], [`Amount`], [`Price`]
//! - **Offer model**: [`Offer`], [`NewOffer`], [`OfferView`], [`TradeIntent`], [`Fill`]
//! - **Registry model**: [`TokenType`], [`TokenInfo`], [`Role`]
//! - **Settlement periods**: [`Period`]
//! - **Signed authorizations**: [`Permit`], [`SignedPermit`]
//! - **Events**: [`Event`], [`EventRecord`]
//! - **Configuration**: [`EngineConfig`], [`LoggingConfig`], [`LogFormat`]
//! - **Errors**: [`SwapdeskError`] with `SD_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod offer;
pub mod period;
pub mod permit;
pub mod role;
pub mod token;

pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use offer::*;
pub use period::*;
pub use permit::*;
pub use role::*;
pub use token::*;

// Constants are accessed via `swapdesk_types::constants::FOO`
// (not re-exported to avoid name collisions).
