//! # swapdesk-engine
//!
//! Peer-to-peer offer book and settlement engine.
//!
//! A seller posts a standing offer to sell one whitelisted token for another
//! at a fixed price. Any buyer (or only the reserved buyer, for a private
//! offer) accepts all or part of it; the engine pulls both legs through the
//! [`swapdesk_ledger::Ledger`] in one atomic call. The engine never holds
//! funds between trades.
//!
//! ## Components
//!
//! 1. **AccessControl**: Admin / Moderator roles and the per-handler requirement
//! 2. **TokenRegistry**: the token whitelist
//! 3. **OfferBook**: offer storage and sequential ids
//! 4. **pricing**: the integer price computation shared by preview and settlement
//! 5. **Engine**: transactional entry point for every operation
//!
//! ## Call flow
//!
//! ```text
//! caller → Engine::transact → access / pause gate → registry (create only)
//!        → offer book → settlement → pricing → ledger (both legs) → events
//! ```

pub mod access;
mod admin;
pub mod book;
pub mod engine;
pub mod events;
mod offers;
mod permit;
pub mod pricing;
pub mod registry;
mod settlement;
pub mod telemetry;

pub use access::{AccessControl, Requirement};
pub use book::OfferBook;
pub use engine::Engine;
pub use events::EventLog;
pub use pricing::PriceScale;
pub use registry::TokenRegistry;
