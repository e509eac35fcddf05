//! # swapdesk-ledger
//!
//! The ledger boundary of the Swapdesk engine.
//!
//! The engine never escrows funds. It reads balances and allowances and
//! pulls both legs of a trade through a [`Ledger`] at settlement time.
//!
//! 1. **Ledger**: the trait the engine is generic over
//! 2. **InMemoryLedger**: reference implementation with balances, allowances
//!    and permit nonces
//! 3. **ComplianceRules**: the transfer gate (frozen accounts, registration)
//! 4. **SupplyConservation**: proves transfers neither create nor destroy value

pub mod compliance;
pub mod ledger;
pub mod memory;
pub mod supply_conservation;

pub use compliance::ComplianceRules;
pub use ledger::Ledger;
pub use memory::InMemoryLedger;
pub use supply_conservation::SupplyConservation;
