//! System-wide constants for the Swapdesk engine.

/// Default maximum number of elements in one batch call.
pub const DEFAULT_MAX_BATCH_LEN: usize = 100;

/// Default fee in basis points. The base engine takes no fee.
pub const DEFAULT_FEE_BPS: u16 = 0;

/// Upper bound for the fee parameter (100%).
pub const MAX_FEE_BPS: u16 = 10_000;

/// Largest decimals value a token may declare. `10^38` is the largest
/// power of ten representable in `u128`.
pub const MAX_TOKEN_DECIMALS: u8 = 38;

/// Domain separator prefixed to every permit signing payload.
pub const PERMIT_DOMAIN: &[u8] = b"swapdesk:permit:v1:";

/// Default log level when neither config nor `RUST_LOG` set one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Swapdesk";
