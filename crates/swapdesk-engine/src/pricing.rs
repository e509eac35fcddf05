//! Fee/price module: pure integer price computation.
//!
//! An offer's `price` is `buy_token` base units per *whole* `sell_token`,
//! so paying for `x` base units of `sell_token` costs
//!
//! ```text
//! buy_amount = x * price / 10^sell_decimals
//! ```
//!
//! Division truncates toward zero. The seller absorbs the remainder, at most
//! one base unit of `buy_token` per fill. Preview and settlement both call
//! [`PriceScale::buy_amount`], so they agree exactly.
//!
//! Conversions to and from human-readable [`Decimal`] values are for display
//! and client input only and never feed settlement.

use rust_decimal::Decimal;
use swapdesk_types::{constants, Amount, Price, Result, SwapdeskError, TokenInfo};

/// Decimal bases of an offer's two tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceScale {
    pub sell_decimals: u8,
    pub buy_decimals: u8,
}

impl PriceScale {
    #[must_use]
    pub fn new(sell_decimals: u8, buy_decimals: u8) -> Self {
        Self {
            sell_decimals,
            buy_decimals,
        }
    }

    #[must_use]
    pub fn from_info(sell: &TokenInfo, buy: &TokenInfo) -> Self {
        Self::new(sell.decimals, buy.decimals)
    }

    /// `buy_token` owed for `sell_amount` at `price`.
    pub fn buy_amount(&self, sell_amount: Amount, price: Price) -> Result<Amount> {
        compute_buy_amount(sell_amount, price, self.sell_decimals)
    }

    /// Price as a decimal number of `buy_token` per `sell_token`.
    pub fn display_price(&self, price: Price) -> Result<Decimal> {
        to_decimal(price, self.buy_decimals)
    }
}

/// `10^decimals` as `u128`.
pub fn pow10(decimals: u8) -> Result<u128> {
    if decimals > constants::MAX_TOKEN_DECIMALS {
        return Err(SwapdeskError::ArithmeticOverflow {
            context: "decimal scale",
        });
    }
    10u128
        .checked_pow(u32::from(decimals))
        .ok_or(SwapdeskError::ArithmeticOverflow {
            context: "decimal scale",
        })
}

/// `sell_amount * price / 10^sell_decimals`, truncated.
///
/// Uses `(a / s) * p + (a % s) * p / s`, which is exact, when the direct
/// product would overflow.
pub fn compute_buy_amount(sell_amount: Amount, price: Price, sell_decimals: u8) -> Result<Amount> {
    let scale = pow10(sell_decimals)?;
    if let Some(product) = sell_amount.checked_mul(price) {
        return Ok(product / scale);
    }
    let overflow = || SwapdeskError::ArithmeticOverflow {
        context: "buy amount",
    };
    let whole = (sell_amount / scale)
        .checked_mul(price)
        .ok_or_else(overflow)?;
    let fraction = (sell_amount % scale)
        .checked_mul(price)
        .ok_or_else(overflow)?
        / scale;
    whole.checked_add(fraction).ok_or_else(overflow)
}

/// Base units to a decimal token quantity.
pub fn to_decimal(amount: Amount, decimals: u8) -> Result<Decimal> {
    let mantissa = i128::try_from(amount).map_err(|_| SwapdeskError::ArithmeticOverflow {
        context: "decimal conversion",
    })?;
    Decimal::try_from_i128_with_scale(mantissa, u32::from(decimals))
        .map(|d| d.normalize())
        .map_err(|_| SwapdeskError::ArithmeticOverflow {
            context: "decimal conversion",
        })
}

/// Decimal token quantity to base units.
///
/// # Errors
/// `InvalidAmount` for negative values or more fractional digits than the
/// token supports.
pub fn from_decimal(value: Decimal, decimals: u8) -> Result<Amount> {
    if value.is_sign_negative() {
        return Err(SwapdeskError::InvalidAmount {
            reason: format!("{value} is negative"),
        });
    }
    let value = value.normalize();
    let scale = value.scale();
    if scale > u32::from(decimals) {
        return Err(SwapdeskError::InvalidAmount {
            reason: format!("{value} has more than {decimals} decimal places"),
        });
    }
    let mantissa = u128::try_from(value.mantissa()).map_err(|_| SwapdeskError::InvalidAmount {
        reason: format!("{value} is negative"),
    })?;
    let scale = u8::try_from(scale)
        .map_err(|_| SwapdeskError::Internal(format!("decimal scale {scale} out of range")))?;
    let shift = decimals - scale;
    mantissa
        .checked_mul(pow10(shift)?)
        .ok_or(SwapdeskError::ArithmeticOverflow {
            context: "decimal conversion",
        })
}
