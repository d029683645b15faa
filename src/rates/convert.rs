//! Net/gross price conversion.
//!
//! Every output field is rounded exactly once, to 2 decimals, half away
//! from zero. The tax value is rounded before the other price is derived
//! from it, so `to_gross(to_net(g).net_price)` can miss `g` by a cent.
//!
//! Neither conversion panics. Intermediate values that leave `Decimal`'s
//! range saturate at `Decimal::MAX` / `Decimal::MIN`.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::CalculationResult;

/// Round a Decimal to `dp` decimal places, half away from zero.
fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Tax value and gross price for a net price.
///
/// `tax = round(rate * net)`, `gross = round(net + tax)`. Negative prices
/// (refunds) go through the same formula. A gross price beyond
/// `Decimal::MAX` saturates.
///
/// ```
/// use vatcalc::rates::to_gross;
/// use rust_decimal_macros::dec;
///
/// let r = to_gross(dec!(100), dec!(0.19));
/// assert_eq!(r.tax_value, dec!(19.00));
/// assert_eq!(r.gross_price, dec!(119.00));
/// ```
pub fn to_gross(net: Decimal, rate: Decimal) -> CalculationResult {
    let tax_value = round_half_up(rate.saturating_mul(net), 2);
    CalculationResult {
        net_price: net,
        tax_rate: rate,
        tax_value,
        gross_price: round_half_up(net.saturating_add(tax_value), 2),
    }
}

/// Tax value and net price for a gross price.
///
/// `tax = round(gross / (1 + rate) * rate)` (0 for a zero rate),
/// `net = round(gross - tax)`.
pub fn to_net(gross: Decimal, rate: Decimal) -> CalculationResult {
    let tax_value = if rate > Decimal::ZERO {
        let base = gross / Decimal::ONE.saturating_add(rate);
        round_half_up(base.saturating_mul(rate), 2)
    } else {
        Decimal::ZERO
    };
    CalculationResult {
        net_price: round_half_up(gross.saturating_sub(tax_value), 2),
        tax_rate: rate,
        tax_value,
        gross_price: gross,
    }
}
