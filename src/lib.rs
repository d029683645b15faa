//! # vatcalc
//!
//! VAT rate resolution, net/gross price conversion and VAT number
//! validation against the EU VIES registry.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//! Amounts are rounded to two decimals, half away from zero.
//!
//! ## Quick Start
//!
//! ```rust
//! use vatcalc::core::{BuyerProfile, Location};
//! use vatcalc::rates::{RateResolver, RateTable, to_gross, to_net};
//! use rust_decimal_macros::dec;
//!
//! let resolver = RateResolver::new(RateTable::eu_standard())
//!     .with_business_country_code(Some("DE"));
//!
//! let ro = Location::new("RO").unwrap();
//! let rate = resolver.resolve_rate(&ro, BuyerProfile::CONSUMER);
//! assert_eq!(to_gross(dec!(100), rate).gross_price, dec!(119.00));
//! assert_eq!(to_net(dec!(119), rate).net_price, dec!(100.00));
//!
//! // Cross-border B2B sale: reverse charge
//! assert_eq!(resolver.resolve_rate(&ro, BuyerProfile::COMPANY), dec!(0));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Rate table, resolver, conversion, validation client |
//! | `vies` | Blocking VIES REST transport for the validation client |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "core")]
pub mod rates;

#[cfg(feature = "core")]
pub mod registry;

#[cfg(feature = "core")]
mod calculator;

#[cfg(feature = "core")]
pub use crate::calculator::VatCalculator;

// Re-export the everyday types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::{
    BuyerProfile, CalculationResult, CalculatorConfig, ConfigSource, Location, VatError,
};
#[cfg(feature = "core")]
pub use crate::rates::{RateResolver, RateTable};
#[cfg(feature = "core")]
pub use crate::registry::{ValidationClient, ValidationOutcome};
