//! Rate lookup, rate resolution and net/gross conversion.
//!
//! # Example
//!
//! ```
//! use vatcalc::core::{BuyerProfile, Location};
//! use vatcalc::rates::*;
//! use rust_decimal_macros::dec;
//!
//! let resolver = RateResolver::new(RateTable::eu_standard())
//!     .with_business_country_code(Some("DE"));
//! let rate = resolver.resolve_rate(&Location::new("RO").unwrap(), BuyerProfile::CONSUMER);
//! assert_eq!(rate, dec!(0.19));
//!
//! let result = to_gross(dec!(100), rate);
//! assert_eq!(result.gross_price, dec!(119.00));
//! ```

mod convert;
mod resolver;
mod table;

pub use convert::{to_gross, to_net};
pub use resolver::{RateResolution, RateResolver, RateSource};
pub use table::{RateEntry, RateTable};
