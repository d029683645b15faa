//! Core types, configuration and errors.
//!
//! Everything here is plain data; the rate and registry modules build on it.

mod config;
pub mod countries;
mod error;
mod types;

pub use config::*;
pub use countries::{is_eu_member, is_known_country_code};
pub use error::*;
pub use types::*;
