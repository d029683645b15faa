//! VAT number validation against a remote registry.
//!
//! [`ValidationClient`] owns the connection lifecycle; transports plug in
//! through [`RegistryConnector`]. The `vies` feature provides one for the EU
//! VIES REST API.
//!
//! # Example
//!
//! ```ignore
//! use vatcalc::core::CalculatorConfig;
//! use vatcalc::registry::*;
//!
//! let client = ValidationClient::new(ViesConnector::new(), &CalculatorConfig::default());
//! match client.validate("DE123456789")? {
//!     ValidationOutcome::Checked(r) => println!("valid: {}", r.valid),
//!     ValidationOutcome::Unverifiable => println!("registry unreachable"),
//! }
//! ```

mod client;
mod number;
#[cfg(feature = "vies")]
mod vies;

pub use client::{
    ClientStatus, Endpoint, Registry, RegistryConnector, RegistryFault, RegistryResponse,
    ValidationClient, ValidationOutcome,
};
pub use number::VatNumber;
#[cfg(feature = "vies")]
pub use vies::{VIES_BASE_URL, ViesConnector, ViesRegistry};
