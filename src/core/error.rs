use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by rate table construction, configuration and VAT number checks.
///
/// Rate resolution and price conversion never fail; only building inputs
/// and the registry path can.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum VatError {
    /// The VAT registry could not be reached or answered with a fault.
    /// Only raised when fault forwarding is enabled.
    #[error("VAT registry unavailable: {message}")]
    RegistryUnavailable {
        /// Fault message from the transport or the registry.
        message: String,
        /// Fault code if the registry supplied one (e.g. "MS_UNAVAILABLE").
        code: Option<String>,
    },

    /// Country code is not an assigned ISO 3166-1 alpha-2 code.
    #[error("unknown country code '{0}'")]
    InvalidCountryCode(String),

    /// VAT identification number is malformed.
    #[error("invalid VAT number '{value}': {reason}")]
    InvalidVatNumber {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A territory override pattern overlaps one already registered for the country.
    #[error("territory pattern '{pattern}' overlaps '{existing}' for {country}")]
    OverlappingTerritory {
        /// Country the override belongs to.
        country: String,
        /// Pattern already present in the table.
        existing: String,
        /// Pattern that was rejected.
        pattern: String,
    },

    /// Rate is outside `[0, 1)`.
    #[error("rate {rate} for {country} is outside [0, 1)")]
    InvalidRate {
        /// Country (or country/pattern) the rate was given for.
        country: String,
        /// The rejected rate.
        rate: Decimal,
    },

    /// A configuration value could not be interpreted.
    #[error("configuration error for '{key}': {reason}")]
    Config {
        /// Configuration key.
        key: String,
        /// What was wrong with its value.
        reason: String,
    },
}

impl VatError {
    /// Build a `RegistryUnavailable` error from a fault.
    pub fn registry_unavailable(message: impl Into<String>, code: Option<String>) -> Self {
        Self::RegistryUnavailable {
            message: message.into(),
            code,
        }
    }

    pub(crate) fn config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, VatError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn registry_unavailable_display() {
        let e = VatError::registry_unavailable("timeout", Some("TIMEOUT".into()));
        assert_eq!(e.to_string(), "VAT registry unavailable: timeout");
    }

    #[test]
    fn overlap_display_names_both_patterns() {
        let e = VatError::OverlappingTerritory {
            country: "ES".into(),
            existing: "35".into(),
            pattern: "350".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("'350'"));
        assert!(msg.contains("'35'"));
    }

    #[test]
    fn invalid_rate_display() {
        let e = VatError::InvalidRate {
            country: "DE".into(),
            rate: dec!(1.5),
        };
        assert!(e.to_string().contains("1.5"));
    }
}
