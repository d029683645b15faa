use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::countries::{is_known_country_code, normalize_country_code};
use super::error::{Result, VatError};

/// Buyer location used for rate resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// ISO 3166-1 alpha-2 country code, upper-case.
    pub country_code: String,
    /// Postal code. Only consulted when the country has territory overrides.
    pub postal_code: Option<String>,
}

impl Location {
    /// Location for a whole country.
    ///
    /// The code is trimmed and upper-cased, then checked against the
    /// ISO 3166-1 alpha-2 list.
    pub fn new(country_code: &str) -> Result<Self> {
        let country_code = normalize_country_code(country_code);
        if !is_known_country_code(&country_code) {
            return Err(VatError::InvalidCountryCode(country_code));
        }
        Ok(Self {
            country_code,
            postal_code: None,
        })
    }

    /// Location with a postal code. Blank postal codes are dropped.
    pub fn with_postal_code(country_code: &str, postal_code: &str) -> Result<Self> {
        let mut loc = Self::new(country_code)?;
        let postal = postal_code.trim();
        if !postal.is_empty() {
            loc.postal_code = Some(postal.to_string());
        }
        Ok(loc)
    }

    /// Location that skips the ISO check.
    ///
    /// Meant for callers passing through codes the registry knows but ISO
    /// does not (e.g. `XI` for Northern Ireland); such codes resolve like any
    /// other entry absent from the rate table.
    pub fn unchecked(country_code: &str, postal_code: Option<&str>) -> Self {
        Self {
            country_code: normalize_country_code(country_code),
            postal_code: postal_code
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from),
        }
    }
}

/// Who is buying.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerProfile {
    /// Buyer is a VAT-registered business.
    pub is_company: bool,
}

impl BuyerProfile {
    /// Private consumer (B2C).
    pub const CONSUMER: Self = Self { is_company: false };
    /// VAT-registered business (B2B).
    pub const COMPANY: Self = Self { is_company: true };
}

/// Outcome of a net/gross conversion. All amounts carry two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// Price without VAT.
    pub net_price: Decimal,
    /// Applied rate as a fraction (0.19 = 19 %).
    pub tax_rate: Decimal,
    /// VAT amount.
    pub tax_value: Decimal,
    /// Price including VAT.
    pub gross_price: Decimal,
}
