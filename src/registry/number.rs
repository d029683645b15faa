use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{Result, VatError};

/// VAT identification number split into registry prefix and national part.
///
/// Parsing strips spaces, dots and dashes and upper-cases the input. It only
/// checks the general shape; per-country formats are left to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VatNumber {
    country_code: String,
    number: String,
}

impl VatNumber {
    /// Parse `"DE 123.456.789"`-style input.
    ///
    /// Greek numbers may be given with the ISO prefix `GR`; the registry
    /// knows them as `EL`.
    ///
    /// # Errors
    ///
    /// `VatError::InvalidVatNumber` when the input is shorter than three
    /// characters, lacks a two-letter prefix or contains anything other
    /// than ASCII letters and digits after cleanup.
    pub fn parse(input: &str) -> Result<Self> {
        let cleaned: String = input
            .chars()
            .filter(|c| !c.is_whitespace() && !matches!(c, '.' | '-'))
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let invalid = |reason: &str| VatError::InvalidVatNumber {
            value: input.to_string(),
            reason: reason.to_string(),
        };

        if cleaned.len() < 3 {
            return Err(invalid("too short"));
        }
        if !cleaned.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(invalid("only letters and digits are allowed"));
        }
        let (prefix, number) = cleaned.split_at(2);
        if !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid("must start with a two-letter country prefix"));
        }

        let country_code = match prefix {
            "GR" => "EL",
            other => other,
        };

        Ok(Self {
            country_code: country_code.to_string(),
            number: number.to_string(),
        })
    }

    /// Registry country prefix (`EL` for Greece).
    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// National part without the prefix.
    pub fn number(&self) -> &str {
        &self.number
    }
}

impl fmt::Display for VatNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.country_code, self.number)
    }
}

impl std::str::FromStr for VatNumber {
    type Err = VatError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
