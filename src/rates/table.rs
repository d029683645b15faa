//! Jurisdiction rate table with postal-code territory overrides.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::core::countries::normalize_country_code;
use crate::core::{Result, VatError};

/// Rate for one jurisdiction, with optional sub-territory exceptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateEntry {
    /// Rate as a fraction in `[0, 1)`.
    pub rate: Decimal,
    /// Upper-cased postal-code pattern → override. Patterns never overlap.
    pub territory_overrides: HashMap<String, RateEntry>,
}

impl RateEntry {
    /// Entry without overrides.
    pub fn new(rate: Decimal) -> Self {
        Self {
            rate,
            territory_overrides: HashMap::new(),
        }
    }

    /// Find the override whose pattern matches `postal_code` (prefix, case-insensitive).
    ///
    /// Returns the matched pattern and its entry. The longest matching pattern
    /// wins; with non-overlapping patterns there is at most one.
    pub fn territory_for(&self, postal_code: &str) -> Option<(&str, &RateEntry)> {
        let postal = normalize_postal_code(postal_code);
        if postal.is_empty() {
            return None;
        }
        self.territory_overrides
            .iter()
            .filter(|(pattern, _)| postal.starts_with(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(pattern, entry)| (pattern.as_str(), entry))
    }
}

/// Mapping from country code to [`RateEntry`]. Immutable once shared.
///
/// Deserializing goes through [`insert`](Self::insert) and
/// [`insert_override`](Self::insert_override), so a loaded table has the
/// same guarantees as a built one.
///
/// ```
/// use vatcalc::rates::RateTable;
/// use rust_decimal_macros::dec;
///
/// let table = RateTable::new()
///     .with_rate("RO", dec!(0.19)).unwrap()
///     .with_override("ES", "35", dec!(0)).unwrap();
/// assert_eq!(table.get("ro").map(|e| e.rate), Some(dec!(0.19)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRateTable")]
pub struct RateTable {
    entries: HashMap<String, RateEntry>,
}

/// Serialized table shape, validated before it becomes a [`RateTable`].
#[derive(Deserialize)]
struct RawRateTable {
    #[serde(default)]
    entries: HashMap<String, RawRateEntry>,
}

#[derive(Deserialize)]
struct RawRateEntry {
    rate: Decimal,
    #[serde(default)]
    territory_overrides: HashMap<String, RawRateEntry>,
}

impl TryFrom<RawRateTable> for RateTable {
    type Error = VatError;

    fn try_from(raw: RawRateTable) -> Result<Self> {
        let mut table = Self::new();
        for (country, entry) in raw.entries {
            if table.contains(&country) {
                return Err(VatError::config(
                    format!("entries.{country}"),
                    "country listed more than once",
                ));
            }
            table.insert(&country, entry.rate)?;
            for (pattern, territory) in entry.territory_overrides {
                if !territory.territory_overrides.is_empty() {
                    return Err(VatError::config(
                        format!("entries.{country}.territory_overrides.{pattern}"),
                        "territory overrides cannot be nested",
                    ));
                }
                table.insert_override(&country, &pattern, territory.rate)?;
            }
        }
        Ok(table)
    }
}

impl RateTable {
    /// Empty table; every lookup misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the general rate for a country, keeping existing overrides.
    ///
    /// # Errors
    ///
    /// `VatError::InvalidRate` if `rate` is outside `[0, 1)`.
    pub fn insert(&mut self, country_code: &str, rate: Decimal) -> Result<()> {
        let country = normalize_country_code(country_code);
        check_rate(&country, rate)?;
        self.entries
            .entry(country)
            .and_modify(|e| e.rate = rate)
            .or_insert_with(|| RateEntry::new(rate));
        Ok(())
    }

    /// Add a postal-code override for a country.
    ///
    /// A country without a general rate gets one of 0, so it still counts as
    /// known to the table.
    ///
    /// # Errors
    ///
    /// `VatError::InvalidRate` for a rate outside `[0, 1)`.
    /// `VatError::OverlappingTerritory` when one pattern is a prefix of
    /// another, or the pattern is blank (it would match every postal code).
    pub fn insert_override(
        &mut self,
        country_code: &str,
        pattern: &str,
        rate: Decimal,
    ) -> Result<()> {
        let country = normalize_country_code(country_code);
        let pattern = normalize_postal_code(pattern);
        check_rate(&format!("{country}/{pattern}"), rate)?;

        let clash = self.entries.get(&country).and_then(|entry| {
            entry
                .territory_overrides
                .keys()
                .find(|existing| {
                    existing.starts_with(pattern.as_str()) || pattern.starts_with(existing.as_str())
                })
                .cloned()
        });
        if pattern.is_empty() || clash.is_some() {
            return Err(VatError::OverlappingTerritory {
                country,
                existing: clash.unwrap_or_default(),
                pattern,
            });
        }

        let entry = self
            .entries
            .entry(country)
            .or_insert_with(|| RateEntry::new(Decimal::ZERO));
        entry.territory_overrides.insert(pattern, RateEntry::new(rate));
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_rate(mut self, country_code: &str, rate: Decimal) -> Result<Self> {
        self.insert(country_code, rate)?;
        Ok(self)
    }

    /// Builder form of [`insert_override`](Self::insert_override).
    pub fn with_override(
        mut self,
        country_code: &str,
        pattern: &str,
        rate: Decimal,
    ) -> Result<Self> {
        self.insert_override(country_code, pattern, rate)?;
        Ok(self)
    }

    /// Entry for a country (case-insensitive).
    pub fn get(&self, country_code: &str) -> Option<&RateEntry> {
        self.entries.get(&normalize_country_code(country_code))
    }

    /// Whether the table knows the country.
    pub fn contains(&self, country_code: &str) -> bool {
        self.get(country_code).is_some()
    }

    /// Number of countries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// EU standard rates and well-known special territories.
    ///
    /// Reference data, not a compliance dataset. Load a maintained table for
    /// production use.
    pub fn eu_standard() -> Self {
        let mut table = Self::new();
        for (country, rate) in EU_STANDARD_RATES {
            table.entries.insert((*country).to_string(), RateEntry::new(*rate));
        }
        for (country, pattern, rate) in EU_TERRITORIES {
            if let Some(entry) = table.entries.get_mut(*country) {
                entry
                    .territory_overrides
                    .insert((*pattern).to_string(), RateEntry::new(*rate));
            }
        }
        table
    }
}

fn check_rate(label: &str, rate: Decimal) -> Result<()> {
    if rate < Decimal::ZERO || rate >= Decimal::ONE {
        return Err(VatError::InvalidRate {
            country: label.to_string(),
            rate,
        });
    }
    Ok(())
}

fn normalize_postal_code(code: &str) -> String {
    code.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

static EU_STANDARD_RATES: &[(&str, Decimal)] = &[
    ("AT", dec!(0.20)),
    ("BE", dec!(0.21)),
    ("BG", dec!(0.20)),
    ("CY", dec!(0.19)),
    ("CZ", dec!(0.21)),
    ("DE", dec!(0.19)),
    ("DK", dec!(0.25)),
    ("EE", dec!(0.24)),
    ("ES", dec!(0.21)),
    ("FI", dec!(0.255)),
    ("FR", dec!(0.20)),
    ("GR", dec!(0.24)),
    ("HR", dec!(0.25)),
    ("HU", dec!(0.27)),
    ("IE", dec!(0.23)),
    ("IT", dec!(0.22)),
    ("LT", dec!(0.21)),
    ("LU", dec!(0.17)),
    ("LV", dec!(0.21)),
    ("MT", dec!(0.18)),
    ("NL", dec!(0.21)),
    ("PL", dec!(0.23)),
    ("PT", dec!(0.23)),
    ("RO", dec!(0.19)),
    ("SE", dec!(0.25)),
    ("SI", dec!(0.22)),
    ("SK", dec!(0.23)),
];

static EU_TERRITORIES: &[(&str, &str, Decimal)] = &[
    // Jungholz and Mittelberg apply German VAT
    ("AT", "6691", dec!(0.19)),
    ("AT", "6991", dec!(0.19)),
    ("AT", "6992", dec!(0.19)),
    ("AT", "6993", dec!(0.19)),
    // Heligoland, Büsingen
    ("DE", "27498", dec!(0)),
    ("DE", "78266", dec!(0)),
    // Canary Islands, Ceuta, Melilla
    ("ES", "35", dec!(0)),
    ("ES", "38", dec!(0)),
    ("ES", "51", dec!(0)),
    ("ES", "52", dec!(0)),
    // Guadeloupe, Martinique, Guyane, Réunion, Mayotte
    ("FR", "971", dec!(0.085)),
    ("FR", "972", dec!(0.085)),
    ("FR", "973", dec!(0)),
    ("FR", "974", dec!(0.085)),
    ("FR", "976", dec!(0)),
    // Campione d'Italia, Livigno
    ("IT", "22061", dec!(0)),
    ("IT", "23041", dec!(0)),
];
