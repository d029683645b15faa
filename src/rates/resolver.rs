//! Effective rate for a buyer: reverse charge, country rate, territory override.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::table::RateTable;
use crate::core::countries::normalize_country_code;
use crate::core::{BuyerProfile, Location};

/// Which rule produced a rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateSource {
    /// Cross-border B2B sale; the buyer accounts for the tax.
    ReverseCharge,
    /// Country's general rate.
    Standard,
    /// Postal-code override for a special territory.
    TerritoryOverride {
        /// Pattern that matched.
        pattern: String,
    },
    /// Country missing from the rate table. The rate is 0, which does
    /// not mean the sale is tax-free.
    Unsupported,
}

/// Rate plus the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateResolution {
    /// Effective rate in `[0, 1)`.
    pub rate: Decimal,
    /// Rule that applied.
    pub source: RateSource,
}

impl RateResolution {
    fn new(rate: Decimal, source: RateSource) -> Self {
        Self { rate, source }
    }

    /// Whether the jurisdiction was unknown.
    pub fn is_unsupported(&self) -> bool {
        self.source == RateSource::Unsupported
    }
}

/// Applies business rules on top of a shared [`RateTable`].
#[derive(Debug, Clone)]
pub struct RateResolver {
    table: Arc<RateTable>,
    business_country_code: Option<String>,
}

impl RateResolver {
    /// Resolver over `table` with no seller jurisdiction configured.
    pub fn new(table: impl Into<Arc<RateTable>>) -> Self {
        Self {
            table: table.into(),
            business_country_code: None,
        }
    }

    /// Builder form of [`set_business_country_code`](Self::set_business_country_code).
    pub fn with_business_country_code(mut self, code: Option<&str>) -> Self {
        self.set_business_country_code(code);
        self
    }

    /// Set the seller's jurisdiction. `None` or blank clears it, which makes
    /// every B2B sale reverse-charged.
    pub fn set_business_country_code(&mut self, code: Option<&str>) {
        self.business_country_code = code
            .map(normalize_country_code)
            .filter(|c| !c.is_empty());
    }

    /// Seller's jurisdiction, if configured.
    pub fn business_country_code(&self) -> Option<&str> {
        self.business_country_code.as_deref()
    }

    /// The underlying table.
    pub fn table(&self) -> &RateTable {
        &self.table
    }

    /// Effective rate for a buyer at `location`.
    ///
    /// Rules, first match wins:
    ///
    /// 1. Company buyer outside the seller's country → 0 (reverse charge)
    /// 2. Country absent from the table → 0 (unsupported)
    /// 3. Postal code matching a territory override → override rate
    /// 4. Otherwise → the country's general rate
    pub fn resolve(&self, location: &Location, buyer: BuyerProfile) -> RateResolution {
        let country = normalize_country_code(&location.country_code);

        if buyer.is_company && self.business_country_code.as_deref() != Some(country.as_str()) {
            debug!(country = %country, "reverse charge applies");
            return RateResolution::new(Decimal::ZERO, RateSource::ReverseCharge);
        }

        let Some(entry) = self.table.get(&country) else {
            debug!(country = %country, "no rate for jurisdiction");
            return RateResolution::new(Decimal::ZERO, RateSource::Unsupported);
        };

        if let Some((pattern, territory)) = location
            .postal_code
            .as_deref()
            .and_then(|postal| entry.territory_for(postal))
        {
            debug!(country = %country, pattern, rate = %territory.rate, "territory override");
            return RateResolution::new(
                territory.rate,
                RateSource::TerritoryOverride {
                    pattern: pattern.to_string(),
                },
            );
        }

        RateResolution::new(entry.rate, RateSource::Standard)
    }

    /// Shorthand for `resolve(..).rate`.
    pub fn resolve_rate(&self, location: &Location, buyer: BuyerProfile) -> Decimal {
        self.resolve(location, buyer).rate
    }

    /// General rate for a country, ignoring buyer and territory rules.
    /// Unknown countries yield 0.
    pub fn rate_for_country(&self, country_code: &str) -> Decimal {
        self.table
            .get(country_code)
            .map_or(Decimal::ZERO, |e| e.rate)
    }

    /// Whether VAT is collected for the country at all (it is in the table).
    pub fn should_collect_vat(&self, country_code: &str) -> bool {
        self.table.contains(country_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn resolver(business: Option<&str>) -> RateResolver {
        let table = RateTable::new()
            .with_rate("RO", dec!(0.19))
            .unwrap()
            .with_rate("DE", dec!(0.19))
            .unwrap()
            .with_override("DE", "27498", dec!(0))
            .unwrap();
        RateResolver::new(table).with_business_country_code(business)
    }

    fn loc(cc: &str) -> Location {
        Location::new(cc).unwrap()
    }

    #[test]
    fn consumer_gets_country_rate() {
        let r = resolver(None).resolve(&loc("RO"), BuyerProfile::CONSUMER);
        assert_eq!(r, RateResolution::new(dec!(0.19), RateSource::Standard));
    }

    #[test]
    fn company_without_business_country_is_reverse_charged() {
        let r = resolver(None).resolve(&loc("RO"), BuyerProfile::COMPANY);
        assert_eq!(r.rate, dec!(0));
        assert_eq!(r.source, RateSource::ReverseCharge);
    }

    #[test]
    fn reverse_charge_beats_territory_override() {
        let l = Location::with_postal_code("DE", "27498").unwrap();
        let r = resolver(Some("RO")).resolve(&l, BuyerProfile::COMPANY);
        assert_eq!(r.source, RateSource::ReverseCharge);
    }

    #[test]
    fn domestic_company_pays_territory_rate() {
        let l = Location::with_postal_code("DE", "27498").unwrap();
        let r = resolver(Some("de")).resolve(&l, BuyerProfile::COMPANY);
        assert_eq!(
            r.source,
            RateSource::TerritoryOverride {
                pattern: "27498".into()
            }
        );
        assert_eq!(r.rate, dec!(0));
    }

    #[test]
    fn unsupported_is_flagged() {
        let r = resolver(None).resolve(&loc("CH"), BuyerProfile::CONSUMER);
        assert_eq!(r.rate, dec!(0));
        assert!(r.is_unsupported());
    }

    #[test]
    fn blank_business_country_clears() {
        let mut r = resolver(Some("RO"));
        assert_eq!(r.business_country_code(), Some("RO"));
        r.set_business_country_code(Some(" "));
        assert_eq!(r.business_country_code(), None);
    }

    #[test]
    fn country_helpers() {
        let r = resolver(None);
        assert_eq!(r.rate_for_country("de"), dec!(0.19));
        assert_eq!(r.rate_for_country("CH"), dec!(0));
        assert!(r.should_collect_vat("RO"));
        assert!(!r.should_collect_vat("CH"));
    }
}
