//! One-stop calculator: rate resolution, price conversion and VAT number checks.

use rust_decimal::Decimal;

use crate::core::{BuyerProfile, CalculationResult, CalculatorConfig, Location, Result};
use crate::rates::{RateResolution, RateResolver, RateTable, to_gross, to_net};
use crate::registry::{RegistryConnector, ValidationClient, ValidationOutcome};

/// Rate resolution and conversion share the seller's jurisdiction with the
/// validation client's configuration, nothing else.
///
/// ```
/// use vatcalc::{BuyerProfile, CalculatorConfig, Location, RateTable, VatCalculator};
/// use vatcalc::registry::{Endpoint, Registry, RegistryConnector, RegistryFault, RegistryResponse, VatNumber};
/// use rust_decimal_macros::dec;
/// use std::time::Duration;
///
/// struct Offline;
/// struct Never;
/// impl Registry for Never {
///     fn check(&self, _: &VatNumber) -> Result<RegistryResponse, RegistryFault> {
///         Err(RegistryFault::new("offline"))
///     }
/// }
/// impl RegistryConnector for Offline {
///     type Handle = Never;
///     fn connect(&self, _: Endpoint, _: Duration) -> Result<Never, RegistryFault> {
///         Err(RegistryFault::new("offline"))
///     }
/// }
///
/// let config = CalculatorConfig::new().with_business_country_code("DE");
/// let calc = VatCalculator::new(RateTable::eu_standard(), &config, Offline);
///
/// let ro = Location::new("RO").unwrap();
/// let result = calc.calculate(dec!(100), &ro, BuyerProfile::CONSUMER);
/// assert_eq!(result.gross_price, dec!(119.00));
/// assert_eq!(calc.calculate(dec!(100), &ro, BuyerProfile::COMPANY).tax_rate, dec!(0));
/// assert!(!calc.validate_vat_number("RO123").unwrap().is_verified());
/// ```
#[derive(Debug)]
pub struct VatCalculator<C: RegistryConnector> {
    resolver: RateResolver,
    client: ValidationClient<C>,
}

impl<C: RegistryConnector> VatCalculator<C> {
    /// Calculator over `table`, configured from `config`, validating through `connector`.
    pub fn new(table: RateTable, config: &CalculatorConfig, connector: C) -> Self {
        Self {
            resolver: RateResolver::new(table)
                .with_business_country_code(config.business_country_code.as_deref()),
            client: ValidationClient::new(connector, config),
        }
    }

    /// Gross price for a net price sold to `buyer` at `location`.
    pub fn calculate(
        &self,
        net: Decimal,
        location: &Location,
        buyer: BuyerProfile,
    ) -> CalculationResult {
        to_gross(net, self.resolver.resolve_rate(location, buyer))
    }

    /// Net price for a gross price sold to `buyer` at `location`.
    pub fn calculate_net(
        &self,
        gross: Decimal,
        location: &Location,
        buyer: BuyerProfile,
    ) -> CalculationResult {
        to_net(gross, self.resolver.resolve_rate(location, buyer))
    }

    /// Rate and the rule that produced it.
    pub fn resolve(&self, location: &Location, buyer: BuyerProfile) -> RateResolution {
        self.resolver.resolve(location, buyer)
    }

    /// Effective rate for raw location parts. Unknown or malformed country
    /// codes resolve like any country missing from the table.
    pub fn tax_rate_for_location(
        &self,
        country_code: &str,
        postal_code: Option<&str>,
        is_company: bool,
    ) -> Decimal {
        let location = Location::unchecked(country_code, postal_code);
        self.resolver.resolve_rate(&location, BuyerProfile { is_company })
    }

    /// General rate for a country.
    pub fn tax_rate_for_country(&self, country_code: &str) -> Decimal {
        self.resolver.rate_for_country(country_code)
    }

    /// Whether VAT is collected for the country.
    pub fn should_collect_vat(&self, country_code: &str) -> bool {
        self.resolver.should_collect_vat(country_code)
    }

    /// Change the seller's jurisdiction.
    pub fn set_business_country_code(&mut self, code: Option<&str>) {
        self.resolver.set_business_country_code(code);
    }

    /// Seller's jurisdiction, if configured.
    pub fn business_country_code(&self) -> Option<&str> {
        self.resolver.business_country_code()
    }

    /// Use the registry sandbox. Must be called before the first validation.
    pub fn use_sandbox(&self, sandbox: bool) -> &Self {
        self.client.use_sandbox(sandbox);
        self
    }

    /// Validate a VAT number with country prefix.
    ///
    /// # Errors
    ///
    /// See [`ValidationClient::validate`].
    pub fn validate_vat_number(&self, vat_number: &str) -> Result<ValidationOutcome> {
        self.client.validate(vat_number)
    }

    /// The underlying validation client.
    pub fn validation_client(&self) -> &ValidationClient<C> {
        &self.client
    }
}

#[cfg(feature = "vies")]
impl VatCalculator<crate::registry::ViesConnector> {
    /// Calculator validating against the public VIES service.
    pub fn with_vies(table: RateTable, config: &CalculatorConfig) -> Self {
        Self::new(table, config, crate::registry::ViesConnector::new())
    }
}
