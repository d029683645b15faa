//! Calculator configuration and the key-value sources it is read from.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::countries::normalize_country_code;
use super::error::{Result, VatError};

/// Seller's own jurisdiction.
pub const KEY_BUSINESS_COUNTRY_CODE: &str = "vat_calculator.business_country_code";
/// Registry timeout in seconds.
pub const KEY_TIMEOUT: &str = "vat_calculator.timeout";
/// Raise registry faults instead of degrading to "could not verify".
pub const KEY_FORWARD_FAULTS: &str = "vat_calculator.forward_faults";
/// Talk to the registry's test service.
pub const KEY_USE_SANDBOX: &str = "vat_calculator.use_sandbox";

/// Default registry timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Read-only key-value lookup the configuration is loaded from.
pub trait ConfigSource {
    /// Raw value for `key`, if set.
    fn get_raw(&self, key: &str) -> Option<String>;

    /// Whether `key` is set.
    fn has(&self, key: &str) -> bool {
        self.get_raw(key).is_some()
    }

    /// Value for `key`, or `default` when unset.
    fn get(&self, key: &str, default: &str) -> String {
        self.get_raw(key).unwrap_or_else(|| default.to_string())
    }
}

impl ConfigSource for HashMap<String, String> {
    fn get_raw(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl ConfigSource for HashMap<&str, &str> {
    fn get_raw(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).map(|v| v.to_string())
    }
}

/// Process environment as a [`ConfigSource`].
///
/// `vat_calculator.timeout` is looked up as `VAT_CALCULATOR_TIMEOUT`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl EnvSource {
    /// Environment variable name for a dotted key.
    pub fn var_name(key: &str) -> String {
        key.replace('.', "_").to_ascii_uppercase()
    }
}

impl ConfigSource for EnvSource {
    fn get_raw(&self, key: &str) -> Option<String> {
        std::env::var(Self::var_name(key)).ok()
    }
}

/// Options recognized by the calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatorConfig {
    /// Seller's jurisdiction. `None` treats every B2B sale as cross-border.
    pub business_country_code: Option<String>,
    /// Upper bound for registry initialization and each request.
    pub timeout: Duration,
    /// Raise `RegistryUnavailable` instead of degrading silently.
    pub forward_faults: bool,
    /// Use the registry's sandbox endpoint.
    pub use_sandbox: bool,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            business_country_code: None,
            timeout: DEFAULT_TIMEOUT,
            forward_faults: false,
            use_sandbox: false,
        }
    }
}

impl CalculatorConfig {
    /// Defaults: no business country, 30 s timeout, faults swallowed, production endpoint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the seller's jurisdiction. Blank codes clear it.
    pub fn with_business_country_code(mut self, code: &str) -> Self {
        self.business_country_code = Some(normalize_country_code(code)).filter(|c| !c.is_empty());
        self
    }

    /// Set the registry timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable fault forwarding.
    pub fn with_forward_faults(mut self, forward: bool) -> Self {
        self.forward_faults = forward;
        self
    }

    /// Select the sandbox endpoint.
    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.use_sandbox = sandbox;
        self
    }

    /// Load from a key-value source. Unset keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `VatError::Config` when a timeout or flag value cannot be parsed.
    pub fn from_source(source: &impl ConfigSource) -> Result<Self> {
        let mut config = Self::default();

        if source.has(KEY_BUSINESS_COUNTRY_CODE) {
            config = config.with_business_country_code(&source.get(KEY_BUSINESS_COUNTRY_CODE, ""));
        }
        if let Some(raw) = source.get_raw(KEY_TIMEOUT) {
            config.timeout = parse_timeout(KEY_TIMEOUT, &raw)?;
        }
        if let Some(raw) = source.get_raw(KEY_FORWARD_FAULTS) {
            config.forward_faults = parse_flag(KEY_FORWARD_FAULTS, &raw)?;
        }
        if let Some(raw) = source.get_raw(KEY_USE_SANDBOX) {
            config.use_sandbox = parse_flag(KEY_USE_SANDBOX, &raw)?;
        }

        Ok(config)
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_source(&EnvSource)
    }
}

fn parse_timeout(key: &str, raw: &str) -> Result<Duration> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| VatError::config(key, format!("'{raw}' is not a number of seconds")))?;
    Duration::try_from_secs_f64(secs)
        .map_err(|_| VatError::config(key, format!("'{raw}' is not a valid duration")))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(VatError::config(key, format!("'{other}' is not a boolean"))),
    }
}
