//! EU VIES REST API transport for the validation client.
//!
//! Uses a blocking HTTP client. Do not call it from inside an async runtime
//! worker; wrap calls in `spawn_blocking` instead.

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::client::{Endpoint, Registry, RegistryConnector, RegistryFault, RegistryResponse};
use super::number::VatNumber;

/// Base address of the VIES REST API.
pub const VIES_BASE_URL: &str = "https://ec.europa.eu/taxation_customs/vies/rest-api";

/// Opens [`ViesRegistry`] connections.
///
/// Connecting builds the HTTP client and asks VIES for its availability, so a
/// dead service is detected before the first number is checked.
#[derive(Debug, Clone)]
pub struct ViesConnector {
    base_url: String,
}

impl Default for ViesConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl ViesConnector {
    /// Connector for the public VIES service.
    pub fn new() -> Self {
        Self::with_base_url(VIES_BASE_URL)
    }

    /// Connector for a different deployment or a proxy.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Base address used for requests.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl RegistryConnector for ViesConnector {
    type Handle = ViesRegistry;

    fn connect(&self, endpoint: Endpoint, timeout: Duration) -> Result<ViesRegistry, RegistryFault> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RegistryFault::new(e.to_string()))?;

        let resp = client
            .get(format!("{}/check-status", self.base_url))
            .send()
            .map_err(|e| RegistryFault::new(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().map_err(|e| RegistryFault::new(e.to_string()))?;
        if !status.is_success() {
            return Err(RegistryFault::with_code(
                format!("HTTP {status}: {body}"),
                status.as_str(),
            ));
        }

        let service: ViesStatusResponse = serde_json::from_str(&body)
            .map_err(|e| RegistryFault::new(format!("unexpected status response: {e}")))?;
        if service.vow.is_some_and(|v| !v.available) {
            return Err(RegistryFault::with_code(
                "VIES reports itself unavailable",
                "SERVICE_UNAVAILABLE",
            ));
        }

        Ok(ViesRegistry {
            client,
            check_url: check_url(&self.base_url, endpoint),
        })
    }
}

/// Open VIES connection.
#[derive(Debug, Clone)]
pub struct ViesRegistry {
    client: reqwest::blocking::Client,
    check_url: String,
}

impl ViesRegistry {
    /// Address numbers are posted to.
    pub fn check_url(&self) -> &str {
        &self.check_url
    }
}

impl Registry for ViesRegistry {
    fn check(&self, number: &VatNumber) -> Result<RegistryResponse, RegistryFault> {
        let req = ViesRequest {
            country_code: number.country_code().to_string(),
            vat_number: number.number().to_string(),
        };

        let resp = self
            .client
            .post(&self.check_url)
            .json(&req)
            .send()
            .map_err(|e| RegistryFault::new(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().map_err(|e| RegistryFault::new(e.to_string()))?;
        if !status.is_success() {
            return Err(RegistryFault::with_code(
                format!("HTTP {status}: {body}"),
                status.as_str(),
            ));
        }

        parse_check_response(&body)
    }
}

fn check_url(base_url: &str, endpoint: Endpoint) -> String {
    match endpoint {
        Endpoint::Production => format!("{base_url}/check-vat-number"),
        Endpoint::Sandbox => format!("{base_url}/check-vat-test-service"),
    }
}

fn parse_check_response(body: &str) -> Result<RegistryResponse, RegistryFault> {
    let api_resp: ViesApiResponse = serde_json::from_str(body)
        .map_err(|e| RegistryFault::new(format!("unexpected check response: {e}")))?;

    // VIES reports member-state outages inside a 200 response
    if let Some(err) = api_resp.error_wrappers.as_ref().and_then(|e| e.first()) {
        let message = err
            .message
            .clone()
            .or_else(|| err.error.clone())
            .unwrap_or_else(|| "unknown error".into());
        return Err(RegistryFault {
            message,
            code: err.error.clone(),
        });
    }
    if let Some(code) = api_resp.user_error.filter(|c| c != "VALID" && c != "INVALID") {
        return Err(RegistryFault::with_code(format!("VIES rejected the request: {code}"), code));
    }

    Ok(RegistryResponse {
        valid: api_resp.valid.unwrap_or(false),
        request_date: api_resp.request_date.as_deref().and_then(parse_request_date),
        name: api_resp.name.filter(|n| n != "---" && !n.is_empty()),
        address: api_resp.address.filter(|a| a != "---" && !a.is_empty()),
    })
}

/// VIES sends `2024-01-15+01:00` or a full timestamp; the date is the first ten characters.
fn parse_request_date(raw: &str) -> Option<NaiveDate> {
    raw.get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

#[derive(Debug, Deserialize)]
struct ViesStatusResponse {
    vow: Option<ViesAvailability>,
}

#[derive(Debug, Deserialize)]
struct ViesAvailability {
    available: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViesApiResponse {
    valid: Option<bool>,
    request_date: Option<String>,
    name: Option<String>,
    address: Option<String>,
    user_error: Option<String>,
    error_wrappers: Option<Vec<ViesErrorWrapper>>,
}

#[derive(Debug, Deserialize)]
struct ViesErrorWrapper {
    error: Option<String>,
    message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ViesRequest {
    country_code: String,
    vat_number: String,
}
