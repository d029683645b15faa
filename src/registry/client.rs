//! Lazily connected VAT registry client.
//!
//! The connection is opened on the first validation. Once it is open, or
//! once opening it has failed with fault forwarding off, the client never
//! connects again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::number::VatNumber;
use crate::core::{CalculatorConfig, Result, VatError};

/// Which registry deployment to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// Live registry.
    Production,
    /// Test service with canned answers.
    Sandbox,
}

/// Failure reported by the transport or the registry itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryFault {
    /// Human-readable description.
    pub message: String,
    /// Registry fault code (e.g. "MS_UNAVAILABLE"), if any.
    pub code: Option<String>,
}

impl RegistryFault {
    /// Fault without a code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Fault with a registry code.
    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code.into()),
        }
    }
}

impl std::fmt::Display for RegistryFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{code}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for RegistryFault {}

impl From<RegistryFault> for VatError {
    fn from(fault: RegistryFault) -> Self {
        VatError::RegistryUnavailable {
            message: fault.message,
            code: fault.code,
        }
    }
}

/// Registry verdict for one VAT number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryResponse {
    /// Whether the number is currently registered.
    pub valid: bool,
    /// Date the registry answered the request.
    pub request_date: Option<NaiveDate>,
    /// Registered trader name, if disclosed.
    pub name: Option<String>,
    /// Registered trader address, if disclosed.
    pub address: Option<String>,
}

/// Result of [`ValidationClient::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationOutcome {
    /// The registry answered; see `valid`.
    Checked(RegistryResponse),
    /// The registry could not be asked. Says nothing about the number.
    Unverifiable,
}

impl ValidationOutcome {
    /// `true` only when the registry confirmed the number.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Checked(r) if r.valid)
    }

    /// Whether the registry gave a verdict.
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Checked(_))
    }

    /// Registry details, if any.
    pub fn response(&self) -> Option<&RegistryResponse> {
        match self {
            Self::Checked(r) => Some(r),
            Self::Unverifiable => None,
        }
    }
}

/// An open registry connection.
pub trait Registry: Send + Sync {
    /// Ask the registry about one number. Blocks up to the connect timeout.
    fn check(&self, number: &VatNumber) -> std::result::Result<RegistryResponse, RegistryFault>;
}

/// Opens registry connections.
pub trait RegistryConnector {
    /// Connection type produced.
    type Handle: Registry;

    /// Open a connection to `endpoint`. This is the only network call
    /// besides [`Registry::check`].
    fn connect(
        &self,
        endpoint: Endpoint,
        timeout: Duration,
    ) -> std::result::Result<Self::Handle, RegistryFault>;
}

/// Lifecycle of the client's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientStatus {
    /// No connection attempt has settled yet.
    Uninitialized,
    /// Connected; every call goes to the registry.
    Ready,
    /// Connecting failed; every call is answered locally as unverifiable.
    PermanentlyUnavailable,
}

enum ClientState<H> {
    Uninitialized,
    Ready(Arc<H>),
    PermanentlyUnavailable,
}

/// VAT number validation against a remote registry.
///
/// Safe to share between threads: concurrent first calls connect once.
pub struct ValidationClient<C: RegistryConnector> {
    connector: C,
    timeout: Duration,
    forward_faults: bool,
    use_sandbox: AtomicBool,
    state: Mutex<ClientState<C::Handle>>,
}

impl<C: RegistryConnector> ValidationClient<C> {
    /// Client taking timeout, fault forwarding and endpoint from `config`.
    pub fn new(connector: C, config: &CalculatorConfig) -> Self {
        Self {
            connector,
            timeout: config.timeout,
            forward_faults: config.forward_faults,
            use_sandbox: AtomicBool::new(config.use_sandbox),
            state: Mutex::new(ClientState::Uninitialized),
        }
    }

    /// Switch between sandbox and production. Only takes effect if no
    /// connection has been opened yet.
    pub fn use_sandbox(&self, sandbox: bool) {
        self.use_sandbox.store(sandbox, Ordering::SeqCst);
    }

    /// Endpoint the next connection attempt would use.
    pub fn endpoint(&self) -> Endpoint {
        if self.use_sandbox.load(Ordering::SeqCst) {
            Endpoint::Sandbox
        } else {
            Endpoint::Production
        }
    }

    /// Current lifecycle state.
    pub fn status(&self) -> ClientStatus {
        match &*self.state.lock().unwrap_or_else(PoisonError::into_inner) {
            ClientState::Uninitialized => ClientStatus::Uninitialized,
            ClientState::Ready(_) => ClientStatus::Ready,
            ClientState::PermanentlyUnavailable => ClientStatus::PermanentlyUnavailable,
        }
    }

    /// Validate a VAT number (with country prefix) against the registry.
    ///
    /// With fault forwarding off this never fails: malformed input,
    /// connection and request failures all come back as
    /// [`ValidationOutcome::Unverifiable`]. Malformed input never reaches
    /// the registry.
    ///
    /// # Errors
    ///
    /// Only with fault forwarding on:
    /// `VatError::InvalidVatNumber` for malformed input.
    /// `VatError::RegistryUnavailable` for connection or request failures.
    /// A failed connection then leaves the client uninitialized, so the
    /// next call tries again.
    pub fn validate(&self, vat_number: &str) -> Result<ValidationOutcome> {
        let number = match VatNumber::parse(vat_number) {
            Ok(number) => number,
            Err(err) if self.forward_faults => return Err(err),
            Err(err) => {
                warn!(%err, "malformed VAT number not sent to the registry");
                return Ok(ValidationOutcome::Unverifiable);
            }
        };

        let Some(registry) = self.ensure_connected()? else {
            return Ok(ValidationOutcome::Unverifiable);
        };

        match registry.check(&number) {
            Ok(response) => Ok(ValidationOutcome::Checked(response)),
            Err(fault) => {
                warn!(vat_number = %number, %fault, "VAT registry request failed");
                if self.forward_faults {
                    Err(fault.into())
                } else {
                    Ok(ValidationOutcome::Unverifiable)
                }
            }
        }
    }

    /// Connect on first use. The lock is held across the attempt so that
    /// concurrent callers wait for its result instead of connecting again.
    fn ensure_connected(&self) -> Result<Option<Arc<C::Handle>>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match &*state {
            ClientState::Ready(registry) => return Ok(Some(Arc::clone(registry))),
            ClientState::PermanentlyUnavailable => return Ok(None),
            ClientState::Uninitialized => {}
        }

        let endpoint = self.endpoint();
        match self.connector.connect(endpoint, self.timeout) {
            Ok(handle) => {
                info!(?endpoint, "VAT registry connected");
                let registry = Arc::new(handle);
                *state = ClientState::Ready(Arc::clone(&registry));
                Ok(Some(registry))
            }
            Err(fault) if self.forward_faults => {
                warn!(?endpoint, %fault, "VAT registry connection failed");
                Err(fault.into())
            }
            Err(fault) => {
                warn!(?endpoint, %fault, "VAT registry connection failed, disabling validation");
                *state = ClientState::PermanentlyUnavailable;
                Ok(None)
            }
        }
    }
}

impl<C: RegistryConnector + std::fmt::Debug> std::fmt::Debug for ValidationClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationClient")
            .field("connector", &self.connector)
            .field("timeout", &self.timeout)
            .field("forward_faults", &self.forward_faults)
            .field("endpoint", &self.endpoint())
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Counters {
        connects: AtomicUsize,
        checks: AtomicUsize,
    }

    struct Stub {
        fail_connect: bool,
        counters: Arc<Counters>,
    }

    struct StubRegistry(Arc<Counters>);

    impl Registry for StubRegistry {
        fn check(&self, number: &VatNumber) -> std::result::Result<RegistryResponse, RegistryFault> {
            self.0.checks.fetch_add(1, Ordering::SeqCst);
            Ok(RegistryResponse {
                valid: number.number() != "0",
                request_date: None,
                name: None,
                address: None,
            })
        }
    }

    impl RegistryConnector for Stub {
        type Handle = StubRegistry;

        fn connect(
            &self,
            _endpoint: Endpoint,
            _timeout: Duration,
        ) -> std::result::Result<StubRegistry, RegistryFault> {
            self.counters.connects.fetch_add(1, Ordering::SeqCst);
            if self.fail_connect {
                Err(RegistryFault::with_code("down", "SERVICE_UNAVAILABLE"))
            } else {
                Ok(StubRegistry(Arc::clone(&self.counters)))
            }
        }
    }

    fn client(fail_connect: bool, forward: bool) -> (ValidationClient<Stub>, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let stub = Stub {
            fail_connect,
            counters: Arc::clone(&counters),
        };
        let config = CalculatorConfig::default().with_forward_faults(forward);
        (ValidationClient::new(stub, &config), counters)
    }

    #[test]
    fn starts_uninitialized_without_connecting() {
        let (c, counters) = client(false, false);
        assert_eq!(c.status(), ClientStatus::Uninitialized);
        assert_eq!(counters.connects.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn connects_on_first_validate() {
        let (c, counters) = client(false, false);
        assert!(c.validate("RO123").unwrap().is_valid());
        assert!(!c.validate("RO0").unwrap().is_valid());
        assert!(c.validate("RO0").unwrap().is_verified());
        assert_eq!(c.status(), ClientStatus::Ready);
        assert_eq!(counters.connects.load(Ordering::SeqCst), 1);
        assert_eq!(counters.checks.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn failed_connect_disables_client() {
        let (c, counters) = client(true, false);
        assert_eq!(c.validate("ANY").unwrap(), ValidationOutcome::Unverifiable);
        assert_eq!(c.status(), ClientStatus::PermanentlyUnavailable);
        assert_eq!(c.validate("ANY").unwrap(), ValidationOutcome::Unverifiable);
        assert_eq!(counters.connects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn forwarded_fault_keeps_client_uninitialized() {
        let (c, counters) = client(true, true);
        let err = c.validate("ANY").unwrap_err();
        assert_eq!(
            err,
            VatError::RegistryUnavailable {
                message: "down".into(),
                code: Some("SERVICE_UNAVAILABLE".into()),
            }
        );
        assert_eq!(c.status(), ClientStatus::Uninitialized);
        assert!(c.validate("ANY").is_err());
        assert_eq!(counters.connects.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn malformed_number_does_not_connect() {
        let (c, counters) = client(false, true);
        assert!(matches!(
            c.validate("12"),
            Err(VatError::InvalidVatNumber { .. })
        ));
        assert_eq!(counters.connects.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn malformed_number_unverifiable_without_forwarding() {
        let (c, counters) = client(false, false);
        assert_eq!(c.validate("12").unwrap(), ValidationOutcome::Unverifiable);
        assert_eq!(c.validate("RO 12!").unwrap(), ValidationOutcome::Unverifiable);
        assert_eq!(c.status(), ClientStatus::Uninitialized);
        assert_eq!(counters.connects.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn sandbox_switch() {
        let (c, _) = client(false, false);
        assert_eq!(c.endpoint(), Endpoint::Production);
        c.use_sandbox(true);
        assert_eq!(c.endpoint(), Endpoint::Sandbox);
    }

    #[test]
    fn outcome_helpers() {
        assert!(!ValidationOutcome::Unverifiable.is_valid());
        assert!(ValidationOutcome::Unverifiable.response().is_none());
        let fault = RegistryFault::with_code("busy", "MS_MAX_CONCURRENT_REQ");
        assert_eq!(fault.to_string(), "[MS_MAX_CONCURRENT_REQ] busy");
        assert_eq!(RegistryFault::new("timeout").to_string(), "timeout");
    }
}
