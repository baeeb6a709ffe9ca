//! # Billing Session
//!
//! Connection lifecycle for the billing service: one idempotent open path,
//! invalidation on spontaneous disconnect, and the readiness gate every
//! purchase-affecting operation checks before touching the service.

use iap_core::{ServiceResult, SharedBillingService};
use tracing::{debug, error, info};

/// Connection state as tracked on the bridge side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Result of an [`BillingSession::open`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum OpenOutcome {
    /// A connection was already up or in progress; nothing was done.
    AlreadyConnected,
    /// A connection attempt ran and finished with this result.
    Attempted(ServiceResult),
}

/// Owns the connection lifecycle to the billing service.
pub struct BillingSession {
    service: SharedBillingService,
    state: ConnectionState,
    /// True once any connection attempt has succeeded. Survives disconnects
    /// so the resume hook knows a re-open is warranted.
    initialized: bool,
}

impl BillingSession {
    pub fn new(service: SharedBillingService) -> Self {
        Self {
            service,
            state: ConnectionState::Disconnected,
            initialized: false,
        }
    }

    pub fn service(&self) -> &SharedBillingService {
        &self.service
    }

    /// Open the connection. No-op while a connection is up or in progress;
    /// otherwise runs exactly one attempt. Failures are reported, not retried.
    pub async fn open(&mut self) -> OpenOutcome {
        if self.is_valid() {
            debug!("billing connection already open, skipping");
            return OpenOutcome::AlreadyConnected;
        }

        self.state = ConnectionState::Connecting;
        let result = self.service.start_connection().await;

        if result.is_ok() {
            info!("billing service connection established");
            self.initialized = true;
            self.state = ConnectionState::Connected;
        } else {
            error!(%result, "billing service connection failed");
            self.initialized = false;
            self.state = ConnectionState::Disconnected;
        }

        OpenOutcome::Attempted(result)
    }

    /// Spontaneous disconnect: drop the connection but remember that the
    /// session was initialized, so the next resume re-opens it.
    pub fn invalidate(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    /// Tear down the connection (lifecycle stop).
    pub async fn close(&mut self) {
        self.service.end_connection().await;
        self.state = ConnectionState::Disconnected;
    }

    /// Whether any connection attempt has ever succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether a connection is currently up or being established.
    pub fn is_valid(&self) -> bool {
        matches!(
            self.state,
            ConnectionState::Connected | ConnectionState::Connecting
        )
    }

    /// Readiness gate: initialized, connected, and the service accepts calls.
    pub fn is_ready(&self) -> bool {
        self.initialized && self.state == ConnectionState::Connected && self.service.is_ready()
    }
}
