//! Event relay integration.
//!
//! # Data Flow
//! ```text
//! ConfigurationController (after a successful save)
//!     → RelayBootstrapper::reinit()
//!     → implementation pulls the current snapshot from SettingsStore
//!     → tears down / re-establishes its broker connection
//! ```
//!
//! # Design Decisions
//! - Pull-based: `reinit` takes no settings, it reads the store at call time
//! - Never called while the settings writer lock is held
//! - Timeouts and retries belong to the implementation

pub mod probe;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use probe::ProbingBootstrapper;

/// Errors reported by a relay reinitialization.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Stored broker settings are missing fields.
    #[error("message broker settings are incomplete")]
    Incomplete,

    /// Host/port cannot form a dialable address.
    #[error("invalid broker endpoint: {0}")]
    InvalidEndpoint(String),

    /// The broker did not accept a connection.
    #[error("broker {endpoint} unreachable: {source}")]
    Unreachable {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// The broker did not answer within the connect timeout.
    #[error("broker {endpoint} did not respond within {secs}s")]
    Timeout { endpoint: String, secs: u64 },
}

/// Connection state as last observed by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayState {
    Idle,
    Connected,
    Failed,
    Disabled,
}

/// Snapshot of the relay after its latest reinit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayStatus {
    pub state: RelayState,
    /// Number of reinit attempts since startup.
    pub generation: u64,
    pub endpoint: Option<String>,
    pub exchange: Option<String>,
    pub workflow_queue: Option<String>,
    pub actions_queue: Option<String>,
    pub include_mode: Option<String>,
    pub events: Vec<&'static str>,
    pub custom_filter: Option<String>,
    pub last_error: Option<String>,
}

impl RelayStatus {
    pub fn idle() -> Self {
        Self {
            state: RelayState::Idle,
            generation: 0,
            endpoint: None,
            exchange: None,
            workflow_queue: None,
            actions_queue: None,
            include_mode: None,
            events: Vec::new(),
            custom_filter: None,
            last_error: None,
        }
    }
}

/// Reinitializes the event relay from the stored settings.
#[async_trait]
pub trait RelayBootstrapper: Send + Sync {
    async fn reinit(&self) -> Result<(), RelayError>;

    fn status(&self) -> RelayStatus;
}

/// Bootstrapper for deployments that run without the relay.
#[derive(Debug, Default)]
pub struct NoopBootstrapper;

#[async_trait]
impl RelayBootstrapper for NoopBootstrapper {
    async fn reinit(&self) -> Result<(), RelayError> {
        tracing::debug!("Relay disabled, skipping reinit");
        Ok(())
    }

    fn status(&self) -> RelayStatus {
        RelayStatus {
            state: RelayState::Disabled,
            ..RelayStatus::idle()
        }
    }
}
