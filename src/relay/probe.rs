//! Relay bootstrapper that verifies broker reachability.
//!
//! # Responsibilities
//! - Pull the current settings snapshot on every reinit
//! - Refuse incomplete broker settings
//! - Dial `host:port` under a connect timeout
//! - Publish a `RelayStatus` for the admin surface
//!
//! The broker protocol itself lives outside this crate; a successful probe
//! only means the endpoint accepted a TCP connection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time;

use crate::config::RelayConfig;
use crate::observability::metrics;
use crate::relay::{RelayBootstrapper, RelayError, RelayState, RelayStatus};
use crate::settings::types::GlobalSettings;
use crate::settings::SettingsStore;

pub struct ProbingBootstrapper {
    store: Arc<SettingsStore>,
    connect_timeout: Duration,
    generation: AtomicU64,
    status: ArcSwap<RelayStatus>,
    // Serializes reinits so status updates land in call order.
    reinit_lock: Mutex<()>,
}

impl ProbingBootstrapper {
    pub fn new(store: Arc<SettingsStore>, config: &RelayConfig) -> Self {
        Self {
            store,
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            generation: AtomicU64::new(0),
            status: ArcSwap::from_pointee(RelayStatus::idle()),
            reinit_lock: Mutex::new(()),
        }
    }

    async fn probe(&self, settings: &GlobalSettings) -> Result<(), RelayError> {
        if !settings.are_settings_valid() {
            return Err(RelayError::Incomplete);
        }

        let relay = &settings.relay;
        let endpoint = relay.endpoint();
        let port = u16::try_from(relay.port).map_err(|_| RelayError::InvalidEndpoint(endpoint.clone()))?;

        match time::timeout(self.connect_timeout, TcpStream::connect((relay.host.trim(), port))).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(source)) => Err(RelayError::Unreachable { endpoint, source }),
            Err(_) => Err(RelayError::Timeout {
                endpoint,
                secs: self.connect_timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl RelayBootstrapper for ProbingBootstrapper {
    async fn reinit(&self) -> Result<(), RelayError> {
        let _guard = self.reinit_lock.lock().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let settings = self.store.snapshot();

        tracing::info!(
            generation,
            endpoint = %settings.relay.endpoint(),
            exchange = %settings.relay.exchange,
            "Reinitializing event relay"
        );

        let result = self.probe(&settings).await;

        let filters = &settings.filters;
        let configured = settings.are_settings_valid();
        let status = RelayStatus {
            state: if result.is_ok() { RelayState::Connected } else { RelayState::Failed },
            generation,
            endpoint: configured.then(|| settings.relay.endpoint()),
            exchange: configured.then(|| settings.relay.exchange.clone()),
            workflow_queue: configured.then(|| settings.relay.workflow_queue.clone()),
            actions_queue: configured.then(|| settings.relay.actions_queue.clone()),
            include_mode: filters.include_mode.as_ref().map(|m| m.as_str().to_string()),
            events: filters.published_kinds(),
            custom_filter: filters.custom_filter().map(str::to_string),
            last_error: result.as_ref().err().map(|e| e.to_string()),
        };
        self.status.store(Arc::new(status));
        metrics::record_reinit(result.is_ok());

        match &result {
            Ok(()) => tracing::info!(generation, "Event relay reinitialized"),
            Err(e) => tracing::warn!(generation, error = %e, "Event relay reinit failed"),
        }
        result
    }

    fn status(&self) -> RelayStatus {
        RelayStatus::clone(&self.status.load())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::secret::{Secret, SecretCipher};
    use crate::settings::types::{EventFilterSettings, IncludeMode, RelayMessagingSettings};
    use tokio::net::TcpListener;

    fn store_with(dir: &tempfile::TempDir, relay: RelayMessagingSettings) -> Arc<SettingsStore> {
        let store = Arc::new(SettingsStore::load(dir.path().join("settings.json"), SecretCipher::generate()));
        store.transaction(|s| s.relay = relay).unwrap();
        store
    }

    fn relay_at(port: u16) -> RelayMessagingSettings {
        RelayMessagingSettings {
            host: "127.0.0.1".into(),
            port: i32::from(port),
            username: "u".into(),
            password: Secret::new("p"),
            exchange: "ex".into(),
            workflow_queue: "wf".into(),
            actions_queue: "act".into(),
        }
    }

    #[tokio::test]
    async fn test_reinit_connects_to_listening_broker() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, relay_at(port));
        store
            .transaction(|s| s.filters.include_mode = Some(IncludeMode::new(IncludeMode::ALL)))
            .unwrap();
        let relay = ProbingBootstrapper::new(store, &RelayConfig::default());

        relay.reinit().await.unwrap();
        let status = relay.status();
        assert_eq!(status.state, RelayState::Connected);
        assert_eq!(status.include_mode.as_deref(), Some("all"));
        assert_eq!(status.events, EventFilterSettings::KINDS.to_vec());
        assert_eq!(status.generation, 1);
        assert_eq!(status.endpoint, Some(format!("127.0.0.1:{}", port)));
        assert_eq!(status.workflow_queue.as_deref(), Some("wf"));
        assert!(status.last_error.is_none());
    }

    #[tokio::test]
    async fn test_incomplete_settings_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = relay_at(5672);
        settings.exchange.clear();
        let relay = ProbingBootstrapper::new(store_with(&dir, settings), &RelayConfig::default());

        let result = relay.reinit().await;
        assert!(matches!(result, Err(RelayError::Incomplete)));
        assert_eq!(relay.status().state, RelayState::Failed);
        assert!(relay.status().endpoint.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_broker_reports_failure() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let dir = tempfile::tempdir().unwrap();
        let relay = ProbingBootstrapper::new(store_with(&dir, relay_at(port)), &RelayConfig::default());

        assert!(relay.reinit().await.is_err());
        assert!(relay.reinit().await.is_err());
        let status = relay.status();
        assert_eq!(status.state, RelayState::Failed);
        assert_eq!(status.generation, 2);
        assert!(status.last_error.is_some());
    }

    #[tokio::test]
    async fn test_out_of_range_port() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = relay_at(1);
        settings.port = 70_000;
        let relay = ProbingBootstrapper::new(store_with(&dir, settings), &RelayConfig::default());

        assert!(matches!(relay.reinit().await, Err(RelayError::InvalidEndpoint(_))));
    }
}
