//! Shared helpers for integration tests.

use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

use relay_settings::config::ServiceConfig;
use relay_settings::http::{AppState, HttpServer};
use relay_settings::relay::{RelayBootstrapper, RelayError, RelayStatus};
use relay_settings::settings::{ConfigurationController, SecretCipher, SettingsStore};

pub const API_KEY: &str = "test-admin-key";

/// A relay whose reinit always fails, as if the broker were down.
pub struct FailingRelay;

#[async_trait::async_trait]
impl RelayBootstrapper for FailingRelay {
    async fn reinit(&self) -> Result<(), RelayError> {
        Err(RelayError::Timeout {
            endpoint: "mq.example.com:5672".into(),
            secs: 5,
        })
    }

    fn status(&self) -> RelayStatus {
        RelayStatus::idle()
    }
}

/// Store, controller and a temp directory that must outlive them.
pub struct Harness {
    pub dir: TempDir,
    pub cipher: SecretCipher,
    pub store: Arc<SettingsStore>,
    pub controller: Arc<ConfigurationController>,
}

impl Harness {
    pub fn new(relay: Arc<dyn RelayBootstrapper>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let cipher = SecretCipher::generate();
        let store = Arc::new(SettingsStore::load(dir.path().join("settings.json"), cipher.clone()));
        let controller = Arc::new(ConfigurationController::new(store.clone(), relay));
        Self {
            dir,
            cipher,
            store,
            controller,
        }
    }

    #[allow(dead_code)]
    pub fn with_failing_relay() -> Self {
        Self::new(Arc::new(FailingRelay))
    }

    /// Router wired exactly as the server wires it.
    #[allow(dead_code)]
    pub fn router(&self) -> axum::Router {
        let state = AppState::new(self.controller.clone(), API_KEY);
        HttpServer::new(&ServiceConfig::default(), state).router()
    }

    /// A fresh store over the same file, as after a process restart.
    #[allow(dead_code)]
    pub fn restart(&self) -> SettingsStore {
        SettingsStore::load(self.store.path(), self.cipher.clone())
    }
}

/// A complete settings form.
pub fn full_form(tag: &str) -> Value {
    json!({
        "connectionFactory": {
            "url": format!("https://{}.example.com", tag),
            "username": format!("{}-user", tag),
            "password": format!("{}-secret", tag)
        },
        "actionHubMqHost": format!("mq-{}.example.com", tag),
        "actionHubMqPort": 5672,
        "actionHubMqUsername": format!("{}-mq", tag),
        "actionHubMqPassword": format!("{}-mq-secret", tag),
        "actionHubMqExchange": format!("{}-exchange", tag),
        "actionHubMqWorkflowQueue": format!("{}-wf", tag),
        "actionHubMqActionsQueue": format!("{}-act", tag),
        "actionHubMsgIncludeRadio": "selected",
        "actionHubMsgBuild": true,
        "actionHubMsgCustomTxt": tag
    })
}
