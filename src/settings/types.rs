//! Settings record definitions.
//!
//! `GlobalSettings` is the single combined record owned by the settings store.
//! Connection-factory fields are private so the all-or-nothing invariant
//! (`use_global` iff url, username and password are set) holds by construction.

use serde::{Deserialize, Serialize};

use crate::settings::secret::Secret;
use crate::settings::validation::is_blank;

/// Credentials for the primary CI-integration backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionFactory {
    pub url: String,
    pub username: String,
    pub password: Secret,
}

impl ConnectionFactory {
    pub fn new(url: impl Into<String>, username: impl Into<String>, password: impl Into<Secret>) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Message broker settings used by the event relay.
///
/// Partially filled settings are representable; `is_complete` tells whether
/// they are usable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayMessagingSettings {
    pub host: String,
    pub port: i32,
    pub username: String,
    pub password: Secret,
    pub exchange: String,
    pub workflow_queue: String,
    pub actions_queue: String,
}

impl RelayMessagingSettings {
    /// All seven fields present and port >= 1.
    pub fn is_complete(&self) -> bool {
        !is_blank(&self.host)
            && self.port >= 1
            && !is_blank(&self.username)
            && !is_blank(self.password.reveal())
            && !is_blank(&self.exchange)
            && !is_blank(&self.workflow_queue)
            && !is_blank(&self.actions_queue)
    }

    /// `host:port` as the relay would dial it.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host.trim(), self.port)
    }
}

/// Which events the relay publishes, stored verbatim from the form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncludeMode(String);

impl IncludeMode {
    pub const ALL: &'static str = "all";
    pub const SELECTED: &'static str = "selected";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_all(&self) -> bool {
        self.0 == Self::ALL
    }
}

/// Event-type filters applied by the relay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventFilterSettings {
    pub include_mode: Option<IncludeMode>,
    pub manual: bool,
    pub workitem: bool,
    pub commit: bool,
    pub build: bool,
    pub review: bool,
    pub custom: bool,
    pub custom_text: String,
}

impl EventFilterSettings {
    pub const KINDS: [&'static str; 6] = ["manual", "workitem", "commit", "build", "review", "custom"];

    /// Names of the event kinds switched on, in form order.
    pub fn enabled_kinds(&self) -> Vec<&'static str> {
        let switches = [self.manual, self.workitem, self.commit, self.build, self.review, self.custom];
        Self::KINDS
            .into_iter()
            .zip(switches)
            .filter_map(|(name, on)| on.then_some(name))
            .collect()
    }

    /// Event kinds the relay publishes: every kind in "all" mode, otherwise
    /// the switched-on ones.
    pub fn published_kinds(&self) -> Vec<&'static str> {
        match &self.include_mode {
            Some(mode) if mode.is_all() => Self::KINDS.to_vec(),
            _ => self.enabled_kinds(),
        }
    }

    /// Custom filter text; only meaningful while `custom` is on.
    pub fn custom_filter(&self) -> Option<&str> {
        self.custom.then_some(self.custom_text.as_str())
    }
}

/// The process-wide settings record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalSettings {
    url: Option<String>,
    username: Option<String>,
    password: Option<Secret>,
    use_global: bool,
    pub relay: RelayMessagingSettings,
    pub filters: EventFilterSettings,
}

impl GlobalSettings {
    /// Replace the connection-factory fields. `None` clears all three.
    pub fn set_connection_factory(&mut self, factory: Option<ConnectionFactory>) {
        match factory {
            Some(cf) => {
                self.url = Some(cf.url);
                self.username = Some(cf.username);
                self.password = Some(cf.password);
                self.use_global = true;
            }
            None => {
                self.url = None;
                self.username = None;
                self.password = None;
                self.use_global = false;
            }
        }
    }

    /// The stored connection factory, or `None` when global use is off.
    pub fn connection_factory(&self) -> Option<ConnectionFactory> {
        if !self.use_global {
            return None;
        }
        match (&self.url, &self.username, &self.password) {
            (Some(url), Some(username), Some(password)) => Some(ConnectionFactory {
                url: url.clone(),
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }

    pub fn use_global(&self) -> bool {
        self.use_global
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&Secret> {
        self.password.as_ref()
    }

    /// Whether the message broker settings are complete enough to connect.
    pub fn are_settings_valid(&self) -> bool {
        self.relay.is_complete()
    }
}
