//! The administrator-submitted settings form.
//!
//! Field names follow the settings form (`actionHubMqHost`, ...). Binding
//! turns the raw form into typed updates; it only rejects what cannot be
//! represented at all (a connection-factory URL that does not parse, a
//! non-numeric port). Blank broker fields are accepted and stored as-is.

use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::settings::error::{SettingsError, SettingsResult};
use crate::settings::secret::Secret;
use crate::settings::types::{ConnectionFactory, EventFilterSettings, IncludeMode, RelayMessagingSettings};
use crate::settings::validation::{FieldCheck, RelayField};

/// Connection-factory sub-form.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionFactoryForm {
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl ConnectionFactoryForm {
    /// Structural binding: the URL must be absolute.
    pub fn bind(self) -> SettingsResult<ConnectionFactory> {
        url::Url::parse(self.url.trim()).map_err(|e| {
            SettingsError::Submission(format!("connectionFactory.url '{}': {}", self.url, e))
        })?;
        Ok(ConnectionFactory::new(self.url, self.username, Secret::new(self.password)))
    }
}

/// Raw settings form as posted by the configuration page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub connection_factory: Option<ConnectionFactoryForm>,

    pub action_hub_mq_host: Option<String>,
    #[serde(default, deserialize_with = "lenient_port")]
    pub action_hub_mq_port: Option<i32>,
    pub action_hub_mq_username: Option<String>,
    pub action_hub_mq_password: Option<String>,
    pub action_hub_mq_exchange: Option<String>,
    pub action_hub_mq_workflow_queue: Option<String>,
    pub action_hub_mq_actions_queue: Option<String>,

    pub action_hub_msg_include_radio: Option<String>,
    #[serde(default)]
    pub action_hub_msg_manual: bool,
    #[serde(default)]
    pub action_hub_msg_workitem: bool,
    #[serde(default)]
    pub action_hub_msg_commit: bool,
    #[serde(default)]
    pub action_hub_msg_build: bool,
    #[serde(default)]
    pub action_hub_msg_review: bool,
    #[serde(default)]
    pub action_hub_msg_custom: bool,
    pub action_hub_msg_custom_txt: Option<String>,
}

/// Broker settings and filters carried by a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayUpdate {
    pub messaging: RelayMessagingSettings,
    pub filters: EventFilterSettings,
}

/// A submission after binding, ready to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSubmission {
    pub connection_factory: Option<ConnectionFactory>,
    pub relay: Option<RelayUpdate>,
}

impl Submission {
    pub fn from_json(body: &str) -> SettingsResult<Self> {
        serde_json::from_str(body).map_err(|e| SettingsError::Submission(e.to_string()))
    }

    /// The broker section is present when the host field was posted.
    pub fn has_relay_fields(&self) -> bool {
        self.action_hub_mq_host.is_some()
    }

    /// Run every live check against the posted broker values.
    ///
    /// Failures are reported, not enforced.
    pub fn field_checks(&self) -> Vec<(RelayField, FieldCheck)> {
        if !self.has_relay_fields() {
            return Vec::new();
        }
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let port = self.action_hub_mq_port.unwrap_or(0).to_string();

        RelayField::ALL
            .into_iter()
            .map(|field| {
                let raw = match field {
                    RelayField::Host => text(&self.action_hub_mq_host),
                    RelayField::Port => port.clone(),
                    RelayField::Username => text(&self.action_hub_mq_username),
                    RelayField::Password => text(&self.action_hub_mq_password),
                    RelayField::Exchange => text(&self.action_hub_mq_exchange),
                    RelayField::WorkflowQueue => text(&self.action_hub_mq_workflow_queue),
                    RelayField::ActionsQueue => text(&self.action_hub_mq_actions_queue),
                };
                (field, field.check(&raw))
            })
            .collect()
    }

    pub fn bind(self) -> SettingsResult<BoundSubmission> {
        let relay = self.has_relay_fields().then(|| RelayUpdate {
            messaging: RelayMessagingSettings {
                host: self.action_hub_mq_host.clone().unwrap_or_default(),
                port: self.action_hub_mq_port.unwrap_or(0),
                username: self.action_hub_mq_username.clone().unwrap_or_default(),
                password: Secret::new(self.action_hub_mq_password.clone().unwrap_or_default()),
                exchange: self.action_hub_mq_exchange.clone().unwrap_or_default(),
                workflow_queue: self.action_hub_mq_workflow_queue.clone().unwrap_or_default(),
                actions_queue: self.action_hub_mq_actions_queue.clone().unwrap_or_default(),
            },
            filters: EventFilterSettings {
                include_mode: self.action_hub_msg_include_radio.clone().map(IncludeMode::new),
                manual: self.action_hub_msg_manual,
                workitem: self.action_hub_msg_workitem,
                commit: self.action_hub_msg_commit,
                build: self.action_hub_msg_build,
                review: self.action_hub_msg_review,
                custom: self.action_hub_msg_custom,
                custom_text: self.action_hub_msg_custom_txt.clone().unwrap_or_default(),
            },
        });

        let connection_factory = self.connection_factory.map(ConnectionFactoryForm::bind).transpose()?;

        Ok(BoundSubmission {
            connection_factory,
            relay,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(i64),
    Text(String),
}

/// Forms post the port either as a number or as text. Blank text is port 0.
fn lenient_port<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<PortValue>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(PortValue::Number(n)) => n,
        Some(PortValue::Text(s)) if s.trim().is_empty() => 0,
        Some(PortValue::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| de::Error::custom(format!("actionHubMqPort '{}' is not a number", s)))?,
    };
    i32::try_from(value)
        .map(Some)
        .map_err(|_| de::Error::custom(format!("actionHubMqPort {} is out of range", value)))
}
