//! Per-field validation of the message broker settings.
//!
//! # Responsibilities
//! - One pure check per relay-messaging form field
//! - Field-specific, human-readable failure messages
//! - Dispatch from a form field name to its check (live validation)
//!
//! # Design Decisions
//! - Checks never touch the settings store
//! - A blank value is one that is empty after trimming; the store's
//!   completeness predicate uses the same rule

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

pub const HOST_MISSING: &str = "Message broker host is required.";
pub const PORT_INVALID: &str = "Message broker port must be a number greater than 0.";
pub const USERNAME_MISSING: &str = "Message broker username is required.";
pub const PASSWORD_MISSING: &str = "Message broker password is required.";
pub const EXCHANGE_MISSING: &str = "Message broker exchange name is required.";
pub const WORKFLOW_ROUTING_KEY_MISSING: &str = "Workflow routing key (queue) is required.";
pub const ACTIONS_ROUTING_KEY_MISSING: &str = "Actions routing key (queue) is required.";

/// Result of a single field check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldCheck {
    Ok,
    Error { message: &'static str },
}

impl FieldCheck {
    pub fn is_ok(&self) -> bool {
        matches!(self, FieldCheck::Ok)
    }

    pub fn message(&self) -> Option<&'static str> {
        match *self {
            FieldCheck::Ok => None,
            FieldCheck::Error { message } => Some(message),
        }
    }
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn require(value: &str, message: &'static str) -> FieldCheck {
    if is_blank(value) {
        FieldCheck::Error { message }
    } else {
        FieldCheck::Ok
    }
}

pub fn check_host(value: &str) -> FieldCheck {
    require(value, HOST_MISSING)
}

pub fn check_port(value: i64) -> FieldCheck {
    if value < 1 {
        FieldCheck::Error { message: PORT_INVALID }
    } else {
        FieldCheck::Ok
    }
}

pub fn check_username(value: &str) -> FieldCheck {
    require(value, USERNAME_MISSING)
}

pub fn check_password(value: &str) -> FieldCheck {
    require(value, PASSWORD_MISSING)
}

pub fn check_exchange(value: &str) -> FieldCheck {
    require(value, EXCHANGE_MISSING)
}

pub fn check_workflow_queue(value: &str) -> FieldCheck {
    require(value, WORKFLOW_ROUTING_KEY_MISSING)
}

pub fn check_actions_queue(value: &str) -> FieldCheck {
    require(value, ACTIONS_ROUTING_KEY_MISSING)
}

/// Relay-messaging form fields that have a live check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayField {
    Host,
    Port,
    Username,
    Password,
    Exchange,
    WorkflowQueue,
    ActionsQueue,
}

impl RelayField {
    pub const ALL: [RelayField; 7] = [
        RelayField::Host,
        RelayField::Port,
        RelayField::Username,
        RelayField::Password,
        RelayField::Exchange,
        RelayField::WorkflowQueue,
        RelayField::ActionsQueue,
    ];

    /// Name of the field in the submitted settings form.
    pub fn form_name(self) -> &'static str {
        match self {
            RelayField::Host => "actionHubMqHost",
            RelayField::Port => "actionHubMqPort",
            RelayField::Username => "actionHubMqUsername",
            RelayField::Password => "actionHubMqPassword",
            RelayField::Exchange => "actionHubMqExchange",
            RelayField::WorkflowQueue => "actionHubMqWorkflowQueue",
            RelayField::ActionsQueue => "actionHubMqActionsQueue",
        }
    }

    /// Check a raw form value. A port that is not an integer fails like port 0.
    pub fn check(self, raw: &str) -> FieldCheck {
        match self {
            RelayField::Host => check_host(raw),
            RelayField::Port => check_port(raw.trim().parse().unwrap_or(0)),
            RelayField::Username => check_username(raw),
            RelayField::Password => check_password(raw),
            RelayField::Exchange => check_exchange(raw),
            RelayField::WorkflowQueue => check_workflow_queue(raw),
            RelayField::ActionsQueue => check_actions_queue(raw),
        }
    }
}

impl fmt::Display for RelayField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.form_name())
    }
}

/// Unknown form field name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no live check for field '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for RelayField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelayField::ALL
            .into_iter()
            .find(|field| field.form_name() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}
