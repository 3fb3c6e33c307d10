//! Applies administrator submissions to the settings store.
//!
//! # Data Flow
//! ```text
//! BoundSubmission
//!     → store.transaction on the blocking pool (writer lock held)
//!         → set or clear connection factory
//!         → overwrite broker settings and event filters (if posted)
//!         → persist, publish
//!     → lock released
//!     → relay.reinit() (if broker fields were posted)
//!     → SubmissionOutcome
//! ```
//!
//! # Design Decisions
//! - Both sections are written in one transaction with one save, so
//!   concurrent submissions never interleave
//! - Field checks are reported in the outcome but do not block the save
//! - A failed reinit becomes a warning in the outcome; the save stands

use std::sync::Arc;

use serde::Serialize;

use crate::observability::metrics;
use crate::relay::RelayBootstrapper;
use crate::settings::error::SettingsResult;
use crate::settings::store::SettingsStore;
use crate::settings::submission::{BoundSubmission, Submission};
use crate::settings::validation::{FieldCheck, RelayField};

/// A broker field that was saved despite failing its live check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldWarning {
    pub field: &'static str,
    pub message: &'static str,
}

/// What happened to an accepted submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    /// Broker fields were present, so a relay reinit was attempted.
    pub relay_fields_present: bool,
    /// Whether the stored broker settings are complete after the save.
    pub relay_settings_valid: bool,
    pub field_warnings: Vec<FieldWarning>,
    /// Set when the relay reinit failed.
    pub reinit_warning: Option<String>,
}

pub struct ConfigurationController {
    store: Arc<SettingsStore>,
    relay: Arc<dyn RelayBootstrapper>,
}

impl ConfigurationController {
    pub fn new(store: Arc<SettingsStore>, relay: Arc<dyn RelayBootstrapper>) -> Self {
        Self { store, relay }
    }

    pub fn store(&self) -> &Arc<SettingsStore> {
        &self.store
    }

    pub fn relay(&self) -> &Arc<dyn RelayBootstrapper> {
        &self.relay
    }

    /// Check, bind and apply a raw form submission.
    pub async fn submit(&self, submission: Submission) -> SettingsResult<SubmissionOutcome> {
        let field_warnings = submission
            .field_checks()
            .into_iter()
            .filter_map(|(field, check)| {
                check.message().map(|message| FieldWarning {
                    field: field.form_name(),
                    message,
                })
            })
            .collect::<Vec<_>>();

        for warning in &field_warnings {
            tracing::debug!(field = warning.field, message = warning.message, "Submitted field fails live check");
        }

        let mut outcome = self.apply_submission(submission.bind()?).await?;
        outcome.field_warnings = field_warnings;
        Ok(outcome)
    }

    /// Store a bound submission and trigger a relay reinit.
    ///
    /// Only a persistence failure is an error.
    pub async fn apply_submission(&self, submission: BoundSubmission) -> SettingsResult<SubmissionOutcome> {
        let BoundSubmission {
            connection_factory,
            relay,
        } = submission;
        let relay_fields_present = relay.is_some();
        let use_global = connection_factory.is_some();

        let store = self.store.clone();
        let saved = tokio::task::spawn_blocking(move || {
            store.transaction(|settings| {
                settings.set_connection_factory(connection_factory);
                if let Some(update) = relay {
                    settings.relay = update.messaging;
                    settings.filters = update.filters;
                }
            })
        })
        .await??;
        metrics::record_submission();

        tracing::info!(
            use_global,
            relay_fields_present,
            relay_valid = saved.are_settings_valid(),
            "Global settings saved"
        );

        let mut outcome = SubmissionOutcome {
            relay_fields_present,
            relay_settings_valid: saved.are_settings_valid(),
            ..Default::default()
        };

        if relay_fields_present {
            if let Err(e) = self.relay.reinit().await {
                tracing::error!(error = %e, "Relay reinit failed after settings save");
                outcome.reinit_warning = Some(e.to_string());
            }
        }

        Ok(outcome)
    }

    /// Live check for one broker field, as used by the settings form.
    pub fn check_field(&self, field: RelayField, raw: &str) -> FieldCheck {
        field.check(raw)
    }
}
