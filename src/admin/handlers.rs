use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::relay::RelayStatus;
use crate::settings::{
    EventFilterSettings, FieldCheck, GlobalSettings, RelayField, Submission, SubmissionOutcome,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub use_global: bool,
    pub relay_settings_valid: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionFactoryView {
    pub url: String,
    pub username: String,
    pub password_set: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerView {
    pub host: String,
    pub port: i32,
    pub username: String,
    pub password_set: bool,
    pub exchange: String,
    pub workflow_queue: String,
    pub actions_queue: String,
}

/// Settings as shown to administrators. Secrets are reduced to "is set".
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub use_global: bool,
    pub connection_factory: Option<ConnectionFactoryView>,
    pub broker: BrokerView,
    pub filters: EventFilterSettings,
    pub relay_settings_valid: bool,
}

impl From<&GlobalSettings> for SettingsView {
    fn from(settings: &GlobalSettings) -> Self {
        let relay = &settings.relay;
        Self {
            use_global: settings.use_global(),
            connection_factory: settings.connection_factory().map(|cf| ConnectionFactoryView {
                url: cf.url,
                username: cf.username,
                password_set: !cf.password.is_empty(),
            }),
            broker: BrokerView {
                host: relay.host.clone(),
                port: relay.port,
                username: relay.username.clone(),
                password_set: !relay.password.is_empty(),
                exchange: relay.exchange.clone(),
                workflow_queue: relay.workflow_queue.clone(),
                actions_queue: relay.actions_queue.clone(),
            },
            filters: settings.filters.clone(),
            relay_settings_valid: settings.are_settings_valid(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckParams {
    #[serde(default)]
    pub value: String,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let settings = state.controller.store().snapshot();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        use_global: settings.use_global(),
        relay_settings_valid: settings.are_settings_valid(),
    })
}

pub async fn get_settings(State(state): State<AppState>) -> Json<SettingsView> {
    let settings = state.controller.store().snapshot();
    Json(SettingsView::from(settings.as_ref()))
}

pub async fn post_settings(
    State(state): State<AppState>,
    payload: Result<Json<Submission>, JsonRejection>,
) -> Result<Json<SubmissionOutcome>, ApiError> {
    let Json(submission) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let outcome = state.controller.submit(submission).await?;
    Ok(Json(outcome))
}

pub async fn check_field(
    State(state): State<AppState>,
    Path(field): Path<String>,
    Query(params): Query<CheckParams>,
) -> Result<Json<FieldCheck>, ApiError> {
    let field = field
        .parse::<RelayField>()
        .map_err(|e| ApiError::NotFound(e.to_string()))?;
    Ok(Json(state.controller.check_field(field, &params.value)))
}

pub async fn get_relay_status(State(state): State<AppState>) -> Json<RelayStatus> {
    Json(state.controller.relay().status())
}
