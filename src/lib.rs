//! Global settings service for the CI event relay.
//!
//! Accepts administrator-submitted settings, checks each broker field,
//! persists the record with encrypted secrets, and reinitializes the event
//! relay when broker settings change.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;
pub mod settings;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use settings::{ConfigurationController, SettingsStore};
