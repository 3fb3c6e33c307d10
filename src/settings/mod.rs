//! Global settings subsystem.
//!
//! # Data Flow
//! ```text
//! settings form (JSON)
//!     → submission.rs (deserialize, bind connection factory)
//!     → validation.rs (per-field checks, reported not enforced)
//!     → controller.rs (single transaction, then relay reinit)
//!     → store.rs (persist with encrypted secrets, publish snapshot)
//!     → readers take snapshots via SettingsStore
//! ```
//!
//! # Design Decisions
//! - The store is constructed once at startup and shared via Arc
//! - Secrets are opaque in memory and encrypted on disk
//! - Partial broker settings are storable; `are_settings_valid` gates use

pub mod controller;
pub mod error;
pub mod secret;
pub mod store;
pub mod submission;
pub mod types;
pub mod validation;

pub use controller::{ConfigurationController, FieldWarning, SubmissionOutcome};
pub use error::{SettingsError, SettingsResult};
pub use secret::{Secret, SecretCipher};
pub use store::SettingsStore;
pub use submission::{BoundSubmission, Submission};
pub use types::{ConnectionFactory, EventFilterSettings, GlobalSettings, IncludeMode, RelayMessagingSettings};
pub use validation::{FieldCheck, RelayField};
