//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! service config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!
//! settings file changed on disk:
//!     watcher.rs detects change
//!     → SettingsStore::reload
//!     → relay reinit if the record changed
//! ```
//!
//! # Design Decisions
//! - Service config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::AdminConfig;
pub use schema::ObservabilityConfig;
pub use schema::RelayConfig;
pub use schema::ServiceConfig;
pub use schema::StorageConfig;
