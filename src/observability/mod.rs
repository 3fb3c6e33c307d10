//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Secrets are never logged; `Secret` is redacted in Debug/Display
//! - Metrics are cheap (atomic increments) and optional

pub mod logging;
pub mod metrics;
