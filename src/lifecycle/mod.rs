//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Init logging → Load settings → Start relay → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C → broadcast → server drains, watcher loop exits
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
