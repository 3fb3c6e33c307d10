//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, trace)
//!     → admin routes (bearer auth, settings handlers)
//!     → response.rs (error mapping)
//! ```

pub mod response;
pub mod server;

pub use response::ApiError;
pub use server::{AppState, HttpServer};
