//! # opencourse-server
//!
//! HTTP server for the OpenCourse learning-management backend.
//!
//! Wires the crates together: configuration loading and validation, tracing
//! bootstrap, the axum router with per-resource handlers, and the server
//! lifecycle with graceful shutdown.

pub mod config;
pub mod error;
pub mod handlers;
pub mod observability;
pub mod server;
pub mod state;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use server::{OpencourseServer, ServerBuilder, build_app};
pub use state::AppState;
