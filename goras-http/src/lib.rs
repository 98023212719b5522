//! goras-http: axum adapter for Goras.
//!
//! Mounts REST routers over registered services, resolves the tenant from
//! the `Host` header, and maps structured errors onto HTTP responses.

pub mod app;
mod error;
pub mod rest;
pub mod state;

pub use app::{serve, HttpApp};
pub use error::HttpError;
pub use state::HttpState;
