//! # API Shared
//!
//! Shared definitions for the clinic APIs.
//!
//! Contains:
//! - Request/response types with OpenAPI schemas (`dto` module)
//! - `HealthService`
//! - Session-token validation
//!
//! Used by `api-rest` and the workspace's `clinic-run` binary.

pub mod auth;
pub mod dto;
pub mod health;

pub use auth::{validate_session_token, SESSION_HEADER};
pub use health::HealthService;
