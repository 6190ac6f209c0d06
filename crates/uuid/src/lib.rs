//! Record identifier utilities.
//!
//! Every record the clinic stores (patients, visits, medicines, prescription lines, expenses)
//! is keyed by a *canonical* UUID: **32 lowercase hexadecimal characters** (no hyphens).
//!
//! This crate provides:
//! - A wrapper type ([`RecordId`]) that *guarantees* the canonical format once constructed.
//! - [`CommitToken`], the idempotency token attached to a visit commit attempt.
//!
//! ## Canonical UUID form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Notes:
//! - This is the same value you would get from `Uuid::new_v4().simple().to_string()`.
//! - Canonical form is *required* for externally supplied identifiers (for example, from CLI/API
//!   inputs). Use [`RecordId::parse`] to validate an input string.
//! - Non-canonical values (uppercase, hyphenated, wrong length, non-hex) are rejected.

mod service;

pub use service::{CommitToken, RecordId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
