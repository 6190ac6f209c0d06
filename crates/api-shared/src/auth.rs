use clinic_core::session::{AuthService, Session};
use clinic_core::{ClinicError, ClinicResult};

/// Request header carrying the session token issued by login.
pub const SESSION_HEADER: &str = "x-session-token";

/// Resolves the token presented by a client to its live session.
///
/// A missing or blank token is [`ClinicError::Unauthenticated`]; an unknown one likewise, and a
/// token past its expiry is [`ClinicError::SessionExpired`].
pub fn validate_session_token(auth: &AuthService, provided: Option<&str>) -> ClinicResult<Session> {
    let token = provided
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ClinicError::Unauthenticated)?;
    auth.session_for_token(token)
}
