//! HTTP mapping of core errors and the session extractor.

use api_shared::dto::ErrorRes;
use api_shared::{validate_session_token, SESSION_HEADER};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use clinic_core::session::Session;
use clinic_core::{ClinicError, RecordId};

use crate::AppState;

/// A [`ClinicError`] on its way out as an HTTP response with a `{ "error": ... }` body.
#[derive(Debug)]
pub struct ApiError(pub ClinicError);

impl From<ClinicError> for ApiError {
    fn from(e: ClinicError) -> Self {
        Self(e)
    }
}

pub fn status_for(e: &ClinicError) -> StatusCode {
    if e.is_validation() {
        StatusCode::BAD_REQUEST
    } else if e.is_auth() {
        StatusCode::UNAUTHORIZED
    } else if e.is_not_found() {
        StatusCode::NOT_FOUND
    } else if e.is_conflict() {
        StatusCode::CONFLICT
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        // Storage details stay in the log.
        let error = if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self.0);
            "Internal error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(ErrorRes { error })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

pub fn parse_id(raw: &str) -> ApiResult<RecordId> {
    RecordId::parse(raw).map_err(|e| ApiError(e.into()))
}

/// Live session resolved from the `x-session-token` header.
pub struct Authed(pub Session);

#[axum::async_trait]
impl FromRequestParts<AppState> for Authed {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok());
        let session = validate_session_token(state.clinic.auth(), provided)?;
        Ok(Authed(session))
    }
}
