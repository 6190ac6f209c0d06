//! Staff sessions.
//!
//! A session is an explicit value: callers hold it and hand it to every write operation, which
//! checks it against the registry kept by [`AuthService`]. Nothing here is process-global; two
//! `AuthService`s never see each other's sessions.

use crate::config::{hash_pin, validate_pin_format, CoreConfig};
use crate::{ClinicError, ClinicResult, NonEmptyText};
use chrono::{DateTime, Utc};
use clinic_uuid::RecordId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub operator: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Clone, Debug)]
pub struct AuthService {
    cfg: Arc<CoreConfig>,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl AuthService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            cfg,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Checks `pin` and opens a session for `operator` (or the configured default examiner).
    pub fn login(&self, pin: &str, operator: Option<NonEmptyText>) -> ClinicResult<Session> {
        self.login_at(pin, operator, Utc::now())
    }

    pub fn login_at(
        &self,
        pin: &str,
        operator: Option<NonEmptyText>,
        now: DateTime<Utc>,
    ) -> ClinicResult<Session> {
        let pin = pin.trim();
        validate_pin_format(pin)?;
        if hash_pin(pin) != self.cfg.staff_pin_sha256() {
            tracing::warn!("rejected login with wrong PIN");
            return Err(ClinicError::InvalidCredentials);
        }

        let operator = operator
            .unwrap_or_else(|| self.cfg.default_examiner().clone())
            .into_string();
        let expires_at = now
            .checked_add_signed(self.cfg.session_ttl())
            .ok_or_else(|| ClinicError::InvalidInput("session expiry is out of range".into()))?;
        let session = Session {
            token: RecordId::new().to_string(),
            operator,
            issued_at: now,
            expires_at,
        };

        let mut sessions = self.sessions.write().map_err(|_| ClinicError::LockPoisoned)?;
        sessions.retain(|_, s| !s.is_expired_at(now));
        sessions.insert(session.token.clone(), session.clone());
        tracing::info!(operator = %session.operator, "session opened");
        Ok(session)
    }

    /// Confirms `session` is still registered and not expired.
    pub fn revalidate(&self, session: &Session) -> ClinicResult<()> {
        self.revalidate_at(session, Utc::now())
    }

    pub fn revalidate_at(&self, session: &Session, now: DateTime<Utc>) -> ClinicResult<()> {
        let current = self.lookup(&session.token)?;
        if current.is_expired_at(now) {
            return Err(ClinicError::SessionExpired);
        }
        Ok(())
    }

    /// Resolves a bearer token to its live session.
    pub fn session_for_token(&self, token: &str) -> ClinicResult<Session> {
        let session = self.lookup(token)?;
        if session.is_expired_at(Utc::now()) {
            return Err(ClinicError::SessionExpired);
        }
        Ok(session)
    }

    /// Revokes the session. Logging out twice is not an error.
    pub fn logout(&self, session: &Session) -> ClinicResult<()> {
        let mut sessions = self.sessions.write().map_err(|_| ClinicError::LockPoisoned)?;
        if sessions.remove(&session.token).is_some() {
            tracing::info!(operator = %session.operator, "session closed");
        }
        Ok(())
    }

    fn lookup(&self, token: &str) -> ClinicResult<Session> {
        let sessions = self.sessions.read().map_err(|_| ClinicError::LockPoisoned)?;
        sessions
            .get(token)
            .cloned()
            .ok_or(ClinicError::Unauthenticated)
    }
}
