use crate::dto::HealthRes;

/// Health check shared by every API surface.
#[derive(Clone)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Static check; there is nothing to probe beyond the process being up.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Clinic is alive".into(),
        }
    }
}

impl Default for HealthService {
    fn default() -> Self {
        Self::new()
    }
}
