//! Clinic services.
//!
//! Each service is a cheap `Clone` handle over the shared store and session registry. Reads are
//! open; every write takes the caller's [`Session`](crate::session::Session) and re-checks it.

pub mod accounting;
pub mod patients;
pub mod stock;
pub mod visits;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::{hash_pin, CoreConfig};
    use crate::patient::PatientForm;
    use crate::session::Session;
    use crate::store::Database;
    use crate::{Clinic, NonEmptyText};
    use chrono::NaiveDate;
    use std::path::PathBuf;
    use std::sync::Arc;

    pub(crate) const TEST_PIN: &str = "123456";

    pub(crate) fn test_cfg() -> Arc<CoreConfig> {
        Arc::new(
            CoreConfig::new(
                PathBuf::from("/nonexistent"),
                hash_pin(TEST_PIN),
                NonEmptyText::new("Dr. Test").expect("examiner should be non-empty"),
            )
            .expect("test config should be valid"),
        )
    }

    /// In-memory clinic plus a logged-in session.
    pub(crate) fn clinic() -> (Clinic, Session) {
        let clinic = Clinic::with_database(test_cfg(), Arc::new(Database::in_memory()));
        let session = clinic
            .auth()
            .login(TEST_PIN, None)
            .expect("login should succeed");
        (clinic, session)
    }

    pub(crate) fn patient_form(national_id: &str, first_name: &str) -> PatientForm {
        PatientForm {
            national_id: national_id.into(),
            prefix: "นาย".into(),
            first_name: first_name.into(),
            last_name: "Jaidee".into(),
            birthdate: NaiveDate::from_ymd_opt(1985, 2, 14),
            ..Default::default()
        }
    }
}
