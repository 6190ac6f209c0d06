//! Patient directory.
//!
//! Registration, lookup, edits and the notes auto-save. Writes take a [`Session`] and are applied
//! through a single store transaction each.

use crate::config::CoreConfig;
use crate::constants::{RECORDS_LIST_LIMIT, SEARCH_MIN_CHARS, SEARCH_RESULT_LIMIT};
use crate::patient::{Patient, PatientForm};
use crate::repositories::visits::{visit_detail, VisitDetail};
use crate::session::{AuthService, Session};
use crate::store::{Database, Page};
use crate::{ClinicError, ClinicResult};
use chrono::Utc;
use clinic_uuid::RecordId;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct PatientService {
    cfg: Arc<CoreConfig>,
    db: Arc<Database>,
    auth: AuthService,
}

impl PatientService {
    pub fn new(cfg: Arc<CoreConfig>, db: Arc<Database>, auth: AuthService) -> Self {
        Self { cfg, db, auth }
    }

    /// Registers a new patient and assigns the next HN.
    ///
    /// # Errors
    ///
    /// - [`ClinicError::InvalidNationalId`], [`ClinicError::InvalidPhone`] or
    ///   [`ClinicError::InvalidInput`] when the form is incomplete
    /// - [`ClinicError::DuplicateNationalId`] when the national ID is already registered
    pub fn register(&self, session: &Session, form: &PatientForm) -> ClinicResult<Patient> {
        self.auth.revalidate(session)?;
        let valid = form.validate(Utc::now().date_naive())?;

        let patient = self.db.transact(|d| {
            if d.patient_by_national_id(&valid.national_id).is_some() {
                return Err(ClinicError::DuplicateNationalId(valid.national_id.clone()));
            }
            let patient = Patient {
                id: RecordId::new(),
                hn: d.allocate_hn(),
                national_id: valid.national_id.clone(),
                prefix: valid.prefix.clone(),
                first_name: valid.first_name.clone(),
                last_name: valid.last_name.clone(),
                birthdate: valid.birthdate,
                gender: valid.gender,
                phone: valid.phone.clone(),
                address: valid.address.clone().map(Into::into),
                underlying_disease: valid.underlying_disease.clone(),
                drug_allergy: valid.drug_allergy.clone(),
                treatment_right: valid.treatment_right.clone(),
                notes: String::new(),
                notes_revision: 0,
                created_at: Utc::now(),
            };
            d.patients.insert(patient.id, patient.clone());
            Ok(patient)
        })?;

        tracing::info!(hn = %patient.hn, operator = %session.operator, "patient registered");
        Ok(patient)
    }

    /// Replaces the demographic fields of an existing patient. The national ID cannot change.
    pub fn update(
        &self,
        session: &Session,
        id: &RecordId,
        form: &PatientForm,
    ) -> ClinicResult<Patient> {
        self.auth.revalidate(session)?;
        let valid = form.validate(Utc::now().date_naive())?;

        self.db.transact(|d| {
            let patient = d.patient_mut(id)?;
            if patient.national_id != valid.national_id {
                return Err(ClinicError::InvalidInput(
                    "national ID cannot be changed".into(),
                ));
            }
            patient.prefix = valid.prefix.clone();
            patient.first_name = valid.first_name.clone();
            patient.last_name = valid.last_name.clone();
            patient.birthdate = valid.birthdate;
            patient.gender = valid.gender;
            patient.phone = valid.phone.clone();
            // A form without an address keeps whatever is stored, including a legacy string.
            if let Some(address) = valid.address.clone() {
                patient.address = Some(address.into());
            }
            patient.underlying_disease = valid.underlying_disease.clone();
            patient.drug_allergy = valid.drug_allergy.clone();
            patient.treatment_right = valid.treatment_right.clone();
            Ok(patient.clone())
        })
    }

    /// Auto-save of the free-text notes.
    ///
    /// `revision` must be newer than the stored revision; older or equal revisions are stale
    /// writes that arrived out of order and are refused.
    pub fn update_notes(
        &self,
        session: &Session,
        id: &RecordId,
        notes: &str,
        revision: u64,
    ) -> ClinicResult<u64> {
        self.auth.revalidate(session)?;
        self.db.transact(|d| {
            let patient = d.patient_mut(id)?;
            if revision <= patient.notes_revision {
                return Err(ClinicError::StaleNotes {
                    current: patient.notes_revision,
                    attempted: revision,
                });
            }
            patient.notes = notes.to_string();
            patient.notes_revision = revision;
            Ok(revision)
        })
    }

    pub fn get(&self, id: &RecordId) -> ClinicResult<Patient> {
        self.db.read(|d| d.patient(id).cloned())?
    }

    /// Header search: prefix match on national ID or first name.
    ///
    /// Terms shorter than three characters return nothing.
    pub fn quick_search(&self, term: &str) -> ClinicResult<Vec<Patient>> {
        let needle = term.trim().to_lowercase();
        if needle.chars().count() < SEARCH_MIN_CHARS {
            return Ok(Vec::new());
        }
        self.db.read(|d| {
            let mut hits: Vec<Patient> = d
                .patients
                .values()
                .filter(|p| {
                    p.national_id.starts_with(&needle)
                        || p.first_name.to_lowercase().starts_with(&needle)
                })
                .cloned()
                .collect();
            hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Page::first(SEARCH_RESULT_LIMIT).apply(hits)
        })
    }

    /// Records page: the most recent patients, optionally filtered.
    pub fn list_recent(&self, filter: Option<&str>) -> ClinicResult<Vec<Patient>> {
        let needle = filter
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty());
        self.db.read(|d| {
            let mut rows: Vec<Patient> = d
                .patients
                .values()
                .filter(|p| match needle.as_deref() {
                    None => true,
                    Some(n) => {
                        p.first_name.to_lowercase().contains(n)
                            || p.last_name.to_lowercase().contains(n)
                            || p.hn.to_lowercase().contains(n)
                            || p.national_id.contains(n)
                    }
                })
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Page::first(RECORDS_LIST_LIMIT).apply(rows)
        })
    }

    /// Visits of a patient, newest first, with their dispensed lines.
    pub fn visit_history(&self, id: &RecordId) -> ClinicResult<Vec<VisitDetail>> {
        self.db.read(|d| -> ClinicResult<Vec<VisitDetail>> {
            d.patient(id)?;
            d.visits_for(id)
                .into_iter()
                .map(|v| visit_detail(d, v))
                .collect()
        })?
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{Address, StoredAddress};
    use crate::repositories::test_support::{clinic, patient_form};

    #[test]
    fn register_assigns_sequential_hn_and_defaults() {
        let (c, session) = clinic();
        let first = c
            .patients()
            .register(&session, &patient_form("1234567890123", "Somchai"))
            .expect("register should succeed");
        let second = c
            .patients()
            .register(&session, &patient_form("1234567890124", "Somsri"))
            .expect("register should succeed");
        assert_eq!(first.hn, "HN000001");
        assert_eq!(second.hn, "HN000002");
        assert_eq!(first.drug_allergy, crate::constants::NONE_TEXT);
        assert!(!first.has_drug_allergy());
    }

    #[test]
    fn register_rejects_duplicates_and_bad_input() {
        let (c, session) = clinic();
        let patients = c.patients();
        patients
            .register(&session, &patient_form("1234567890123", "Somchai"))
            .unwrap();
        assert!(matches!(
            patients.register(&session, &patient_form("1234567890123", "Other")),
            Err(ClinicError::DuplicateNationalId(_))
        ));

        let mut bad = patient_form("1234567890125", "Malee");
        bad.phone = "081234".into();
        assert!(matches!(
            patients.register(&session, &bad),
            Err(ClinicError::InvalidPhone)
        ));
        assert_eq!(patients.list_recent(None).unwrap().len(), 1);
    }

    #[test]
    fn writes_require_a_live_session() {
        let (c, session) = clinic();
        c.auth().logout(&session).unwrap();
        assert!(matches!(
            c.patients()
                .register(&session, &patient_form("1234567890123", "Somchai")),
            Err(ClinicError::Unauthenticated)
        ));
    }

    #[test]
    fn quick_search_needs_three_characters_and_caps_results() {
        let (c, session) = clinic();
        let patients = c.patients();
        for i in 0..7 {
            patients
                .register(
                    &session,
                    &patient_form(&format!("123456789012{}", i), &format!("Somchai{}", i)),
                )
                .unwrap();
        }
        patients
            .register(&session, &patient_form("9999999999999", "Malee"))
            .unwrap();

        assert!(patients.quick_search("so").unwrap().is_empty());
        assert_eq!(patients.quick_search("SOM").unwrap().len(), 5);
        assert_eq!(patients.quick_search("999").unwrap()[0].first_name, "Malee");
        assert!(patients.quick_search("chai").unwrap().is_empty());
    }

    #[test]
    fn list_recent_filters_by_substring() {
        let (c, session) = clinic();
        let patients = c.patients();
        patients
            .register(&session, &patient_form("1234567890123", "Somchai"))
            .unwrap();
        let malee = patients
            .register(&session, &patient_form("9876543210123", "Malee"))
            .unwrap();

        let all = patients.list_recent(None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(patients.list_recent(Some("alee")).unwrap()[0].id, malee.id);
        assert_eq!(patients.list_recent(Some("hn000002")).unwrap()[0].id, malee.id);
        assert!(patients.list_recent(Some("zzz")).unwrap().is_empty());
    }

    #[test]
    fn update_keeps_national_id_and_legacy_address() {
        let (c, session) = clinic();
        let patients = c.patients();
        let p = patients
            .register(&session, &patient_form("1234567890123", "Somchai"))
            .unwrap();
        c.database()
            .transact(|d| {
                d.patient_mut(&p.id)?.address =
                    Some(StoredAddress::Legacy("12 ถนนสุขุมวิท".into()));
                Ok(())
            })
            .unwrap();

        let mut form = patient_form("1234567890123", "Somchai");
        form.last_name = "Rakdee".into();
        let updated = patients.update(&session, &p.id, &form).unwrap();
        assert_eq!(updated.last_name, "Rakdee");
        assert_eq!(
            updated.address,
            Some(StoredAddress::Legacy("12 ถนนสุขุมวิท".into()))
        );

        form.address = Some(Address {
            house_no: "5".into(),
            province: "เชียงใหม่".into(),
            ..Default::default()
        });
        let updated = patients.update(&session, &p.id, &form).unwrap();
        assert!(matches!(updated.address, Some(StoredAddress::Structured(_))));

        let moved = patient_form("1234567890999", "Somchai");
        assert!(patients.update(&session, &p.id, &moved).is_err());
    }

    #[test]
    fn stale_notes_are_rejected() {
        let (c, session) = clinic();
        let patients = c.patients();
        let p = patients
            .register(&session, &patient_form("1234567890123", "Somchai"))
            .unwrap();

        assert_eq!(patients.update_notes(&session, &p.id, "first", 1).unwrap(), 1);
        assert_eq!(patients.update_notes(&session, &p.id, "second", 3).unwrap(), 3);
        let err = patients
            .update_notes(&session, &p.id, "late", 2)
            .unwrap_err();
        assert!(matches!(err, ClinicError::StaleNotes { current: 3, attempted: 2 }));
        assert_eq!(patients.get(&p.id).unwrap().notes, "second");
    }

    #[test]
    fn unknown_patient_is_not_found() {
        let (c, _) = clinic();
        let err = c.patients().get(&RecordId::new()).unwrap_err();
        assert!(err.is_not_found());
    }
}
