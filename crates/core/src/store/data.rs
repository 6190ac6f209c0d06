//! In-memory tables for the five clinic collections plus expenses.

use crate::constants::HN_PREFIX;
use crate::expense::Expense;
use crate::medicine::Medicine;
use crate::patient::Patient;
use crate::visit::{PrescriptionLine, Visit};
use crate::{ClinicError, ClinicResult};
use clinic_uuid::{CommitToken, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything the clinic persists, as one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicData {
    #[serde(default)]
    pub patients: BTreeMap<RecordId, Patient>,
    #[serde(default)]
    pub visits: BTreeMap<RecordId, Visit>,
    #[serde(default)]
    pub prescriptions: BTreeMap<RecordId, PrescriptionLine>,
    #[serde(default)]
    pub medicines: BTreeMap<RecordId, Medicine>,
    #[serde(default)]
    pub expenses: BTreeMap<RecordId, Expense>,
    /// Commit tokens already applied, mapped to the visit they produced.
    #[serde(default)]
    pub commit_tokens: BTreeMap<CommitToken, RecordId>,
    /// Last HN sequence number handed out.
    #[serde(default)]
    pub hn_sequence: u64,
}

impl ClinicData {
    pub fn patient(&self, id: &RecordId) -> ClinicResult<&Patient> {
        self.patients
            .get(id)
            .ok_or_else(|| ClinicError::PatientNotFound(id.to_string()))
    }

    pub fn patient_mut(&mut self, id: &RecordId) -> ClinicResult<&mut Patient> {
        self.patients
            .get_mut(id)
            .ok_or_else(|| ClinicError::PatientNotFound(id.to_string()))
    }

    pub fn patient_by_national_id(&self, national_id: &str) -> Option<&Patient> {
        self.patients.values().find(|p| p.national_id == national_id)
    }

    pub fn visit(&self, id: &RecordId) -> ClinicResult<&Visit> {
        self.visits
            .get(id)
            .ok_or_else(|| ClinicError::VisitNotFound(id.to_string()))
    }

    pub fn medicine(&self, id: &RecordId) -> ClinicResult<&Medicine> {
        self.medicines
            .get(id)
            .ok_or_else(|| ClinicError::MedicineNotFound(id.to_string()))
    }

    pub fn medicine_mut(&mut self, id: &RecordId) -> ClinicResult<&mut Medicine> {
        self.medicines
            .get_mut(id)
            .ok_or_else(|| ClinicError::MedicineNotFound(id.to_string()))
    }

    /// Prescription lines of a visit in insertion order.
    pub fn prescriptions_for(&self, visit_id: &RecordId) -> Vec<&PrescriptionLine> {
        let mut lines: Vec<&PrescriptionLine> = self
            .prescriptions
            .values()
            .filter(|p| &p.visit_id == visit_id)
            .collect();
        lines.sort_by_key(|p| (p.created_at, p.line_no));
        lines
    }

    /// Visits of a patient, newest first.
    pub fn visits_for(&self, patient_id: &RecordId) -> Vec<&Visit> {
        let mut visits: Vec<&Visit> = self
            .visits
            .values()
            .filter(|v| &v.patient_id == patient_id)
            .collect();
        visits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        visits
    }

    pub fn medicine_is_prescribed(&self, medicine_id: &RecordId) -> bool {
        self.prescriptions
            .values()
            .any(|p| &p.medicine_id == medicine_id)
    }

    /// Conditional decrement: `stock = stock - qty WHERE stock >= qty`.
    pub fn decrement_stock(&mut self, medicine_id: &RecordId, qty: u32) -> ClinicResult<u32> {
        let medicine = self.medicine_mut(medicine_id)?;
        match medicine.stock_qty.checked_sub(qty) {
            Some(remaining) => {
                medicine.stock_qty = remaining;
                Ok(remaining)
            }
            None => Err(ClinicError::InsufficientStock {
                medicine_id: medicine.id.to_string(),
                medicine_name: medicine.name.clone(),
                requested: qty,
                available: medicine.stock_qty,
            }),
        }
    }

    /// Hands out the next clinic number, e.g. `HN000042`.
    pub fn allocate_hn(&mut self) -> String {
        self.hn_sequence += 1;
        format!("{}{:06}", HN_PREFIX, self.hn_sequence)
    }
}
