//! Visit recording.
//!
//! A visit is written exactly once, by [`VisitService::commit`], as one store transaction:
//!
//! 1. refuse a commit token that was already applied
//! 2. check the patient exists
//! 3. insert the visit
//! 4. insert one prescription line per basket item
//! 5. decrement each medicine, `stock = stock - qty WHERE stock >= qty`
//!
//! Any failure discards the whole transaction, so there is never a visit without its lines or a
//! decrement without its visit.

use crate::config::CoreConfig;
use crate::medicine::Medicine;
use crate::patient::Patient;
use crate::session::{AuthService, Session};
use crate::store::{ClinicData, Database};
use crate::visit::{ClinicalNotes, PrescriptionLine, Triage, Visit, Vitals};
use crate::wizard::{BasketItem, VisitWizard};
use crate::{ClinicError, ClinicResult};
use chrono::Utc;
use clinic_types::Money;
use clinic_uuid::{CommitToken, RecordId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A prescription line joined with its catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispensedLine {
    pub line: PrescriptionLine,
    pub medicine_name: String,
    pub unit: String,
    pub instruction: String,
    pub line_total: Money,
}

/// A visit with its patient and dispensed lines, as shown in history and printouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitDetail {
    pub visit: Visit,
    pub patient: Patient,
    pub lines: Vec<DispensedLine>,
}

impl VisitDetail {
    pub fn basket(&self) -> Vec<BasketItem> {
        self.lines
            .iter()
            .map(|l| BasketItem {
                medicine_id: l.line.medicine_id,
                name: l.medicine_name.clone(),
                unit: l.unit.clone(),
                unit_price: l.line.unit_price,
                qty: l.line.qty,
                instruction: l.instruction.clone(),
            })
            .collect()
    }
}

pub(crate) fn visit_detail(d: &ClinicData, visit: &Visit) -> ClinicResult<VisitDetail> {
    let patient = d.patient(&visit.patient_id)?.clone();
    let lines = d
        .prescriptions_for(&visit.id)
        .into_iter()
        .map(|line| {
            let medicine: Option<&Medicine> = d.medicines.get(&line.medicine_id);
            Ok(DispensedLine {
                line: line.clone(),
                medicine_name: medicine.map_or_else(|| "-".to_string(), |m| m.name.clone()),
                unit: medicine.map(|m| m.unit.clone()).unwrap_or_default(),
                instruction: medicine.map(|m| m.instruction.clone()).unwrap_or_default(),
                line_total: line.line_total()?,
            })
        })
        .collect::<ClinicResult<Vec<_>>>()?;
    Ok(VisitDetail {
        visit: visit.clone(),
        patient,
        lines,
    })
}

/// One medicine requested in a [`NewVisit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVisitItem {
    pub medicine_id: RecordId,
    pub qty: u32,
}

/// A complete visit submitted in one request, replayed through the wizard server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVisit {
    pub patient_id: RecordId,
    pub commit_token: CommitToken,
    #[serde(default)]
    pub examiner: Option<String>,
    #[serde(default)]
    pub vitals: Vitals,
    #[serde(default)]
    pub triage: Triage,
    #[serde(default)]
    pub notes: ClinicalNotes,
    #[serde(default)]
    pub items: Vec<NewVisitItem>,
    #[serde(default)]
    pub service_fee: Money,
}

#[derive(Clone, Debug)]
pub struct VisitService {
    cfg: Arc<CoreConfig>,
    db: Arc<Database>,
    auth: AuthService,
}

impl VisitService {
    pub fn new(cfg: Arc<CoreConfig>, db: Arc<Database>, auth: AuthService) -> Self {
        Self { cfg, db, auth }
    }

    /// Opens a wizard for `patient_id`, examined by the session's operator.
    pub fn start_wizard(&self, session: &Session, patient_id: RecordId) -> ClinicResult<VisitWizard> {
        self.auth.revalidate(session)?;
        self.db.read(|d| d.patient(&patient_id).map(|_| ()))??;
        Ok(VisitWizard::start(patient_id, session.operator.clone()))
    }

    /// Adds a catalog medicine to the wizard's basket using its current price and stock.
    pub fn add_medicine(
        &self,
        wizard: &mut VisitWizard,
        medicine_id: &RecordId,
        qty: u32,
    ) -> ClinicResult<()> {
        let medicine = self.db.read(|d| d.medicine(medicine_id).cloned())??;
        wizard.add_to_basket(&medicine, qty)
    }

    /// Writes the wizard's draft as a visit. See the module docs for the transaction steps.
    ///
    /// # Errors
    ///
    /// - [`ClinicError::WizardStep`] unless the wizard is at the summary step
    /// - [`ClinicError::VisitReadOnly`] for wizards opened on a recorded visit
    /// - [`ClinicError::DuplicateCommit`] when the draft's token was already committed
    /// - [`ClinicError::PatientNotFound`] or [`ClinicError::MedicineNotFound`]
    /// - [`ClinicError::InsufficientStock`] when any line exceeds stock at commit time
    pub fn commit(&self, session: &Session, wizard: &VisitWizard) -> ClinicResult<Visit> {
        self.auth.revalidate(session)?;
        wizard.ensure_committable()?;
        let draft = wizard.draft();
        let total_cost = draft.total_cost()?;
        let examiner = if draft.examiner.trim().is_empty() {
            self.cfg.default_examiner().to_string()
        } else {
            draft.examiner.trim().to_string()
        };

        let result = self.db.transact(|d| {
            if let Some(existing) = d.commit_tokens.get(&draft.commit_token) {
                return Err(ClinicError::DuplicateCommit {
                    visit_id: existing.to_string(),
                });
            }
            d.patient(&draft.patient_id)?;

            let now = Utc::now();
            let visit = Visit {
                id: RecordId::new(),
                patient_id: draft.patient_id,
                vitals: draft.vitals.clone(),
                triage: draft.triage.clone(),
                notes: draft.notes.clone(),
                examiner: examiner.clone(),
                service_fee: draft.service_fee,
                total_cost,
                commit_token: draft.commit_token,
                created_at: now,
            };
            d.visits.insert(visit.id, visit.clone());

            for (line_no, item) in (1u32..).zip(draft.basket.iter()) {
                let line = PrescriptionLine {
                    id: RecordId::new(),
                    visit_id: visit.id,
                    medicine_id: item.medicine_id,
                    line_no,
                    qty: item.qty,
                    unit_price: item.unit_price,
                    created_at: now,
                };
                d.prescriptions.insert(line.id, line);
                d.decrement_stock(&item.medicine_id, item.qty)?;
            }

            d.commit_tokens.insert(draft.commit_token, visit.id);
            Ok(visit)
        });

        match &result {
            Ok(visit) => tracing::info!(
                visit_id = %visit.id,
                lines = draft.basket.len(),
                total = %visit.total_cost,
                "visit committed"
            ),
            Err(e) => tracing::warn!(token = %draft.commit_token, "visit commit rejected: {}", e),
        }
        result
    }

    /// Replays a whole visit request through the wizard and commits it.
    ///
    /// A token that was already committed is refused up front, before the basket is checked
    /// against stock the first commit may have used up. `commit` still checks it again.
    pub fn record(&self, session: &Session, request: &NewVisit) -> ClinicResult<VisitDetail> {
        self.auth.revalidate(session)?;
        let committed = self
            .db
            .read(|d| d.commit_tokens.get(&request.commit_token).copied())?;
        if let Some(visit_id) = committed {
            return Err(ClinicError::DuplicateCommit {
                visit_id: visit_id.to_string(),
            });
        }
        let mut wizard = self.start_wizard(session, request.patient_id)?;
        wizard.restore_commit_token(request.commit_token)?;
        if let Some(examiner) = request.examiner.as_deref().filter(|e| !e.trim().is_empty()) {
            wizard.set_examiner(examiner.trim())?;
        }
        wizard.submit_vitals(request.vitals.clone(), request.triage.clone())?;
        wizard.submit_diagnosis(request.notes.clone())?;
        for item in &request.items {
            self.add_medicine(&mut wizard, &item.medicine_id, item.qty)?;
        }
        wizard.set_service_fee(request.service_fee)?;
        wizard.submit_medication()?;
        let visit = self.commit(session, &wizard)?;
        self.get(&visit.id)
    }

    pub fn get(&self, id: &RecordId) -> ClinicResult<VisitDetail> {
        self.db
            .read(|d| -> ClinicResult<VisitDetail> { visit_detail(d, d.visit(id)?) })?
    }

    /// Opens a recorded visit in a read-only wizard.
    pub fn open(&self, id: &RecordId, view_mode: bool) -> ClinicResult<VisitWizard> {
        let detail = self.get(id)?;
        Ok(VisitWizard::open_existing(
            &detail.visit,
            detail.basket(),
            view_mode,
        ))
    }
}
