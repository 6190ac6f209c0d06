//! Four-step visit wizard.
//!
//! The wizard only accumulates a [`VisitDraft`]; nothing is written until the draft reaches the
//! summary step and is handed to
//! [`VisitService::commit`](crate::repositories::visits::VisitService::commit).
//!
//! ```text
//! Vitals -> Diagnosis -> Medication -> Summary
//! ```
//!
//! Forward moves are gated on the current step's form only. Moving back keeps what was entered
//! on later steps.

use crate::medicine::Medicine;
use crate::visit::{ClinicalNotes, Triage, Visit, Vitals};
use crate::{ClinicError, ClinicResult};
use clinic_types::Money;
use clinic_uuid::{CommitToken, RecordId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    Vitals,
    Diagnosis,
    Medication,
    Summary,
}

impl WizardStep {
    pub fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::Vitals => Some(WizardStep::Diagnosis),
            WizardStep::Diagnosis => Some(WizardStep::Medication),
            WizardStep::Medication => Some(WizardStep::Summary),
            WizardStep::Summary => None,
        }
    }

    pub fn previous(self) -> Option<WizardStep> {
        match self {
            WizardStep::Vitals => None,
            WizardStep::Diagnosis => Some(WizardStep::Vitals),
            WizardStep::Medication => Some(WizardStep::Diagnosis),
            WizardStep::Summary => Some(WizardStep::Medication),
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WizardStep::Vitals => "vitals",
            WizardStep::Diagnosis => "diagnosis",
            WizardStep::Medication => "medication",
            WizardStep::Summary => "summary",
        };
        f.write_str(name)
    }
}

/// A medicine in the dispensing basket, priced when it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketItem {
    pub medicine_id: RecordId,
    pub name: String,
    pub unit: String,
    pub unit_price: Money,
    pub qty: u32,
    #[serde(default)]
    pub instruction: String,
}

impl BasketItem {
    pub fn line_total(&self) -> ClinicResult<Money> {
        crate::error::checked_line_total(self.unit_price, self.qty)
    }
}

/// Everything the wizard has collected so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitDraft {
    pub patient_id: RecordId,
    pub examiner: String,
    pub vitals: Vitals,
    pub triage: Triage,
    pub notes: ClinicalNotes,
    pub basket: Vec<BasketItem>,
    pub service_fee: Money,
    pub commit_token: CommitToken,
}

impl VisitDraft {
    pub fn new(patient_id: RecordId, examiner: impl Into<String>) -> Self {
        Self {
            patient_id,
            examiner: examiner.into(),
            vitals: Vitals::default(),
            triage: Triage::default(),
            notes: ClinicalNotes::default(),
            basket: Vec::new(),
            service_fee: Money::ZERO,
            commit_token: CommitToken::new(),
        }
    }

    /// Σ(qty × unit price) + service fee.
    pub fn total_cost(&self) -> ClinicResult<Money> {
        self.basket
            .iter()
            .try_fold(self.service_fee, |acc, item| -> ClinicResult<Money> {
                acc.checked_add(item.line_total()?)
                    .ok_or_else(|| crate::error::overflow("total cost"))
            })
    }

    /// Units of `medicine_id` already in the basket.
    pub fn basket_qty(&self, medicine_id: &RecordId) -> u32 {
        self.basket
            .iter()
            .filter(|i| &i.medicine_id == medicine_id)
            .fold(0u32, |acc, i| acc.saturating_add(i.qty))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisitWizard {
    step: WizardStep,
    draft: VisitDraft,
    /// Set when the wizard was opened on a visit that is already recorded.
    existing_visit: Option<RecordId>,
}

impl VisitWizard {
    /// Fresh wizard for a new visit, at the vitals step with a new commit token.
    pub fn start(patient_id: RecordId, examiner: impl Into<String>) -> Self {
        Self {
            step: WizardStep::Vitals,
            draft: VisitDraft::new(patient_id, examiner),
            existing_visit: None,
        }
    }

    /// Opens a recorded visit for viewing.
    ///
    /// Completed visits, or any visit when `view_mode` is set, open straight at the summary.
    /// The result is read-only: every edit and [`commit`](crate::repositories::visits::VisitService::commit)
    /// is refused.
    pub fn open_existing(visit: &Visit, basket: Vec<BasketItem>, view_mode: bool) -> Self {
        let step = if view_mode || visit.is_completed() {
            WizardStep::Summary
        } else {
            WizardStep::Vitals
        };
        Self {
            step,
            draft: VisitDraft {
                patient_id: visit.patient_id,
                examiner: visit.examiner.clone(),
                vitals: visit.vitals.clone(),
                triage: visit.triage.clone(),
                notes: visit.notes.clone(),
                basket,
                service_fee: visit.service_fee,
                commit_token: visit.commit_token,
            },
            existing_visit: Some(visit.id),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &VisitDraft {
        &self.draft
    }

    pub fn is_read_only(&self) -> bool {
        self.existing_visit.is_some()
    }

    pub fn total_cost(&self) -> ClinicResult<Money> {
        self.draft.total_cost()
    }

    pub fn set_examiner(&mut self, examiner: impl Into<String>) -> ClinicResult<()> {
        self.ensure_editable()?;
        self.draft.examiner = examiner.into();
        Ok(())
    }

    /// Reuses a token issued earlier so a retried submission is recognised as the same commit.
    pub fn restore_commit_token(&mut self, token: CommitToken) -> ClinicResult<()> {
        self.ensure_editable()?;
        self.draft.commit_token = token;
        Ok(())
    }

    pub fn submit_vitals(&mut self, vitals: Vitals, triage: Triage) -> ClinicResult<WizardStep> {
        self.ensure_at(WizardStep::Vitals)?;
        self.draft.vitals = vitals.validated()?;
        self.draft.triage = triage.normalized();
        self.advance()
    }

    pub fn submit_diagnosis(&mut self, notes: ClinicalNotes) -> ClinicResult<WizardStep> {
        self.ensure_at(WizardStep::Diagnosis)?;
        self.draft.notes = notes.validated()?;
        self.advance()
    }

    /// Adds `qty` units of `medicine` at its current price.
    ///
    /// Rejected when the basket would then hold more of the medicine than is in stock.
    pub fn add_to_basket(&mut self, medicine: &Medicine, qty: u32) -> ClinicResult<()> {
        self.ensure_at(WizardStep::Medication)?;
        if qty == 0 {
            return Err(ClinicError::InvalidInput(
                "quantity must be at least 1".into(),
            ));
        }
        let wanted = self
            .draft
            .basket_qty(&medicine.id)
            .checked_add(qty)
            .ok_or_else(|| crate::error::overflow("basket quantity"))?;
        if wanted > medicine.stock_qty {
            return Err(ClinicError::InsufficientStock {
                medicine_id: medicine.id.to_string(),
                medicine_name: medicine.name.clone(),
                requested: wanted,
                available: medicine.stock_qty,
            });
        }
        self.draft.basket.push(BasketItem {
            medicine_id: medicine.id,
            name: medicine.name.clone(),
            unit: medicine.unit.clone(),
            unit_price: medicine.price_per_unit,
            qty,
            instruction: medicine.instruction.clone(),
        });
        Ok(())
    }

    pub fn remove_from_basket(&mut self, index: usize) -> ClinicResult<BasketItem> {
        self.ensure_at(WizardStep::Medication)?;
        if index >= self.draft.basket.len() {
            return Err(ClinicError::InvalidInput(format!(
                "no basket line at index {}",
                index
            )));
        }
        Ok(self.draft.basket.remove(index))
    }

    pub fn set_service_fee(&mut self, fee: Money) -> ClinicResult<()> {
        self.ensure_at(WizardStep::Medication)?;
        if fee.is_negative() {
            return Err(ClinicError::InvalidInput(
                "service fee cannot be negative".into(),
            ));
        }
        self.draft.service_fee = fee;
        Ok(())
    }

    pub fn submit_medication(&mut self) -> ClinicResult<WizardStep> {
        self.ensure_at(WizardStep::Medication)?;
        self.draft.total_cost()?;
        self.advance()
    }

    /// Steps back one page, keeping everything entered. Stays put on the first step.
    pub fn back(&mut self) -> WizardStep {
        if let Some(prev) = self.step.previous() {
            self.step = prev;
        }
        self.step
    }

    /// Moves forward without changes. Only read-only wizards browse this way.
    pub fn browse_forward(&mut self) -> ClinicResult<WizardStep> {
        if !self.is_read_only() {
            return Err(ClinicError::InvalidInput(
                "submit the current step to move forward".into(),
            ));
        }
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(self.step)
    }

    /// Confirms the wizard is a new draft sitting at the summary step.
    pub fn ensure_committable(&self) -> ClinicResult<()> {
        self.ensure_at(WizardStep::Summary)
    }

    fn ensure_editable(&self) -> ClinicResult<()> {
        match self.existing_visit {
            Some(id) => Err(ClinicError::VisitReadOnly(id.to_string())),
            None => Ok(()),
        }
    }

    fn ensure_at(&self, expected: WizardStep) -> ClinicResult<()> {
        self.ensure_editable()?;
        if self.step != expected {
            return Err(ClinicError::WizardStep {
                expected,
                actual: self.step,
            });
        }
        Ok(())
    }

    fn advance(&mut self) -> ClinicResult<WizardStep> {
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(self.step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn medicine(name: &str, price: i64, stock: u32) -> Medicine {
        Medicine {
            id: RecordId::new(),
            name: name.into(),
            unit: "เม็ด".into(),
            price_per_unit: Money::from_baht(price),
            stock_qty: stock,
            instruction: "หลังอาหาร".into(),
            created_at: Utc::now(),
        }
    }

    fn at_medication() -> VisitWizard {
        let mut wizard = VisitWizard::start(RecordId::new(), "Dr. Test");
        wizard
            .submit_vitals(Vitals::default(), Triage::default())
            .unwrap();
        wizard.submit_diagnosis(ClinicalNotes::default()).unwrap();
        wizard
    }

    #[test]
    fn empty_basket_and_zero_fee_cost_nothing() {
        let wizard = VisitWizard::start(RecordId::new(), "Dr. Test");
        assert_eq!(wizard.total_cost().unwrap(), Money::ZERO);
    }

    #[test]
    fn total_is_lines_plus_fee() {
        let mut wizard = at_medication();
        wizard.add_to_basket(&medicine("Paracetamol", 5, 10), 2).unwrap();
        wizard.add_to_basket(&medicine("Amoxicillin", 20, 10), 1).unwrap();
        wizard.set_service_fee(Money::from_baht(50)).unwrap();
        assert_eq!(wizard.total_cost().unwrap(), Money::from_baht(80));
    }

    #[test]
    fn steps_must_be_submitted_in_order() {
        let mut wizard = VisitWizard::start(RecordId::new(), "Dr. Test");
        let err = wizard
            .submit_diagnosis(ClinicalNotes::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ClinicError::WizardStep {
                expected: WizardStep::Diagnosis,
                actual: WizardStep::Vitals
            }
        ));
        assert!(wizard.ensure_committable().is_err());
    }

    #[test]
    fn invalid_vitals_block_the_step() {
        let mut wizard = VisitWizard::start(RecordId::new(), "Dr. Test");
        let vitals = Vitals {
            weight: Some(-1.0),
            ..Default::default()
        };
        assert!(wizard.submit_vitals(vitals, Triage::default()).is_err());
        assert_eq!(wizard.step(), WizardStep::Vitals);
    }

    #[test]
    fn back_keeps_later_step_data() {
        let mut wizard = at_medication();
        let para = medicine("Paracetamol", 5, 10);
        wizard.add_to_basket(&para, 2).unwrap();
        assert_eq!(wizard.back(), WizardStep::Diagnosis);
        assert_eq!(wizard.back(), WizardStep::Vitals);
        assert_eq!(wizard.back(), WizardStep::Vitals);

        wizard
            .submit_vitals(
                Vitals {
                    weight: Some(60.0),
                    height: Some(160.0),
                    ..Default::default()
                },
                Triage::default(),
            )
            .unwrap();
        wizard.submit_diagnosis(ClinicalNotes::default()).unwrap();
        assert_eq!(wizard.draft().basket.len(), 1);
        assert_eq!(wizard.draft().vitals.bmi, Some(23.44));
    }

    #[test]
    fn basket_cannot_exceed_stock() {
        let mut wizard = at_medication();
        let para = medicine("Paracetamol", 5, 3);
        wizard.add_to_basket(&para, 2).unwrap();
        let err = wizard.add_to_basket(&para, 2).unwrap_err();
        assert!(matches!(
            err,
            ClinicError::InsufficientStock {
                requested: 4,
                available: 3,
                ..
            }
        ));
        assert!(wizard.add_to_basket(&para, 0).is_err());
        assert_eq!(wizard.draft().basket_qty(&para.id), 2);
    }

    #[test]
    fn remove_and_fee_validation() {
        let mut wizard = at_medication();
        wizard.add_to_basket(&medicine("ORS", 8, 5), 1).unwrap();
        assert!(wizard.remove_from_basket(3).is_err());
        assert_eq!(wizard.remove_from_basket(0).unwrap().name, "ORS");
        assert!(wizard.set_service_fee(Money::from_satang(-1)).is_err());
        assert_eq!(wizard.submit_medication().unwrap(), WizardStep::Summary);
        wizard.ensure_committable().expect("summary should be committable");
    }

    #[test]
    fn completed_visits_open_read_only_at_summary() {
        let visit = Visit {
            id: RecordId::new(),
            patient_id: RecordId::new(),
            vitals: Vitals::default(),
            triage: Triage::default(),
            notes: ClinicalNotes {
                diagnosis: "ไข้หวัด".into(),
                ..Default::default()
            },
            examiner: "Dr. Test".into(),
            service_fee: Money::ZERO,
            total_cost: Money::ZERO,
            commit_token: CommitToken::new(),
            created_at: Utc::now(),
        };

        let mut wizard = VisitWizard::open_existing(&visit, Vec::new(), false);
        assert_eq!(wizard.step(), WizardStep::Summary);
        assert!(wizard.is_read_only());
        assert!(matches!(
            wizard.ensure_committable(),
            Err(ClinicError::VisitReadOnly(_))
        ));
        wizard.back();
        assert!(wizard.set_service_fee(Money::from_baht(1)).is_err());
        assert_eq!(wizard.browse_forward().unwrap(), WizardStep::Summary);

        let blank = Visit {
            notes: ClinicalNotes::default(),
            ..visit
        };
        assert_eq!(
            VisitWizard::open_existing(&blank, Vec::new(), false).step(),
            WizardStep::Vitals
        );
        assert_eq!(
            VisitWizard::open_existing(&blank, Vec::new(), true).step(),
            WizardStep::Summary
        );
    }
}
