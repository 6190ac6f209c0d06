//! Visit and prescription record types.

use crate::constants::DEFAULT_URGENCY;
use crate::validation::validate_diagnosis_code;
use crate::{ClinicError, ClinicResult};
use chrono::{DateTime, Utc};
use clinic_types::Money;
use clinic_uuid::{CommitToken, RecordId};
use serde::{Deserialize, Serialize};

/// Vital signs taken at triage. Every measurement is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Body temperature in °C.
    pub temperature: Option<f64>,
    /// Beats per minute.
    pub pulse: Option<u32>,
    /// Breaths per minute.
    pub resp_rate: Option<u32>,
    pub bp_systolic: Option<u32>,
    pub bp_diastolic: Option<u32>,
    /// Kilograms.
    pub weight: Option<f64>,
    /// Centimetres.
    pub height: Option<f64>,
    /// Derived from weight and height; never taken from the form.
    pub bmi: Option<f64>,
}

/// Body-mass index rounded to two decimals, or `None` unless both inputs are positive.
pub fn compute_bmi(weight_kg: Option<f64>, height_cm: Option<f64>) -> Option<f64> {
    match (weight_kg, height_cm) {
        (Some(w), Some(h)) if w > 0.0 && h > 0.0 => {
            let m = h / 100.0;
            Some(((w / (m * m)) * 100.0).round() / 100.0)
        }
        _ => None,
    }
}

impl Vitals {
    /// Checks local validity and returns a copy with BMI recomputed.
    pub fn validated(&self) -> ClinicResult<Vitals> {
        fn positive_f(name: &str, v: Option<f64>) -> ClinicResult<()> {
            match v {
                Some(x) if !x.is_finite() || x <= 0.0 => Err(ClinicError::InvalidInput(format!(
                    "{} must be a positive number",
                    name
                ))),
                _ => Ok(()),
            }
        }
        fn positive_u(name: &str, v: Option<u32>) -> ClinicResult<()> {
            match v {
                Some(0) => Err(ClinicError::InvalidInput(format!(
                    "{} must be a positive number",
                    name
                ))),
                _ => Ok(()),
            }
        }

        positive_f("temperature", self.temperature)?;
        positive_u("pulse", self.pulse)?;
        positive_u("resp_rate", self.resp_rate)?;
        positive_u("bp_systolic", self.bp_systolic)?;
        positive_u("bp_diastolic", self.bp_diastolic)?;
        positive_f("weight", self.weight)?;
        positive_f("height", self.height)?;

        Ok(Vitals {
            bmi: compute_bmi(self.weight, self.height),
            ..self.clone()
        })
    }
}

/// Triage screening captured alongside vitals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triage {
    pub urgency: String,
    pub alcohol: bool,
    pub smoking: bool,
}

impl Default for Triage {
    fn default() -> Self {
        Self {
            urgency: DEFAULT_URGENCY.to_string(),
            alcohol: false,
            smoking: false,
        }
    }
}

impl Triage {
    /// Trims the urgency and falls back to the default level when it is blank.
    pub fn normalized(self) -> Self {
        let urgency = self.urgency.trim();
        let urgency = if urgency.is_empty() {
            DEFAULT_URGENCY.to_string()
        } else {
            urgency.to_string()
        };
        Self { urgency, ..self }
    }
}

/// Clinical narrative for a visit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalNotes {
    /// Chief complaint.
    #[serde(default)]
    pub cc: String,
    /// Physical exam findings.
    #[serde(default)]
    pub pe: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub diagnosis_code: Option<String>,
}

impl ClinicalNotes {
    pub fn validated(&self) -> ClinicResult<ClinicalNotes> {
        let diagnosis_code = self
            .diagnosis_code
            .as_deref()
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty());
        if let Some(code) = diagnosis_code.as_deref() {
            validate_diagnosis_code(code)?;
        }
        Ok(ClinicalNotes {
            cc: self.cc.trim().to_string(),
            pe: self.pe.trim().to_string(),
            diagnosis: self.diagnosis.trim().to_string(),
            diagnosis_code,
        })
    }
}

/// A committed visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub vitals: Vitals,
    pub triage: Triage,
    pub notes: ClinicalNotes,
    pub examiner: String,
    pub service_fee: Money,
    pub total_cost: Money,
    pub commit_token: CommitToken,
    pub created_at: DateTime<Utc>,
}

impl Visit {
    /// A visit counts as completed once it has a diagnosis or a recorded cost.
    pub fn is_completed(&self) -> bool {
        !self.notes.diagnosis.trim().is_empty() || self.total_cost != Money::ZERO
    }
}

/// One dispensed medicine on a visit. Unit price is copied at dispensation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionLine {
    pub id: RecordId,
    pub visit_id: RecordId,
    pub medicine_id: RecordId,
    /// Position within the visit, starting at 1.
    #[serde(default)]
    pub line_no: u32,
    pub qty: u32,
    pub unit_price: Money,
    pub created_at: DateTime<Utc>,
}

impl PrescriptionLine {
    pub fn line_total(&self) -> ClinicResult<Money> {
        crate::error::checked_line_total(self.unit_price, self.qty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_urgency_falls_back_to_default() {
        let triage = Triage {
            urgency: "  ".into(),
            alcohol: true,
            smoking: false,
        }
        .normalized();
        assert_eq!(triage.urgency, DEFAULT_URGENCY);
        assert!(triage.alcohol);

        let urgent = Triage {
            urgency: " ฉุกเฉิน ".into(),
            ..Triage::default()
        };
        assert_eq!(urgent.normalized().urgency, "ฉุกเฉิน");
    }

    #[test]
    fn bmi_rounds_to_two_decimals() {
        assert_eq!(compute_bmi(Some(60.0), Some(160.0)), Some(23.44));
        assert_eq!(compute_bmi(Some(70.0), Some(175.0)), Some(22.86));
        assert_eq!(compute_bmi(Some(60.0), None), None);
        assert_eq!(compute_bmi(Some(0.0), Some(160.0)), None);
    }

    #[test]
    fn vitals_validated_recomputes_bmi() {
        let vitals = Vitals {
            weight: Some(60.0),
            height: Some(160.0),
            bmi: Some(99.0),
            ..Default::default()
        };
        let valid = vitals.validated().unwrap();
        assert_eq!(valid.bmi, Some(23.44));
    }

    #[test]
    fn vitals_reject_non_positive_values() {
        let vitals = Vitals {
            pulse: Some(0),
            ..Default::default()
        };
        assert!(vitals.validated().is_err());

        let vitals = Vitals {
            temperature: Some(f64::NAN),
            ..Default::default()
        };
        assert!(vitals.validated().is_err());
    }

    #[test]
    fn notes_normalise_code() {
        let notes = ClinicalNotes {
            diagnosis_code: Some(" j00 ".into()),
            ..Default::default()
        };
        assert_eq!(
            notes.validated().unwrap().diagnosis_code.as_deref(),
            Some("J00")
        );

        let blank = ClinicalNotes {
            diagnosis_code: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(blank.validated().unwrap().diagnosis_code, None);

        let bad = ClinicalNotes {
            diagnosis_code: Some("common cold".into()),
            ..Default::default()
        };
        assert!(bad.validated().is_err());
    }
}
