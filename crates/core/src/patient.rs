//! Patient record types.

use crate::address::{Address, StoredAddress};
use crate::constants::{DEFAULT_TREATMENT_RIGHT, NONE_TEXT};
use crate::validation::{required_text, validate_national_id, validate_phone};
use crate::ClinicResult;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use clinic_uuid::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Title prefixes `นาย` (Mr) and `เด็กชาย` (boy) imply male; everything else female.
    pub fn from_prefix(prefix: &str) -> Self {
        match prefix.trim() {
            "นาย" | "เด็กชาย" => Gender::Male,
            _ => Gender::Female,
        }
    }
}

/// A registered patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: RecordId,
    /// Clinic-assigned patient number, distinct from the national ID.
    pub hn: String,
    pub national_id: String,
    pub prefix: String,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: NaiveDate,
    pub gender: Gender,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: Option<StoredAddress>,
    pub underlying_disease: String,
    pub drug_allergy: String,
    pub treatment_right: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub notes_revision: u64,
    pub created_at: DateTime<Utc>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {} {}", self.prefix, self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Age in whole years on `today`.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        today.years_since(self.birthdate).unwrap_or(0)
    }

    /// True when an allergy other than the "none" placeholder is recorded.
    pub fn has_drug_allergy(&self) -> bool {
        let allergy = self.drug_allergy.trim();
        !allergy.is_empty() && allergy != NONE_TEXT
    }
}

/// Registration/edit form for a patient.
///
/// Fields are raw form values; [`PatientForm::validate`] normalises them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientForm {
    pub national_id: String,
    pub prefix: String,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub underlying_disease: String,
    #[serde(default)]
    pub drug_allergy: String,
    #[serde(default)]
    pub treatment_right: String,
}

/// A validated patient form.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPatient {
    pub national_id: String,
    pub prefix: String,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: NaiveDate,
    pub gender: Gender,
    pub phone: String,
    pub address: Option<Address>,
    pub underlying_disease: String,
    pub drug_allergy: String,
    pub treatment_right: String,
}

impl PatientForm {
    pub fn validate(&self, today: NaiveDate) -> ClinicResult<ValidPatient> {
        let national_id = self.national_id.trim().to_string();
        validate_national_id(&national_id)?;
        let phone = self.phone.trim().to_string();
        validate_phone(&phone)?;

        let first_name = required_text("first_name", &self.first_name)?;
        let last_name = required_text("last_name", &self.last_name)?;
        let birthdate = self
            .birthdate
            .ok_or_else(|| crate::ClinicError::InvalidInput("birthdate is required".into()))?;
        if birthdate > today || birthdate.year() < 1900 {
            return Err(crate::ClinicError::InvalidInput(format!(
                "birthdate out of range: {}",
                birthdate
            )));
        }

        let prefix = self.prefix.trim().to_string();
        let gender = self.gender.unwrap_or_else(|| Gender::from_prefix(&prefix));

        Ok(ValidPatient {
            national_id,
            prefix,
            first_name,
            last_name,
            birthdate,
            gender,
            phone,
            address: self.address.clone().map(Address::normalised),
            underlying_disease: or_default(&self.underlying_disease, NONE_TEXT),
            drug_allergy: or_default(&self.drug_allergy, NONE_TEXT),
            treatment_right: or_default(&self.treatment_right, DEFAULT_TREATMENT_RIGHT),
        })
    }
}

fn or_default(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClinicError;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    fn form() -> PatientForm {
        PatientForm {
            national_id: "1234567890123".into(),
            prefix: "นาย".into(),
            first_name: " Somchai ".into(),
            last_name: "Jaidee".into(),
            birthdate: NaiveDate::from_ymd_opt(1990, 6, 1),
            ..Default::default()
        }
    }

    #[test]
    fn validate_applies_defaults() {
        let valid = form().validate(today()).expect("form should validate");
        assert_eq!(valid.first_name, "Somchai");
        assert_eq!(valid.gender, Gender::Male);
        assert_eq!(valid.drug_allergy, NONE_TEXT);
        assert_eq!(valid.underlying_disease, NONE_TEXT);
        assert_eq!(valid.treatment_right, DEFAULT_TREATMENT_RIGHT);
    }

    #[test]
    fn validate_rejects_bad_identifiers() {
        let mut bad_id = form();
        bad_id.national_id = "12345".into();
        assert!(matches!(
            bad_id.validate(today()),
            Err(ClinicError::InvalidNationalId)
        ));

        let mut bad_phone = form();
        bad_phone.phone = "0812".into();
        assert!(matches!(
            bad_phone.validate(today()),
            Err(ClinicError::InvalidPhone)
        ));
    }

    #[test]
    fn validate_rejects_future_birthdate() {
        let mut f = form();
        f.birthdate = NaiveDate::from_ymd_opt(2030, 1, 1);
        assert!(f.validate(today()).is_err());
    }

    #[test]
    fn gender_from_prefix() {
        assert_eq!(Gender::from_prefix("เด็กชาย"), Gender::Male);
        assert_eq!(Gender::from_prefix("นาง"), Gender::Female);
        assert_eq!(Gender::from_prefix("นางสาว"), Gender::Female);
    }
}
