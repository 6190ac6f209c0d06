//! Diagnosis classification reference table.
//!
//! The table is static at runtime. It is loaded from a YAML list at startup:
//!
//! ```yaml
//! - code: J00
//!   description_th: ไข้หวัด
//!   description_en: Acute nasopharyngitis [common cold]
//! ```

use crate::constants::{DIAGNOSIS_SEARCH_LIMIT, DIAGNOSIS_SEARCH_MIN_CHARS};
use crate::{ClinicError, ClinicResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisCode {
    pub code: String,
    #[serde(default)]
    pub description_th: Option<String>,
    #[serde(default)]
    pub description_en: Option<String>,
}

impl DiagnosisCode {
    fn matches(&self, needle: &str) -> bool {
        let hit = |s: &str| s.to_lowercase().contains(needle);
        hit(&self.code)
            || self.description_th.as_deref().is_some_and(hit)
            || self.description_en.as_deref().is_some_and(hit)
    }
}

/// Case-insensitive substring search over code and both descriptions.
///
/// Terms shorter than two characters return nothing; at most ten results.
pub fn search_codes<'a>(
    codes: impl IntoIterator<Item = &'a DiagnosisCode>,
    term: &str,
) -> Vec<DiagnosisCode> {
    let needle = term.trim().to_lowercase();
    if needle.chars().count() < DIAGNOSIS_SEARCH_MIN_CHARS {
        return Vec::new();
    }
    codes
        .into_iter()
        .filter(|c| c.matches(&needle))
        .take(DIAGNOSIS_SEARCH_LIMIT)
        .cloned()
        .collect()
}

/// Reads a YAML list of diagnosis codes.
pub fn load_codes_file(path: &Path) -> ClinicResult<Vec<DiagnosisCode>> {
    let raw = fs::read_to_string(path).map_err(ClinicError::FileRead)?;
    let codes: Vec<DiagnosisCode> =
        serde_yaml::from_str(&raw).map_err(ClinicError::YamlDeserialization)?;
    tracing::info!("loaded {} diagnosis codes from {}", codes.len(), path.display());
    Ok(codes)
}
