//! Medicine catalog types.

use crate::validation::required_text;
use crate::{ClinicError, ClinicResult};
use chrono::{DateTime, Utc};
use clinic_types::Money;
use clinic_uuid::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medicine {
    pub id: RecordId,
    pub name: String,
    /// Dispensing unit label, e.g. `เม็ด` (tablet) or `ขวด` (bottle).
    pub unit: String,
    pub price_per_unit: Money,
    pub stock_qty: u32,
    #[serde(default)]
    pub instruction: String,
    pub created_at: DateTime<Utc>,
}

/// Create/edit form for a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineForm {
    pub name: String,
    pub unit: String,
    pub price_per_unit: Money,
    pub stock_qty: u32,
    #[serde(default)]
    pub instruction: String,
}

impl MedicineForm {
    pub fn validated(&self) -> ClinicResult<MedicineForm> {
        if self.price_per_unit.is_negative() {
            return Err(ClinicError::InvalidInput(
                "price_per_unit cannot be negative".into(),
            ));
        }
        Ok(MedicineForm {
            name: required_text("name", &self.name)?,
            unit: required_text("unit", &self.unit)?,
            price_per_unit: self.price_per_unit,
            stock_qty: self.stock_qty,
            instruction: self.instruction.trim().to_string(),
        })
    }
}

/// Low-stock projection: medicines strictly below `threshold`, lowest stock first.
pub fn low_stock<'a>(
    medicines: impl IntoIterator<Item = &'a Medicine>,
    threshold: u32,
) -> Vec<Medicine> {
    let mut low: Vec<Medicine> = medicines
        .into_iter()
        .filter(|m| m.stock_qty < threshold)
        .cloned()
        .collect();
    low.sort_by(|a, b| a.stock_qty.cmp(&b.stock_qty).then_with(|| a.name.cmp(&b.name)));
    low
}

#[cfg(test)]
mod tests {
    use super::*;

    fn med(name: &str, stock: u32) -> Medicine {
        Medicine {
            id: RecordId::new(),
            name: name.into(),
            unit: "เม็ด".into(),
            price_per_unit: Money::from_baht(1),
            stock_qty: stock,
            instruction: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn low_stock_is_strictly_below_threshold_and_sorted() {
        let meds = vec![
            med("Paracetamol", 10),
            med("Amoxicillin", 3),
            med("ORS", 9),
            med("Cetirizine", 0),
            med("Omeprazole", 50),
        ];
        let names: Vec<String> = low_stock(&meds, 10).into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["Cetirizine", "Amoxicillin", "ORS"]);
    }

    #[test]
    fn form_requires_name_and_unit() {
        let form = MedicineForm {
            name: " ".into(),
            unit: "เม็ด".into(),
            price_per_unit: Money::from_baht(2),
            stock_qty: 1,
            instruction: String::new(),
        };
        assert!(form.validated().is_err());
    }

    #[test]
    fn form_rejects_negative_price() {
        let form = MedicineForm {
            name: "Paracetamol".into(),
            unit: "เม็ด".into(),
            price_per_unit: Money::from_satang(-1),
            stock_qty: 1,
            instruction: String::new(),
        };
        assert!(matches!(form.validated(), Err(ClinicError::InvalidInput(_))));
    }
}
