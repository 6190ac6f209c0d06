//! Manually entered clinic expenses.

use crate::constants::DEFAULT_EXPENSE_CATEGORY;
use crate::validation::required_text;
use crate::{ClinicError, ClinicResult};
use chrono::{DateTime, NaiveDate, Utc};
use clinic_types::Money;
use clinic_uuid::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: RecordId,
    pub date: NaiveDate,
    pub title: String,
    pub amount: Money,
    pub category: String,
    #[serde(default)]
    pub remark: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseForm {
    pub date: NaiveDate,
    pub title: String,
    pub amount: Money,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub remark: String,
}

impl ExpenseForm {
    pub fn validated(&self) -> ClinicResult<ExpenseForm> {
        if self.amount <= Money::ZERO {
            return Err(ClinicError::InvalidInput(
                "expense amount must be greater than zero".into(),
            ));
        }
        let category = self.category.trim();
        Ok(ExpenseForm {
            date: self.date,
            title: required_text("title", &self.title)?,
            amount: self.amount,
            category: if category.is_empty() {
                DEFAULT_EXPENSE_CATEGORY.to_string()
            } else {
                category.to_string()
            },
            remark: self.remark.trim().to_string(),
        })
    }
}
