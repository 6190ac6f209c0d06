//! Expenses and income reporting.
//!
//! Income is the total cost of visits, bucketed by the UTC date the visit was recorded.

use crate::expense::{Expense, ExpenseForm};
use crate::session::{AuthService, Session};
use crate::store::{ClinicData, Database};
use crate::{ClinicError, ClinicResult};
use chrono::{Datelike, NaiveDate, Utc};
use clinic_types::Money;
use clinic_uuid::RecordId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Longest range accepted by [`AccountingService::daily_income`].
pub const MAX_DAILY_RANGE_DAYS: i64 = 366;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// `YYYY-MM`
    pub month: String,
    /// Newest first.
    pub expenses: Vec<Expense>,
    pub income: Money,
    pub total_expense: Money,
    pub net: Money,
    /// `net / income × 100`, one decimal. A month with no income divides by 1 baht.
    pub margin_percent: f64,
    pub visit_count: usize,
    pub expense_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyIncome {
    pub date: NaiveDate,
    pub income: Money,
    pub visit_count: usize,
}

/// Parses `YYYY-MM` into the first day of that month.
pub fn parse_month(month: &str) -> ClinicResult<NaiveDate> {
    let invalid = || ClinicError::InvalidInput(format!("month must be YYYY-MM, got {}", month));
    let (y, m) = month.trim().split_once('-').ok_or_else(invalid)?;
    if y.len() != 4 || m.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = y.parse().map_err(|_| invalid())?;
    let month_no: u32 = m.parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month_no, 1).ok_or_else(invalid)
}

fn same_month(date: NaiveDate, first: NaiveDate) -> bool {
    date.year() == first.year() && date.month() == first.month()
}

fn margin_percent(net: Money, income: Money) -> f64 {
    let income_baht = if income == Money::ZERO {
        1.0
    } else {
        income.satang() as f64 / 100.0
    };
    let net_baht = net.satang() as f64 / 100.0;
    ((net_baht / income_baht) * 100.0 * 10.0).round() / 10.0
}

fn sum(amounts: impl IntoIterator<Item = Money>, what: &'static str) -> ClinicResult<Money> {
    amounts.into_iter().try_fold(Money::ZERO, |acc, m| {
        acc.checked_add(m).ok_or_else(|| crate::error::overflow(what))
    })
}

fn expenses_newest_first<'a>(
    d: &'a ClinicData,
    keep: impl Fn(&Expense) -> bool,
) -> Vec<&'a Expense> {
    let mut rows: Vec<&Expense> = d.expenses.values().filter(|e| keep(e)).collect();
    rows.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    rows
}

#[derive(Clone, Debug)]
pub struct AccountingService {
    db: Arc<Database>,
    auth: AuthService,
}

impl AccountingService {
    pub fn new(db: Arc<Database>, auth: AuthService) -> Self {
        Self { db, auth }
    }

    pub fn add_expense(&self, session: &Session, form: &ExpenseForm) -> ClinicResult<Expense> {
        self.auth.revalidate(session)?;
        let form = form.validated()?;
        let expense = Expense {
            id: RecordId::new(),
            date: form.date,
            title: form.title,
            amount: form.amount,
            category: form.category,
            remark: form.remark,
            created_at: Utc::now(),
        };
        self.db.transact(|d| {
            d.expenses.insert(expense.id, expense.clone());
            Ok(())
        })?;
        tracing::info!(amount = %expense.amount, category = %expense.category, "expense recorded");
        Ok(expense)
    }

    pub fn delete_expense(&self, session: &Session, id: &RecordId) -> ClinicResult<()> {
        self.auth.revalidate(session)?;
        self.db.transact(|d| {
            d.expenses
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| ClinicError::ExpenseNotFound(id.to_string()))
        })
    }

    /// All expenses, or those of one `YYYY-MM` month, newest first.
    pub fn list_expenses(&self, month: Option<&str>) -> ClinicResult<Vec<Expense>> {
        let first = month.map(parse_month).transpose()?;
        self.db.read(|d| {
            expenses_newest_first(d, |e| first.map_or(true, |f| same_month(e.date, f)))
                .into_iter()
                .cloned()
                .collect()
        })
    }

    pub fn monthly_summary(&self, month: &str) -> ClinicResult<MonthlySummary> {
        let first = parse_month(month)?;
        self.db.read(|d| -> ClinicResult<MonthlySummary> {
            let expenses: Vec<Expense> =
                expenses_newest_first(d, |e| same_month(e.date, first))
                    .into_iter()
                    .cloned()
                    .collect();
            let visits: Vec<Money> = d
                .visits
                .values()
                .filter(|v| same_month(v.created_at.date_naive(), first))
                .map(|v| v.total_cost)
                .collect();

            let income = sum(visits.iter().copied(), "monthly income")?;
            let total_expense = sum(expenses.iter().map(|e| e.amount), "monthly expenses")?;
            let net = income
                .checked_sub(total_expense)
                .ok_or_else(|| crate::error::overflow("monthly net"))?;

            Ok(MonthlySummary {
                month: first.format("%Y-%m").to_string(),
                expense_count: expenses.len(),
                visit_count: visits.len(),
                margin_percent: margin_percent(net, income),
                expenses,
                income,
                total_expense,
                net,
            })
        })?
    }

    /// Income per day over `from..=to`, one entry per day including empty days.
    pub fn daily_income(&self, from: NaiveDate, to: NaiveDate) -> ClinicResult<Vec<DailyIncome>> {
        if from > to {
            return Err(ClinicError::InvalidInput(format!(
                "range start {} is after end {}",
                from, to
            )));
        }
        if (to - from).num_days() >= MAX_DAILY_RANGE_DAYS {
            return Err(ClinicError::InvalidInput(format!(
                "range may cover at most {} days",
                MAX_DAILY_RANGE_DAYS
            )));
        }

        self.db.read(|d| -> ClinicResult<Vec<DailyIncome>> {
            let mut days: Vec<DailyIncome> = from
                .iter_days()
                .take_while(|day| *day <= to)
                .map(|date| DailyIncome {
                    date,
                    income: Money::ZERO,
                    visit_count: 0,
                })
                .collect();
            for visit in d.visits.values() {
                let date = visit.created_at.date_naive();
                if date < from || date > to {
                    continue;
                }
                let idx = (date - from).num_days() as usize;
                if let Some(day) = days.get_mut(idx) {
                    day.income = day
                        .income
                        .checked_add(visit.total_cost)
                        .ok_or_else(|| crate::error::overflow("daily income"))?;
                    day.visit_count += 1;
                }
            }
            Ok(days)
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::clinic;
    use crate::visit::{ClinicalNotes, Triage, Visit, Vitals};
    use chrono::{TimeZone, Utc};
    use clinic_uuid::CommitToken;

    fn expense(date: NaiveDate, amount: i64) -> ExpenseForm {
        ExpenseForm {
            date,
            title: "ค่าเช่า".into(),
            amount: Money::from_baht(amount),
            category: String::new(),
            remark: String::new(),
        }
    }

    fn seed_visit(c: &crate::Clinic, y: i32, m: u32, day: u32, total: i64) {
        c.database()
            .transact(|d| {
                let visit = Visit {
                    id: RecordId::new(),
                    patient_id: RecordId::new(),
                    vitals: Vitals::default(),
                    triage: Triage::default(),
                    notes: ClinicalNotes::default(),
                    examiner: "Dr. Test".into(),
                    service_fee: Money::ZERO,
                    total_cost: Money::from_baht(total),
                    commit_token: CommitToken::new(),
                    created_at: Utc.with_ymd_and_hms(y, m, day, 3, 0, 0).unwrap(),
                };
                d.visits.insert(visit.id, visit);
                Ok(())
            })
            .unwrap();
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_month_accepts_only_yyyy_mm() {
        assert_eq!(parse_month("2026-03").unwrap(), ymd(2026, 3, 1));
        assert!(parse_month("2026-3").is_err());
        assert!(parse_month("2026-13").is_err());
        assert!(parse_month("March").is_err());
    }

    #[test]
    fn margin_divides_by_one_baht_only_without_income() {
        assert_eq!(margin_percent(Money::from_satang(50), Money::from_satang(50)), 100.0);
        assert_eq!(margin_percent(Money::from_baht(-300), Money::ZERO), -30000.0);
        assert_eq!(margin_percent(Money::from_baht(1), Money::from_baht(3)), 33.3);
    }

    #[test]
    fn monthly_summary_totals_and_margin() {
        let (c, session) = clinic();
        let acc = c.accounting();
        acc.add_expense(&session, &expense(ymd(2026, 3, 2), 100)).unwrap();
        let later = acc.add_expense(&session, &expense(ymd(2026, 3, 20), 200)).unwrap();
        acc.add_expense(&session, &expense(ymd(2026, 4, 1), 999)).unwrap();
        seed_visit(&c, 2026, 3, 5, 80);
        seed_visit(&c, 2026, 3, 6, 920);
        seed_visit(&c, 2026, 2, 28, 5000);

        let summary = acc.monthly_summary("2026-03").unwrap();
        assert_eq!(summary.income, Money::from_baht(1000));
        assert_eq!(summary.total_expense, Money::from_baht(300));
        assert_eq!(summary.net, Money::from_baht(700));
        assert_eq!(summary.margin_percent, 70.0);
        assert_eq!(summary.visit_count, 2);
        assert_eq!(summary.expense_count, 2);
        assert_eq!(summary.expenses[0].id, later.id);
    }

    #[test]
    fn margin_with_no_income_divides_by_one_baht() {
        let (c, session) = clinic();
        let acc = c.accounting();
        acc.add_expense(&session, &expense(ymd(2026, 5, 1), 3)).unwrap();
        let summary = acc.monthly_summary("2026-05").unwrap();
        assert_eq!(summary.net, Money::from_baht(-3));
        assert_eq!(summary.margin_percent, -300.0);
        assert_eq!(margin_percent(Money::from_baht(1), Money::from_baht(3)), 33.3);
    }

    #[test]
    fn daily_income_is_zero_filled() {
        let (c, _) = clinic();
        seed_visit(&c, 2026, 3, 2, 50);
        seed_visit(&c, 2026, 3, 2, 30);
        seed_visit(&c, 2026, 3, 4, 10);
        seed_visit(&c, 2026, 3, 9, 10);

        let days = c
            .accounting()
            .daily_income(ymd(2026, 3, 1), ymd(2026, 3, 4))
            .unwrap();
        assert_eq!(days.len(), 4);
        assert_eq!(days[0].income, Money::ZERO);
        assert_eq!(days[1].income, Money::from_baht(80));
        assert_eq!(days[1].visit_count, 2);
        assert_eq!(days[3].income, Money::from_baht(10));

        assert!(c
            .accounting()
            .daily_income(ymd(2026, 3, 4), ymd(2026, 3, 1))
            .is_err());
    }

    #[test]
    fn delete_expense_and_list_by_month() {
        let (c, session) = clinic();
        let acc = c.accounting();
        let e = acc.add_expense(&session, &expense(ymd(2026, 3, 2), 100)).unwrap();
        acc.add_expense(&session, &expense(ymd(2026, 4, 2), 100)).unwrap();
        assert_eq!(acc.list_expenses(Some("2026-03")).unwrap().len(), 1);
        assert_eq!(acc.list_expenses(None).unwrap().len(), 2);

        acc.delete_expense(&session, &e.id).unwrap();
        assert!(matches!(
            acc.delete_expense(&session, &e.id),
            Err(ClinicError::ExpenseNotFound(_))
        ));
    }
}
