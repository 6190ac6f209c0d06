//! Wire types for the clinic APIs.
//!
//! Amounts travel as integer satang (`*_satang` fields, 1 baht = 100 satang) so clients never
//! round. Identifiers are 32-character lowercase hex strings.

use chrono::{DateTime, NaiveDate, Utc};
use clinic_core::address::{format_address, Address, StoredAddress};
use clinic_core::diagnosis::DiagnosisCode;
use clinic_core::documents::MedicineLabel;
use clinic_core::expense::{Expense, ExpenseForm};
use clinic_core::medicine::{Medicine, MedicineForm};
use clinic_core::patient::{Gender, Patient, PatientForm};
use clinic_core::repositories::accounting::{DailyIncome, MonthlySummary};
use clinic_core::repositories::visits::{DispensedLine, NewVisit, NewVisitItem, VisitDetail};
use clinic_core::session::Session;
use clinic_core::validation::{sanitize_national_id, sanitize_phone};
use clinic_core::visit::{ClinicalNotes, Triage, Vitals};
use clinic_core::{ClinicResult, CommitToken, Money, RecordId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

// ----------------------------------------------------------------------------
// Sessions
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginReq {
    pub pin: String,
    #[serde(default)]
    pub operator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LoginRes {
    pub token: String,
    pub operator: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<Session> for LoginRes {
    fn from(s: Session) -> Self {
        Self {
            token: s.token,
            operator: s.operator,
            issued_at: s.issued_at,
            expires_at: s.expires_at,
        }
    }
}

// ----------------------------------------------------------------------------
// Patients
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GenderDto {
    Male,
    Female,
}

impl From<Gender> for GenderDto {
    fn from(g: Gender) -> Self {
        match g {
            Gender::Male => GenderDto::Male,
            Gender::Female => GenderDto::Female,
        }
    }
}

impl From<GenderDto> for Gender {
    fn from(g: GenderDto) -> Self {
        match g {
            GenderDto::Male => Gender::Male,
            GenderDto::Female => Gender::Female,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AddressDto {
    pub house_no: String,
    #[serde(default)]
    pub moo: Option<String>,
    pub tambon: String,
    pub amphoe: String,
    pub province: String,
    #[serde(default)]
    pub zip: Option<String>,
}

impl From<Address> for AddressDto {
    fn from(a: Address) -> Self {
        Self {
            house_no: a.house_no,
            moo: a.moo,
            tambon: a.tambon,
            amphoe: a.amphoe,
            province: a.province,
            zip: a.zip,
        }
    }
}

impl From<AddressDto> for Address {
    fn from(a: AddressDto) -> Self {
        Self {
            house_no: a.house_no,
            moo: a.moo,
            tambon: a.tambon,
            amphoe: a.amphoe,
            province: a.province,
            zip: a.zip,
        }
    }
}

/// Registration/edit body. Only the structured address form is accepted.
///
/// National ID and phone are sanitised like the intake form does: non-digits are dropped and the
/// result is cut at 13 and 10 digits.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PatientReq {
    pub national_id: String,
    #[serde(default)]
    pub prefix: String,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<GenderDto>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: Option<AddressDto>,
    #[serde(default)]
    pub underlying_disease: String,
    #[serde(default)]
    pub drug_allergy: String,
    #[serde(default)]
    pub treatment_right: String,
}

impl From<PatientReq> for PatientForm {
    fn from(r: PatientReq) -> Self {
        Self {
            national_id: sanitize_national_id(&r.national_id),
            prefix: r.prefix,
            first_name: r.first_name,
            last_name: r.last_name,
            birthdate: r.birthdate,
            gender: r.gender.map(Into::into),
            phone: sanitize_phone(&r.phone),
            address: r.address.map(Into::into),
            underlying_disease: r.underlying_disease,
            drug_allergy: r.drug_allergy,
            treatment_right: r.treatment_right,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatientRes {
    pub id: String,
    pub hn: String,
    pub national_id: String,
    pub prefix: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub birthdate: NaiveDate,
    pub gender: GenderDto,
    pub phone: String,
    /// Structured address, absent for legacy free-text records.
    pub address: Option<AddressDto>,
    /// Printable address line; `-` when none is recorded.
    pub address_text: String,
    pub underlying_disease: String,
    pub drug_allergy: String,
    pub has_drug_allergy: bool,
    pub treatment_right: String,
    pub notes: String,
    pub notes_revision: u64,
    pub created_at: DateTime<Utc>,
}

impl From<Patient> for PatientRes {
    fn from(p: Patient) -> Self {
        let address_text = format_address(p.address.as_ref());
        let address = match &p.address {
            Some(StoredAddress::Structured(a)) => Some(AddressDto::from(a.clone())),
            _ => None,
        };
        Self {
            id: p.id.to_string(),
            full_name: p.full_name(),
            has_drug_allergy: p.has_drug_allergy(),
            hn: p.hn,
            national_id: p.national_id,
            prefix: p.prefix,
            first_name: p.first_name,
            last_name: p.last_name,
            birthdate: p.birthdate,
            gender: p.gender.into(),
            phone: p.phone,
            address,
            address_text,
            underlying_disease: p.underlying_disease,
            drug_allergy: p.drug_allergy,
            treatment_right: p.treatment_right,
            notes: p.notes,
            notes_revision: p.notes_revision,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotesReq {
    pub notes: String,
    /// Must be greater than the stored revision.
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NotesRes {
    pub revision: u64,
}

// ----------------------------------------------------------------------------
// Visits
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VitalsDto {
    pub temperature: Option<f64>,
    pub pulse: Option<u32>,
    pub resp_rate: Option<u32>,
    pub bp_systolic: Option<u32>,
    pub bp_diastolic: Option<u32>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    /// Ignored on input; always recomputed from weight and height.
    pub bmi: Option<f64>,
}

impl From<Vitals> for VitalsDto {
    fn from(v: Vitals) -> Self {
        Self {
            temperature: v.temperature,
            pulse: v.pulse,
            resp_rate: v.resp_rate,
            bp_systolic: v.bp_systolic,
            bp_diastolic: v.bp_diastolic,
            weight: v.weight,
            height: v.height,
            bmi: v.bmi,
        }
    }
}

impl From<VitalsDto> for Vitals {
    fn from(v: VitalsDto) -> Self {
        Self {
            temperature: v.temperature,
            pulse: v.pulse,
            resp_rate: v.resp_rate,
            bp_systolic: v.bp_systolic,
            bp_diastolic: v.bp_diastolic,
            weight: v.weight,
            height: v.height,
            bmi: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TriageDto {
    pub urgency: String,
    #[serde(default)]
    pub alcohol: bool,
    #[serde(default)]
    pub smoking: bool,
}

impl From<Triage> for TriageDto {
    fn from(t: Triage) -> Self {
        Self {
            urgency: t.urgency,
            alcohol: t.alcohol,
            smoking: t.smoking,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ClinicalNotesDto {
    #[serde(default)]
    pub cc: String,
    #[serde(default)]
    pub pe: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub diagnosis_code: Option<String>,
}

impl From<ClinicalNotes> for ClinicalNotesDto {
    fn from(n: ClinicalNotes) -> Self {
        Self {
            cc: n.cc,
            pe: n.pe,
            diagnosis: n.diagnosis,
            diagnosis_code: n.diagnosis_code,
        }
    }
}

impl From<ClinicalNotesDto> for ClinicalNotes {
    fn from(n: ClinicalNotesDto) -> Self {
        Self {
            cc: n.cc,
            pe: n.pe,
            diagnosis: n.diagnosis,
            diagnosis_code: n.diagnosis_code,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VisitItemReq {
    pub medicine_id: String,
    pub qty: u32,
}

/// A whole visit: vitals, diagnosis, basket and fee, committed atomically.
///
/// `commit_token` is generated by the client once per visit draft and resent unchanged on
/// retries; a token that was already committed is answered with 409.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VisitReq {
    pub patient_id: String,
    pub commit_token: String,
    #[serde(default)]
    pub examiner: Option<String>,
    #[serde(default)]
    pub vitals: VitalsDto,
    #[serde(default)]
    pub triage: Option<TriageDto>,
    #[serde(default)]
    pub notes: ClinicalNotesDto,
    #[serde(default)]
    pub items: Vec<VisitItemReq>,
    #[serde(default)]
    pub service_fee_satang: i64,
}

impl VisitReq {
    pub fn into_new_visit(self) -> ClinicResult<NewVisit> {
        let items = self
            .items
            .into_iter()
            .map(|i| -> ClinicResult<NewVisitItem> {
                Ok(NewVisitItem {
                    medicine_id: RecordId::parse(&i.medicine_id)?,
                    qty: i.qty,
                })
            })
            .collect::<ClinicResult<Vec<_>>>()?;
        let triage = self
            .triage
            .map(|t| Triage {
                urgency: t.urgency,
                alcohol: t.alcohol,
                smoking: t.smoking,
            })
            .unwrap_or_default()
            .normalized();
        Ok(NewVisit {
            patient_id: RecordId::parse(&self.patient_id)?,
            commit_token: CommitToken::parse(&self.commit_token)?,
            examiner: self.examiner,
            vitals: self.vitals.into(),
            triage,
            notes: self.notes.into(),
            items,
            service_fee: Money::from_satang(self.service_fee_satang),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VisitLineRes {
    pub line_no: u32,
    pub medicine_id: String,
    pub medicine_name: String,
    pub qty: u32,
    pub unit: String,
    pub instruction: String,
    pub unit_price_satang: i64,
    pub line_total_satang: i64,
}

impl From<DispensedLine> for VisitLineRes {
    fn from(l: DispensedLine) -> Self {
        Self {
            line_no: l.line.line_no,
            medicine_id: l.line.medicine_id.to_string(),
            medicine_name: l.medicine_name,
            qty: l.line.qty,
            unit: l.unit,
            instruction: l.instruction,
            unit_price_satang: l.line.unit_price.satang(),
            line_total_satang: l.line_total.satang(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VisitRes {
    pub id: String,
    pub patient_id: String,
    pub hn: String,
    pub patient_name: String,
    pub examiner: String,
    pub vitals: VitalsDto,
    pub triage: TriageDto,
    pub notes: ClinicalNotesDto,
    pub lines: Vec<VisitLineRes>,
    pub service_fee_satang: i64,
    pub total_cost_satang: i64,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<VisitDetail> for VisitRes {
    fn from(d: VisitDetail) -> Self {
        let completed = d.visit.is_completed();
        Self {
            id: d.visit.id.to_string(),
            patient_id: d.visit.patient_id.to_string(),
            hn: d.patient.hn.clone(),
            patient_name: d.patient.full_name(),
            examiner: d.visit.examiner,
            vitals: d.visit.vitals.into(),
            triage: d.visit.triage.into(),
            notes: d.visit.notes.into(),
            lines: d.lines.into_iter().map(Into::into).collect(),
            service_fee_satang: d.visit.service_fee.satang(),
            total_cost_satang: d.visit.total_cost.satang(),
            completed,
            created_at: d.visit.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReportRes {
    pub visit_id: String,
    pub markdown: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LabelRes {
    pub patient_name: String,
    pub hn: String,
    pub date: NaiveDate,
    pub medicine_name: String,
    pub qty: u32,
    pub unit: String,
    pub instruction: String,
}

impl From<MedicineLabel> for LabelRes {
    fn from(l: MedicineLabel) -> Self {
        Self {
            patient_name: l.patient_name,
            hn: l.hn,
            date: l.date,
            medicine_name: l.medicine_name,
            qty: l.qty,
            unit: l.unit,
            instruction: l.instruction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LabelsRes {
    pub labels: Vec<LabelRes>,
    /// Printable sheet, one 8cm x 5cm label per page.
    pub html: String,
}

// ----------------------------------------------------------------------------
// Medicines
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MedicineReq {
    pub name: String,
    pub unit: String,
    pub price_per_unit_satang: i64,
    #[serde(default)]
    pub stock_qty: u32,
    #[serde(default)]
    pub instruction: String,
}

impl From<MedicineReq> for MedicineForm {
    fn from(r: MedicineReq) -> Self {
        Self {
            name: r.name,
            unit: r.unit,
            price_per_unit: Money::from_satang(r.price_per_unit_satang),
            stock_qty: r.stock_qty,
            instruction: r.instruction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MedicineRes {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub price_per_unit_satang: i64,
    pub stock_qty: u32,
    pub instruction: String,
    pub created_at: DateTime<Utc>,
}

impl From<Medicine> for MedicineRes {
    fn from(m: Medicine) -> Self {
        Self {
            id: m.id.to_string(),
            name: m.name,
            unit: m.unit,
            price_per_unit_satang: m.price_per_unit.satang(),
            stock_qty: m.stock_qty,
            instruction: m.instruction,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RestockReq {
    /// Units to add; must be positive.
    pub qty: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RestockRes {
    pub id: String,
    pub stock_qty: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DiagnosisCodeRes {
    pub code: String,
    pub description_th: Option<String>,
    pub description_en: Option<String>,
}

impl From<DiagnosisCode> for DiagnosisCodeRes {
    fn from(c: DiagnosisCode) -> Self {
        Self {
            code: c.code,
            description_th: c.description_th,
            description_en: c.description_en,
        }
    }
}

// ----------------------------------------------------------------------------
// Accounting
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpenseReq {
    pub date: NaiveDate,
    pub title: String,
    pub amount_satang: i64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub remark: String,
}

impl From<ExpenseReq> for ExpenseForm {
    fn from(r: ExpenseReq) -> Self {
        Self {
            date: r.date,
            title: r.title,
            amount: Money::from_satang(r.amount_satang),
            category: r.category,
            remark: r.remark,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExpenseRes {
    pub id: String,
    pub date: NaiveDate,
    pub title: String,
    pub amount_satang: i64,
    pub category: String,
    pub remark: String,
    pub created_at: DateTime<Utc>,
}

impl From<Expense> for ExpenseRes {
    fn from(e: Expense) -> Self {
        Self {
            id: e.id.to_string(),
            date: e.date,
            title: e.title,
            amount_satang: e.amount.satang(),
            category: e.category,
            remark: e.remark,
            created_at: e.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonthlySummaryRes {
    pub month: String,
    pub expenses: Vec<ExpenseRes>,
    pub income_satang: i64,
    pub total_expense_satang: i64,
    pub net_satang: i64,
    pub margin_percent: f64,
    pub visit_count: usize,
    pub expense_count: usize,
}

impl From<MonthlySummary> for MonthlySummaryRes {
    fn from(s: MonthlySummary) -> Self {
        Self {
            month: s.month,
            expenses: s.expenses.into_iter().map(Into::into).collect(),
            income_satang: s.income.satang(),
            total_expense_satang: s.total_expense.satang(),
            net_satang: s.net.satang(),
            margin_percent: s.margin_percent,
            visit_count: s.visit_count,
            expense_count: s.expense_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DailyIncomeRes {
    pub date: NaiveDate,
    pub income_satang: i64,
    pub visit_count: usize,
}

impl From<DailyIncome> for DailyIncomeRes {
    fn from(d: DailyIncome) -> Self {
        Self {
            date: d.date,
            income_satang: d.income.satang(),
            visit_count: d.visit_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_core::ClinicError;

    fn patient(address: Option<StoredAddress>) -> Patient {
        Patient {
            id: RecordId::new(),
            hn: "HN000001".into(),
            national_id: "1234567890123".into(),
            prefix: "นาง".into(),
            first_name: "Malee".into(),
            last_name: "Sukjai".into(),
            birthdate: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
            gender: Gender::Female,
            phone: String::new(),
            address,
            underlying_disease: "ความดันโลหิตสูง".into(),
            drug_allergy: "ไม่มี".into(),
            treatment_right: "บัตรทอง".into(),
            notes: String::new(),
            notes_revision: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn patient_res_exposes_legacy_address_as_text_only() {
        let res = PatientRes::from(patient(Some(StoredAddress::Legacy("99 ซอยสุข".into()))));
        assert_eq!(res.address, None);
        assert_eq!(res.address_text, "99 ซอยสุข");
        assert!(!res.has_drug_allergy);
        assert_eq!(res.full_name, "นาง Malee Sukjai");

        let res = PatientRes::from(patient(None));
        assert_eq!(res.address_text, "-");
    }

    #[test]
    fn patient_req_rejects_string_address() {
        let body = r#"{"national_id":"1234567890123","first_name":"A","last_name":"B","birthdate":"1990-01-01","address":"99 ซอยสุข"}"#;
        assert!(serde_json::from_str::<PatientReq>(body).is_err());

        let body = r#"{"national_id":"1234567890123","first_name":"A","last_name":"B","birthdate":"1990-01-01","address":{"house_no":"1","tambon":"t","amphoe":"a","province":"p"}}"#;
        let req: PatientReq = serde_json::from_str(body).expect("structured address should parse");
        assert_eq!(PatientForm::from(req).address.unwrap().house_no, "1");
    }

    #[test]
    fn patient_req_sanitises_identifiers() {
        let form = PatientForm::from(PatientReq {
            national_id: "1-2345-67890-12-3 9".into(),
            phone: "(081) 234-5678 ext 9".into(),
            ..Default::default()
        });
        assert_eq!(form.national_id, "1234567890123");
        assert_eq!(form.phone, "0812345678");
    }

    #[test]
    fn visit_req_parses_identifiers() {
        let medicine = RecordId::new();
        let req = VisitReq {
            patient_id: RecordId::new().to_string(),
            commit_token: CommitToken::new().to_string(),
            examiner: None,
            vitals: VitalsDto {
                bmi: Some(99.0),
                ..Default::default()
            },
            triage: None,
            notes: ClinicalNotesDto::default(),
            items: vec![VisitItemReq {
                medicine_id: medicine.to_string(),
                qty: 2,
            }],
            service_fee_satang: 5000,
        };
        let visit = req.clone().into_new_visit().expect("request should convert");
        assert_eq!(visit.items[0].medicine_id, medicine);
        assert_eq!(visit.service_fee, Money::from_baht(50));
        assert_eq!(visit.vitals.bmi, None);
        assert_eq!(visit.triage, Triage::default());

        let bad = VisitReq {
            commit_token: "retry-1".into(),
            ..req
        };
        assert!(matches!(bad.into_new_visit(), Err(ClinicError::Uuid(_))));
    }

    #[test]
    fn blank_urgency_uses_the_default_level() {
        let req = VisitReq {
            patient_id: RecordId::new().to_string(),
            commit_token: CommitToken::new().to_string(),
            examiner: None,
            vitals: VitalsDto::default(),
            triage: Some(TriageDto {
                urgency: "".into(),
                alcohol: false,
                smoking: true,
            }),
            notes: ClinicalNotesDto::default(),
            items: vec![],
            service_fee_satang: 0,
        };
        let visit = req.into_new_visit().expect("request should convert");
        assert_eq!(visit.triage.urgency, Triage::default().urgency);
        assert!(visit.triage.smoking);
    }
}
