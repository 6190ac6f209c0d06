//! Printable documents for a recorded visit.
//!
//! Two outputs are produced from a [`VisitDetail`]:
//!
//! - a Markdown visit report, one page, ending with signature blocks for the patient and the
//!   examiner
//! - a sheet of medicine labels, one 8cm × 5cm label per dispensed line, rendered as HTML with a
//!   page break after each label so a label printer feeds one label per page

use crate::address::format_address;
use crate::repositories::visits::VisitDetail;
use crate::visit::Vitals;
use crate::{ClinicError, ClinicResult, NonEmptyText};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Label size in centimetres (width, height).
pub const LABEL_SIZE_CM: (u32, u32) = (8, 5);

/// Content of one medicine label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineLabel {
    pub patient_name: String,
    pub hn: String,
    pub date: NaiveDate,
    pub medicine_name: String,
    pub qty: u32,
    pub unit: String,
    pub instruction: String,
}

#[derive(Debug, Clone)]
pub struct DocumentService {
    clinic_name: NonEmptyText,
}

impl DocumentService {
    pub fn new(clinic_name: NonEmptyText) -> Self {
        Self { clinic_name }
    }

    /// Renders the visit report as Markdown.
    ///
    /// Missing measurements are printed as `-`. Free text entered by staff is escaped so it
    /// cannot open headings or break table rows.
    pub fn visit_report(&self, detail: &VisitDetail) -> ClinicResult<NonEmptyText> {
        let visit = &detail.visit;
        let patient = &detail.patient;
        let visit_date = visit.created_at.date_naive();
        let mut out = String::new();

        out.push_str(&format!("# {}\n\n", escape_inline(self.clinic_name.as_str())));
        out.push_str("## ใบบันทึกการตรวจรักษา\n\n");
        out.push_str(&format!(
            "**วันที่:** {}  \n**เลขที่การตรวจ:** {}\n\n",
            visit.created_at.format("%Y-%m-%d %H:%M"),
            visit.id
        ));

        out.push_str("### ข้อมูลผู้ป่วย\n\n");
        out.push_str("| | |\n|---|---|\n");
        for (label, value) in [
            ("ชื่อ-นามสกุล", patient.full_name()),
            ("HN", patient.hn.clone()),
            ("เลขบัตรประชาชน", patient.national_id.clone()),
            ("อายุ", format!("{} ปี", patient.age_on(visit_date))),
            ("ที่อยู่", format_address(patient.address.as_ref())),
            ("แพ้ยา", patient.drug_allergy.clone()),
            ("โรคประจำตัว", patient.underlying_disease.clone()),
            ("สิทธิการรักษา", patient.treatment_right.clone()),
        ] {
            out.push_str(&format!("| {} | {} |\n", label, escape_cell(&value)));
        }
        out.push('\n');

        out.push_str("### สัญญาณชีพ\n\n");
        out.push_str("| | |\n|---|---|\n");
        for (label, value) in vitals_rows(&visit.vitals) {
            out.push_str(&format!("| {} | {} |\n", label, value));
        }
        out.push('\n');

        out.push_str("### คัดกรอง\n\n");
        out.push_str(&format!(
            "- ความเร่งด่วน: {}\n- ดื่มสุรา: {}\n- สูบบุหรี่: {}\n\n",
            escape_inline(&visit.triage.urgency),
            yes_no(visit.triage.alcohol),
            yes_no(visit.triage.smoking)
        ));

        out.push_str("### การตรวจ\n\n");
        out.push_str(&format!("**CC:** {}\n\n", or_dash(&visit.notes.cc)));
        out.push_str(&format!("**PE:** {}\n\n", or_dash(&visit.notes.pe)));
        let diagnosis = match visit.notes.diagnosis_code.as_deref() {
            Some(code) => format!("{} ({})", or_dash(&visit.notes.diagnosis), code),
            None => or_dash(&visit.notes.diagnosis),
        };
        out.push_str(&format!("**Diagnosis:** {}\n\n", diagnosis));

        out.push_str("### รายการยา\n\n");
        if detail.lines.is_empty() {
            out.push_str("-\n\n");
        } else {
            out.push_str("| # | รายการ | จำนวน | ราคา/หน่วย | รวม |\n|---|---|---|---|---|\n");
            for line in &detail.lines {
                out.push_str(&format!(
                    "| {} | {} | {} {} | {} | {} |\n",
                    line.line.line_no,
                    escape_cell(&line.medicine_name),
                    line.line.qty,
                    escape_cell(&line.unit),
                    line.line.unit_price,
                    line.line_total
                ));
            }
            out.push('\n');
        }

        out.push_str(&format!("**ค่าบริการ:** {} บาท  \n", visit.service_fee));
        out.push_str(&format!("**รวมทั้งสิ้น:** {} บาท\n\n", visit.total_cost));

        out.push_str("---\n\n");
        out.push_str(&format!(
            "ลงชื่อ ........................................ ผู้ป่วย  \n({})\n\n",
            escape_inline(&patient.full_name())
        ));
        out.push_str(&format!(
            "ลงชื่อ ........................................ ผู้ตรวจ  \n({})\n",
            escape_inline(&visit.examiner)
        ));

        NonEmptyText::new(out).map_err(ClinicError::from)
    }

    /// One label per dispensed line, in line order.
    pub fn medicine_labels(&self, detail: &VisitDetail) -> Vec<MedicineLabel> {
        let date = detail.visit.created_at.date_naive();
        detail
            .lines
            .iter()
            .map(|line| MedicineLabel {
                patient_name: detail.patient.full_name(),
                hn: detail.patient.hn.clone(),
                date,
                medicine_name: line.medicine_name.clone(),
                qty: line.line.qty,
                unit: line.unit.clone(),
                instruction: line.instruction.clone(),
            })
            .collect()
    }

    /// Renders the label sheet as a self-contained HTML document.
    pub fn label_sheet(&self, detail: &VisitDetail) -> String {
        let (w, h) = LABEL_SIZE_CM;
        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n");
        out.push_str(&format!("@page {{ size: {}cm {}cm; margin: 0; }}\n", w, h));
        out.push_str(&format!(
            ".label {{ width: {}cm; height: {}cm; box-sizing: border-box; padding: 0.3cm; \
             page-break-after: always; font-size: 10pt; }}\n",
            w, h
        ));
        out.push_str(".label:last-child { page-break-after: auto; }\n");
        out.push_str("</style>\n</head>\n<body>\n");
        for label in self.medicine_labels(detail) {
            out.push_str("<div class=\"label\">\n");
            out.push_str(&format!(
                "<div><strong>{}</strong></div>\n",
                escape_html(self.clinic_name.as_str())
            ));
            out.push_str(&format!(
                "<div>{} ({})</div>\n",
                escape_html(&label.patient_name),
                escape_html(&label.hn)
            ));
            out.push_str(&format!("<div>วันที่ {}</div>\n", label.date.format("%d/%m/%Y")));
            out.push_str(&format!(
                "<div><strong>{}</strong> จำนวน {} {}</div>\n",
                escape_html(&label.medicine_name),
                label.qty,
                escape_html(&label.unit)
            ));
            out.push_str(&format!("<div>{}</div>\n", escape_html(&label.instruction)));
            out.push_str("</div>\n");
        }
        out.push_str("</body>\n</html>\n");
        out
    }
}

fn vitals_rows(v: &Vitals) -> [(&'static str, String); 6] {
    fn num(value: Option<f64>, unit: &str) -> String {
        value.map_or_else(|| "-".to_string(), |x| format!("{:.1} {}", x, unit))
    }
    fn int(value: Option<u32>, unit: &str) -> String {
        value.map_or_else(|| "-".to_string(), |x| format!("{} {}", x, unit))
    }
    let bp = match (v.bp_systolic, v.bp_diastolic) {
        (Some(s), Some(d)) => format!("{}/{} mmHg", s, d),
        _ => "-".to_string(),
    };
    [
        ("อุณหภูมิ", num(v.temperature, "°C")),
        ("ชีพจร", int(v.pulse, "/min")),
        ("อัตราการหายใจ", int(v.resp_rate, "/min")),
        ("ความดันโลหิต", bp),
        ("น้ำหนัก / ส่วนสูง", format!("{} / {}", num(v.weight, "kg"), num(v.height, "cm"))),
        (
            "BMI",
            v.bmi.map_or_else(|| "-".to_string(), |b| format!("{:.2}", b)),
        ),
    ]
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "ใช่"
    } else {
        "ไม่"
    }
}

fn or_dash(text: &str) -> String {
    if text.trim().is_empty() {
        "-".to_string()
    } else {
        escape_inline(text)
    }
}

/// Escapes a leading `#` on each line and flattens newlines into `<br>`.
fn escape_inline(text: &str) -> String {
    text.trim()
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                line.replacen('#', r"\#", 1)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("<br>")
}

fn escape_cell(text: &str) -> String {
    escape_inline(text).replace('|', r"\|")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{Address, StoredAddress};
    use crate::patient::{Gender, Patient};
    use crate::repositories::visits::DispensedLine;
    use crate::visit::{ClinicalNotes, PrescriptionLine, Triage, Visit};
    use chrono::{TimeZone, Utc};
    use clinic_types::Money;
    use clinic_uuid::{CommitToken, RecordId};

    fn detail() -> VisitDetail {
        let created_at = Utc.with_ymd_and_hms(2026, 3, 5, 2, 30, 0).unwrap();
        let patient = Patient {
            id: RecordId::new(),
            hn: "HN000007".into(),
            national_id: "1234567890123".into(),
            prefix: "นาย".into(),
            first_name: "สมชาย".into(),
            last_name: "ใจดี".into(),
            birthdate: NaiveDate::from_ymd_opt(1990, 6, 1).unwrap(),
            gender: Gender::Male,
            phone: String::new(),
            address: Some(StoredAddress::Structured(Address {
                house_no: "12/3".into(),
                moo: Some("4".into()),
                tambon: "สุเทพ".into(),
                amphoe: "เมือง".into(),
                province: "เชียงใหม่".into(),
                zip: Some("50200".into()),
            })),
            underlying_disease: "ไม่มี".into(),
            drug_allergy: "Penicillin".into(),
            treatment_right: "บัตรทอง".into(),
            notes: String::new(),
            notes_revision: 0,
            created_at,
        };
        let visit = Visit {
            id: RecordId::new(),
            patient_id: patient.id,
            vitals: Vitals {
                temperature: Some(37.8),
                weight: Some(60.0),
                height: Some(160.0),
                bmi: Some(23.44),
                ..Default::default()
            },
            triage: Triage::default(),
            notes: ClinicalNotes {
                cc: "# fever | cough".into(),
                pe: String::new(),
                diagnosis: "ไข้หวัด".into(),
                diagnosis_code: Some("J00".into()),
            },
            examiner: "Dr. Somying".into(),
            service_fee: Money::from_baht(50),
            total_cost: Money::from_baht(80),
            commit_token: CommitToken::new(),
            created_at,
        };
        let line = |no: u32, name: &str, qty: u32, price: i64| DispensedLine {
            line: PrescriptionLine {
                id: RecordId::new(),
                visit_id: visit.id,
                medicine_id: RecordId::new(),
                line_no: no,
                qty,
                unit_price: Money::from_baht(price),
                created_at,
            },
            medicine_name: name.into(),
            unit: "เม็ด".into(),
            instruction: "หลังอาหาร <เช้า>".into(),
            line_total: Money::from_baht(price * i64::from(qty)),
        };
        VisitDetail {
            lines: vec![line(1, "Paracetamol", 2, 5), line(2, "Amoxicillin", 1, 20)],
            visit,
            patient,
        }
    }

    fn service() -> DocumentService {
        DocumentService::new(NonEmptyText::new("คลินิกหมอใจดี").unwrap())
    }

    #[test]
    fn test_visit_report_contains_patient_and_totals() {
        let report = service().visit_report(&detail()).expect("report should render");
        let text = report.as_str();
        assert!(text.starts_with("# คลินิกหมอใจดี"));
        assert!(text.contains("| HN | HN000007 |"));
        assert!(text.contains("| อายุ | 35 ปี |"));
        assert!(text.contains("บ้านเลขที่ 12/3 หมู่ 4 ต.สุเทพ อ.เมือง จ.เชียงใหม่ 50200"));
        assert!(text.contains("| 1 | Paracetamol | 2 เม็ด | 5.00 | 10.00 |"));
        assert!(text.contains("**รวมทั้งสิ้น:** 80.00 บาท"));
        assert!(text.contains("**Diagnosis:** ไข้หวัด (J00)"));
        assert!(text.contains("(Dr. Somying)"));
    }

    #[test]
    fn test_visit_report_renders_missing_vitals_as_dash_and_escapes_text() {
        let text = service().visit_report(&detail()).unwrap().into_string();
        assert!(text.contains("| ชีพจร | - |"));
        assert!(text.contains("| ความดันโลหิต | - |"));
        assert!(text.contains("| อุณหภูมิ | 37.8 °C |"));
        assert!(text.contains(r"**CC:** \# fever | cough"));
        assert!(text.contains("**PE:** -"));
    }

    #[test]
    fn test_label_sheet_has_one_label_per_line() {
        let detail = detail();
        let labels = service().medicine_labels(&detail);
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[1].medicine_name, "Amoxicillin");
        assert_eq!(labels[0].hn, "HN000007");

        let html = service().label_sheet(&detail);
        assert_eq!(html.matches("<div class=\"label\">").count(), 2);
        assert!(html.contains("@page { size: 8cm 5cm; margin: 0; }"));
        assert!(html.contains("หลังอาหาร &lt;เช้า&gt;"));
        assert!(html.contains("วันที่ 05/03/2026"));
    }
}
