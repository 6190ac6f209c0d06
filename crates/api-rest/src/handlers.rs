//! Route handlers.
//!
//! Every handler except `health` and `login` requires a live session in the `x-session-token`
//! header; see [`Authed`].

use api_shared::dto::{
    DailyIncomeRes, DiagnosisCodeRes, ErrorRes, ExpenseReq, ExpenseRes, HealthRes, LabelsRes,
    LoginReq, LoginRes, MedicineReq, MedicineRes, MonthlySummaryRes, NotesReq, NotesRes,
    PatientReq, PatientRes, ReportRes, RestockReq, RestockRes, VisitReq, VisitRes,
};
use api_shared::HealthService;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::NaiveDate;
use clinic_core::expense::ExpenseForm;
use clinic_core::medicine::MedicineForm;
use clinic_core::patient::PatientForm;
use clinic_core::{ClinicError, NonEmptyText};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{parse_id, ApiResult, Authed};
use crate::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PatientListQuery {
    /// Substring filter over names, HN and national ID.
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PatientSearchQuery {
    /// At least 3 characters; prefix of a national ID or first name.
    pub term: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DiagnosisQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExpenseListQuery {
    /// `YYYY-MM`
    pub month: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DailyIncomeQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint, open to unauthenticated callers.
#[axum::debug_handler]
pub async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

// ----------------------------------------------------------------------------
// Sessions
// ----------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Session opened", body = LoginRes),
        (status = 400, description = "Malformed PIN", body = ErrorRes),
        (status = 401, description = "Wrong PIN", body = ErrorRes)
    )
)]
/// Exchanges the staff PIN for a session token.
///
/// The optional `operator` names whoever is at the keyboard; it becomes the default examiner on
/// visits recorded with this session.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> ApiResult<Json<LoginRes>> {
    let operator = req
        .operator
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(NonEmptyText::new)
        .transpose()
        .map_err(ClinicError::from)?;
    let session = state.clinic.auth().login(&req.pin, operator)?;
    Ok(Json(session.into()))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Session closed"),
        (status = 401, description = "No active session", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>, Authed(session): Authed) -> ApiResult<StatusCode> {
    state.clinic.auth().logout(&session)?;
    Ok(StatusCode::NO_CONTENT)
}

// ----------------------------------------------------------------------------
// Patients
// ----------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/patients",
    params(PatientListQuery),
    responses(
        (status = 200, description = "Newest 100 patients matching the filter", body = [PatientRes]),
        (status = 401, description = "No active session", body = ErrorRes)
    )
)]
/// Records list: newest first, at most 100 rows.
#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<AppState>,
    Authed(_session): Authed,
    Query(query): Query<PatientListQuery>,
) -> ApiResult<Json<Vec<PatientRes>>> {
    let patients = state.clinic.patients().list_recent(query.q.as_deref())?;
    Ok(Json(patients.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/patients/search",
    params(PatientSearchQuery),
    responses(
        (status = 200, description = "Up to 5 matches; empty for terms under 3 characters", body = [PatientRes]),
        (status = 401, description = "No active session", body = ErrorRes)
    )
)]
/// Quick search used by the front desk before starting a visit.
#[axum::debug_handler]
pub async fn search_patients(
    State(state): State<AppState>,
    Authed(_session): Authed,
    Query(query): Query<PatientSearchQuery>,
) -> ApiResult<Json<Vec<PatientRes>>> {
    let patients = state.clinic.patients().quick_search(&query.term)?;
    Ok(Json(patients.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = PatientReq,
    responses(
        (status = 201, description = "Patient registered", body = PatientRes),
        (status = 400, description = "Invalid form", body = ErrorRes),
        (status = 409, description = "National ID already registered", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<AppState>,
    Authed(session): Authed,
    Json(req): Json<PatientReq>,
) -> ApiResult<(StatusCode, Json<PatientRes>)> {
    let patient = state
        .clinic
        .patients()
        .register(&session, &PatientForm::from(req))?;
    Ok((StatusCode::CREATED, Json(patient.into())))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient identifier")),
    responses(
        (status = 200, description = "Patient", body = PatientRes),
        (status = 404, description = "Unknown patient", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<AppState>,
    Authed(_session): Authed,
    Path(id): Path<String>,
) -> ApiResult<Json<PatientRes>> {
    let patient = state.clinic.patients().get(&parse_id(&id)?)?;
    Ok(Json(patient.into()))
}

#[utoipa::path(
    put,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient identifier")),
    request_body = PatientReq,
    responses(
        (status = 200, description = "Patient updated", body = PatientRes),
        (status = 400, description = "Invalid form or changed national ID", body = ErrorRes),
        (status = 404, description = "Unknown patient", body = ErrorRes)
    )
)]
/// Replaces the patient's demographics. Omitting `address` keeps the stored one.
#[axum::debug_handler]
pub async fn update_patient(
    State(state): State<AppState>,
    Authed(session): Authed,
    Path(id): Path<String>,
    Json(req): Json<PatientReq>,
) -> ApiResult<Json<PatientRes>> {
    let patient =
        state
            .clinic
            .patients()
            .update(&session, &parse_id(&id)?, &PatientForm::from(req))?;
    Ok(Json(patient.into()))
}

#[utoipa::path(
    put,
    path = "/patients/{id}/notes",
    params(("id" = String, Path, description = "Patient identifier")),
    request_body = NotesReq,
    responses(
        (status = 200, description = "Notes saved", body = NotesRes),
        (status = 409, description = "A newer revision is already stored", body = ErrorRes)
    )
)]
/// Notes auto-save. Out-of-order writes are refused rather than applied.
#[axum::debug_handler]
pub async fn update_notes(
    State(state): State<AppState>,
    Authed(session): Authed,
    Path(id): Path<String>,
    Json(req): Json<NotesReq>,
) -> ApiResult<Json<NotesRes>> {
    let revision = state.clinic.patients().update_notes(
        &session,
        &parse_id(&id)?,
        &req.notes,
        req.revision,
    )?;
    Ok(Json(NotesRes { revision }))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/visits",
    params(("id" = String, Path, description = "Patient identifier")),
    responses(
        (status = 200, description = "Visits, newest first", body = [VisitRes]),
        (status = 404, description = "Unknown patient", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn patient_visits(
    State(state): State<AppState>,
    Authed(_session): Authed,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<VisitRes>>> {
    let history = state.clinic.patients().visit_history(&parse_id(&id)?)?;
    Ok(Json(history.into_iter().map(Into::into).collect()))
}

// ----------------------------------------------------------------------------
// Visits
// ----------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/visits",
    request_body = VisitReq,
    responses(
        (status = 201, description = "Visit committed", body = VisitRes),
        (status = 400, description = "Invalid vitals, notes or basket", body = ErrorRes),
        (status = 404, description = "Unknown patient or medicine", body = ErrorRes),
        (status = 409, description = "Insufficient stock or commit token already used", body = ErrorRes)
    )
)]
/// Records a complete visit in one transaction.
///
/// The body is run through the same wizard steps as an interactive visit, then committed:
/// the visit, its prescription lines and the stock decrements all land, or none of them do.
#[axum::debug_handler]
pub async fn create_visit(
    State(state): State<AppState>,
    Authed(session): Authed,
    Json(req): Json<VisitReq>,
) -> ApiResult<(StatusCode, Json<VisitRes>)> {
    let request = req.into_new_visit()?;
    let detail = state.clinic.visits().record(&session, &request)?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

#[utoipa::path(
    get,
    path = "/visits/{id}",
    params(("id" = String, Path, description = "Visit identifier")),
    responses(
        (status = 200, description = "Visit with dispensed lines", body = VisitRes),
        (status = 404, description = "Unknown visit", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn get_visit(
    State(state): State<AppState>,
    Authed(_session): Authed,
    Path(id): Path<String>,
) -> ApiResult<Json<VisitRes>> {
    let detail = state.clinic.visits().get(&parse_id(&id)?)?;
    Ok(Json(detail.into()))
}

#[utoipa::path(
    get,
    path = "/visits/{id}/report",
    params(("id" = String, Path, description = "Visit identifier")),
    responses(
        (status = 200, description = "Printable visit report as Markdown", body = ReportRes),
        (status = 404, description = "Unknown visit", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn visit_report(
    State(state): State<AppState>,
    Authed(_session): Authed,
    Path(id): Path<String>,
) -> ApiResult<Json<ReportRes>> {
    let detail = state.clinic.visits().get(&parse_id(&id)?)?;
    let markdown = state.clinic.documents().visit_report(&detail)?;
    Ok(Json(ReportRes {
        visit_id: detail.visit.id.to_string(),
        markdown: markdown.into_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/visits/{id}/labels",
    params(("id" = String, Path, description = "Visit identifier")),
    responses(
        (status = 200, description = "One label per dispensed medicine", body = LabelsRes),
        (status = 404, description = "Unknown visit", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn visit_labels(
    State(state): State<AppState>,
    Authed(_session): Authed,
    Path(id): Path<String>,
) -> ApiResult<Json<LabelsRes>> {
    let detail = state.clinic.visits().get(&parse_id(&id)?)?;
    let documents = state.clinic.documents();
    Ok(Json(LabelsRes {
        labels: documents
            .medicine_labels(&detail)
            .into_iter()
            .map(Into::into)
            .collect(),
        html: documents.label_sheet(&detail),
    }))
}

// ----------------------------------------------------------------------------
// Medicines
// ----------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/medicines",
    responses(
        (status = 200, description = "Catalog ordered by name", body = [MedicineRes])
    )
)]
#[axum::debug_handler]
pub async fn list_medicines(
    State(state): State<AppState>,
    Authed(_session): Authed,
) -> ApiResult<Json<Vec<MedicineRes>>> {
    let medicines = state.clinic.stock().list()?;
    Ok(Json(medicines.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/medicines",
    request_body = MedicineReq,
    responses(
        (status = 201, description = "Medicine added", body = MedicineRes),
        (status = 400, description = "Invalid form", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn create_medicine(
    State(state): State<AppState>,
    Authed(session): Authed,
    Json(req): Json<MedicineReq>,
) -> ApiResult<(StatusCode, Json<MedicineRes>)> {
    let medicine = state
        .clinic
        .stock()
        .create(&session, &MedicineForm::from(req))?;
    Ok((StatusCode::CREATED, Json(medicine.into())))
}

#[utoipa::path(
    put,
    path = "/medicines/{id}",
    params(("id" = String, Path, description = "Medicine identifier")),
    request_body = MedicineReq,
    responses(
        (status = 200, description = "Medicine updated", body = MedicineRes),
        (status = 404, description = "Unknown medicine", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn update_medicine(
    State(state): State<AppState>,
    Authed(session): Authed,
    Path(id): Path<String>,
    Json(req): Json<MedicineReq>,
) -> ApiResult<Json<MedicineRes>> {
    let medicine =
        state
            .clinic
            .stock()
            .update(&session, &parse_id(&id)?, &MedicineForm::from(req))?;
    Ok(Json(medicine.into()))
}

#[utoipa::path(
    delete,
    path = "/medicines/{id}",
    params(("id" = String, Path, description = "Medicine identifier")),
    responses(
        (status = 204, description = "Medicine removed"),
        (status = 404, description = "Unknown medicine", body = ErrorRes),
        (status = 409, description = "Medicine appears on prescriptions", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn delete_medicine(
    State(state): State<AppState>,
    Authed(session): Authed,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.clinic.stock().delete(&session, &parse_id(&id)?)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/medicines/{id}/restock",
    params(("id" = String, Path, description = "Medicine identifier")),
    request_body = RestockReq,
    responses(
        (status = 200, description = "New stock level", body = RestockRes),
        (status = 400, description = "Quantity not positive", body = ErrorRes),
        (status = 404, description = "Unknown medicine", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn restock_medicine(
    State(state): State<AppState>,
    Authed(session): Authed,
    Path(id): Path<String>,
    Json(req): Json<RestockReq>,
) -> ApiResult<Json<RestockRes>> {
    let id = parse_id(&id)?;
    let stock_qty = state.clinic.stock().restock(&session, &id, req.qty)?;
    Ok(Json(RestockRes {
        id: id.to_string(),
        stock_qty,
    }))
}

#[utoipa::path(
    get,
    path = "/medicines/low-stock",
    responses(
        (status = 200, description = "Medicines below the threshold, lowest first", body = [MedicineRes])
    )
)]
#[axum::debug_handler]
pub async fn low_stock(
    State(state): State<AppState>,
    Authed(_session): Authed,
) -> ApiResult<Json<Vec<MedicineRes>>> {
    let medicines = state.clinic.stock().low_stock_alerts()?;
    Ok(Json(medicines.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/diagnosis-codes",
    params(DiagnosisQuery),
    responses(
        (status = 200, description = "Matching diagnosis codes", body = [DiagnosisCodeRes])
    )
)]
#[axum::debug_handler]
pub async fn diagnosis_codes(
    State(state): State<AppState>,
    Authed(_session): Authed,
    Query(query): Query<DiagnosisQuery>,
) -> ApiResult<Json<Vec<DiagnosisCodeRes>>> {
    let codes = state.clinic.search_diagnosis_codes(&query.q)?;
    Ok(Json(codes.into_iter().map(Into::into).collect()))
}

// ----------------------------------------------------------------------------
// Accounting
// ----------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/expenses",
    params(ExpenseListQuery),
    responses(
        (status = 200, description = "Expenses, newest first", body = [ExpenseRes]),
        (status = 400, description = "Malformed month", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn list_expenses(
    State(state): State<AppState>,
    Authed(_session): Authed,
    Query(query): Query<ExpenseListQuery>,
) -> ApiResult<Json<Vec<ExpenseRes>>> {
    let expenses = state
        .clinic
        .accounting()
        .list_expenses(query.month.as_deref())?;
    Ok(Json(expenses.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/expenses",
    request_body = ExpenseReq,
    responses(
        (status = 201, description = "Expense recorded", body = ExpenseRes),
        (status = 400, description = "Invalid form", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn create_expense(
    State(state): State<AppState>,
    Authed(session): Authed,
    Json(req): Json<ExpenseReq>,
) -> ApiResult<(StatusCode, Json<ExpenseRes>)> {
    let expense = state
        .clinic
        .accounting()
        .add_expense(&session, &ExpenseForm::from(req))?;
    Ok((StatusCode::CREATED, Json(expense.into())))
}

#[utoipa::path(
    delete,
    path = "/expenses/{id}",
    params(("id" = String, Path, description = "Expense identifier")),
    responses(
        (status = 204, description = "Expense removed"),
        (status = 404, description = "Unknown expense", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn delete_expense(
    State(state): State<AppState>,
    Authed(session): Authed,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .clinic
        .accounting()
        .delete_expense(&session, &parse_id(&id)?)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/accounting/{month}",
    params(("month" = String, Path, description = "Month as YYYY-MM")),
    responses(
        (status = 200, description = "Income, expenses and margin for the month", body = MonthlySummaryRes),
        (status = 400, description = "Malformed month", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn monthly_summary(
    State(state): State<AppState>,
    Authed(_session): Authed,
    Path(month): Path<String>,
) -> ApiResult<Json<MonthlySummaryRes>> {
    let summary = state.clinic.accounting().monthly_summary(&month)?;
    Ok(Json(summary.into()))
}

#[utoipa::path(
    get,
    path = "/accounting/daily",
    params(DailyIncomeQuery),
    responses(
        (status = 200, description = "Income per day, including days without visits", body = [DailyIncomeRes]),
        (status = 400, description = "Inverted or over-long range", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn daily_income(
    State(state): State<AppState>,
    Authed(_session): Authed,
    Query(query): Query<DailyIncomeQuery>,
) -> ApiResult<Json<Vec<DailyIncomeRes>>> {
    let days = state
        .clinic
        .accounting()
        .daily_income(query.from, query.to)?;
    Ok(Json(days.into_iter().map(Into::into).collect()))
}
