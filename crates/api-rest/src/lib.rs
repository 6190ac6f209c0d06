//! # API REST
//!
//! REST API for the clinic.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, session header, status codes)
//!
//! Uses `api-shared` for wire types and `clinic-core` for everything else.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod handlers;

use api_shared::dto;
use axum::routing::{get, post, put};
use axum::Router;
use clinic_core::Clinic;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use error::{ApiError, Authed};

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub clinic: Clinic,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::login,
        handlers::logout,
        handlers::list_patients,
        handlers::search_patients,
        handlers::create_patient,
        handlers::get_patient,
        handlers::update_patient,
        handlers::update_notes,
        handlers::patient_visits,
        handlers::create_visit,
        handlers::get_visit,
        handlers::visit_report,
        handlers::visit_labels,
        handlers::list_medicines,
        handlers::create_medicine,
        handlers::update_medicine,
        handlers::delete_medicine,
        handlers::restock_medicine,
        handlers::low_stock,
        handlers::diagnosis_codes,
        handlers::list_expenses,
        handlers::create_expense,
        handlers::delete_expense,
        handlers::monthly_summary,
        handlers::daily_income,
    ),
    components(schemas(
        dto::HealthRes,
        dto::ErrorRes,
        dto::LoginReq,
        dto::LoginRes,
        dto::GenderDto,
        dto::AddressDto,
        dto::PatientReq,
        dto::PatientRes,
        dto::NotesReq,
        dto::NotesRes,
        dto::VitalsDto,
        dto::TriageDto,
        dto::ClinicalNotesDto,
        dto::VisitItemReq,
        dto::VisitReq,
        dto::VisitLineRes,
        dto::VisitRes,
        dto::ReportRes,
        dto::LabelRes,
        dto::LabelsRes,
        dto::MedicineReq,
        dto::MedicineRes,
        dto::RestockReq,
        dto::RestockRes,
        dto::DiagnosisCodeRes,
        dto::ExpenseReq,
        dto::ExpenseRes,
        dto::MonthlySummaryRes,
        dto::DailyIncomeRes,
    ))
)]
pub struct ApiDoc;

/// Builds the full REST router, Swagger UI included.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .route(
            "/patients",
            get(handlers::list_patients).post(handlers::create_patient),
        )
        .route("/patients/search", get(handlers::search_patients))
        .route(
            "/patients/:id",
            get(handlers::get_patient).put(handlers::update_patient),
        )
        .route("/patients/:id/notes", put(handlers::update_notes))
        .route("/patients/:id/visits", get(handlers::patient_visits))
        .route("/visits", post(handlers::create_visit))
        .route("/visits/:id", get(handlers::get_visit))
        .route("/visits/:id/report", get(handlers::visit_report))
        .route("/visits/:id/labels", get(handlers::visit_labels))
        .route(
            "/medicines",
            get(handlers::list_medicines).post(handlers::create_medicine),
        )
        .route("/medicines/low-stock", get(handlers::low_stock))
        .route(
            "/medicines/:id",
            put(handlers::update_medicine).delete(handlers::delete_medicine),
        )
        .route("/medicines/:id/restock", post(handlers::restock_medicine))
        .route("/diagnosis-codes", get(handlers::diagnosis_codes))
        .route(
            "/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route(
            "/expenses/:id",
            axum::routing::delete(handlers::delete_expense),
        )
        .route("/accounting/daily", get(handlers::daily_income))
        .route("/accounting/:month", get(handlers::monthly_summary))
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
