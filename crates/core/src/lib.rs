//! # Clinic Core
//!
//! Core business logic for a single-site outpatient clinic:
//! - Patient registry with quick search, edits and notes auto-save
//! - A four-step visit wizard whose result is committed in one atomic transaction
//! - Medicine catalog and stock ledger with low-stock alerts
//! - Expenses, monthly summaries and daily income
//! - Printable visit reports and medicine label sheets
//!
//! **No API concerns**: HTTP servers, request parsing and the command line belong in `api-rest`,
//! `api-shared` and `clinic-cli`.

pub mod address;
pub mod config;
pub mod constants;
pub mod diagnosis;
pub mod documents;
pub mod error;
pub mod expense;
pub mod medicine;
pub mod patient;
pub mod repositories;
pub mod session;
pub mod store;
pub mod validation;
pub mod visit;
pub mod wizard;

pub use clinic_types::{Money, NonEmptyText, TextError};
pub use clinic_uuid::{CommitToken, RecordId};
pub use config::CoreConfig;
pub use error::{ClinicError, ClinicResult};

use diagnosis::{load_codes_file, search_codes, DiagnosisCode};
use documents::DocumentService;
use repositories::accounting::AccountingService;
use repositories::patients::PatientService;
use repositories::stock::StockService;
use repositories::visits::VisitService;
use session::AuthService;
use std::sync::Arc;
use store::Database;

/// Entry point tying configuration, store and session registry together.
///
/// Cloning is cheap; every clone shares the same store and sessions.
#[derive(Clone, Debug)]
pub struct Clinic {
    cfg: Arc<CoreConfig>,
    db: Arc<Database>,
    auth: AuthService,
}

impl Clinic {
    /// Opens the snapshot under the configured data directory and loads the diagnosis table.
    pub fn open(cfg: Arc<CoreConfig>) -> ClinicResult<Self> {
        let db = Database::open_snapshot(&cfg.snapshot_path())?;
        if let Some(path) = cfg.diagnosis_codes_file() {
            db.set_diagnosis_codes(load_codes_file(path)?)?;
        }
        Ok(Self::with_database(cfg, Arc::new(db)))
    }

    pub fn with_database(cfg: Arc<CoreConfig>, db: Arc<Database>) -> Self {
        let auth = AuthService::new(Arc::clone(&cfg));
        Self { cfg, db, auth }
    }

    pub fn config(&self) -> &Arc<CoreConfig> {
        &self.cfg
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn patients(&self) -> PatientService {
        PatientService::new(Arc::clone(&self.cfg), Arc::clone(&self.db), self.auth.clone())
    }

    pub fn visits(&self) -> VisitService {
        VisitService::new(Arc::clone(&self.cfg), Arc::clone(&self.db), self.auth.clone())
    }

    pub fn stock(&self) -> StockService {
        StockService::new(Arc::clone(&self.cfg), Arc::clone(&self.db), self.auth.clone())
    }

    pub fn accounting(&self) -> AccountingService {
        AccountingService::new(Arc::clone(&self.db), self.auth.clone())
    }

    pub fn documents(&self) -> DocumentService {
        DocumentService::new(self.cfg.clinic_name().clone())
    }

    /// Diagnosis lookup for the diagnosis step.
    pub fn search_diagnosis_codes(&self, term: &str) -> ClinicResult<Vec<DiagnosisCode>> {
        let codes = self.db.diagnosis_codes()?;
        Ok(search_codes(codes.iter(), term))
    }
}
