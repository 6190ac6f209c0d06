use crate::wizard::WizardStep;
use clinic_types::Money;

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("national ID must be exactly 13 digits")]
    InvalidNationalId,
    #[error("phone number must be exactly 10 digits")]
    InvalidPhone,
    #[error("text error: {0}")]
    Text(#[from] clinic_types::TextError),
    #[error("identifier error: {0}")]
    Uuid(#[from] clinic_uuid::UuidError),
    #[error("wizard is at the {actual} step, expected {expected}")]
    WizardStep {
        expected: WizardStep,
        actual: WizardStep,
    },
    #[error("visit {0} is already recorded and cannot be committed again")]
    VisitReadOnly(String),

    #[error("patient not found: {0}")]
    PatientNotFound(String),
    #[error("visit not found: {0}")]
    VisitNotFound(String),
    #[error("medicine not found: {0}")]
    MedicineNotFound(String),
    #[error("expense not found: {0}")]
    ExpenseNotFound(String),

    #[error("a patient with national ID {0} is already registered")]
    DuplicateNationalId(String),
    #[error("commit already applied as visit {visit_id}")]
    DuplicateCommit { visit_id: String },
    #[error(
        "insufficient stock for {medicine_name}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        medicine_id: String,
        medicine_name: String,
        requested: u32,
        available: u32,
    },
    #[error("notes revision {attempted} is not newer than stored revision {current}")]
    StaleNotes { current: u64, attempted: u64 },
    #[error("medicine {0} is referenced by prescriptions and cannot be deleted")]
    MedicineInUse(String),
    #[error("amount overflow while computing {0}")]
    AmountOverflow(&'static str),

    #[error("invalid PIN")]
    InvalidCredentials,
    #[error("no active session")]
    Unauthenticated,
    #[error("session expired")]
    SessionExpired,

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to read data file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write data file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error("data store lock poisoned")]
    LockPoisoned,
}

impl ClinicError {
    /// True for the "record does not exist" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ClinicError::PatientNotFound(_)
                | ClinicError::VisitNotFound(_)
                | ClinicError::MedicineNotFound(_)
                | ClinicError::ExpenseNotFound(_)
        )
    }

    /// True for errors caused by the current state of the data rather than the request shape.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ClinicError::DuplicateNationalId(_)
                | ClinicError::DuplicateCommit { .. }
                | ClinicError::InsufficientStock { .. }
                | ClinicError::StaleNotes { .. }
                | ClinicError::MedicineInUse(_)
                | ClinicError::VisitReadOnly(_)
        )
    }

    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            ClinicError::InvalidCredentials
                | ClinicError::Unauthenticated
                | ClinicError::SessionExpired
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ClinicError::InvalidInput(_)
                | ClinicError::InvalidNationalId
                | ClinicError::InvalidPhone
                | ClinicError::Text(_)
                | ClinicError::Uuid(_)
                | ClinicError::WizardStep { .. }
                | ClinicError::AmountOverflow(_)
        )
    }
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;

pub(crate) fn overflow(what: &'static str) -> ClinicError {
    ClinicError::AmountOverflow(what)
}

pub(crate) fn checked_line_total(price: Money, qty: u32) -> ClinicResult<Money> {
    price.checked_times(qty).ok_or_else(|| overflow("line total"))
}
