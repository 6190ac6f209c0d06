//! Constants used throughout the clinic core crate.

/// Default directory for clinic data when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "clinic_data";

/// Filename of the database snapshot inside the data directory.
pub const SNAPSHOT_FILENAME: &str = "clinic.yaml";

/// Medicines with stock strictly below this are surfaced as low-stock alerts.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

/// Quick search needs at least this many characters before it queries.
pub const SEARCH_MIN_CHARS: usize = 3;

/// Maximum number of quick-search results.
pub const SEARCH_RESULT_LIMIT: usize = 5;

/// Maximum number of patients in the records list.
pub const RECORDS_LIST_LIMIT: usize = 100;

/// Diagnosis-code search needs at least this many characters.
pub const DIAGNOSIS_SEARCH_MIN_CHARS: usize = 2;

/// Maximum number of diagnosis-code search results.
pub const DIAGNOSIS_SEARCH_LIMIT: usize = 10;

/// National ID length (Thai citizen ID).
pub const NATIONAL_ID_LEN: usize = 13;

/// Phone number length.
pub const PHONE_LEN: usize = 10;

/// Staff PIN length.
pub const PIN_LEN: usize = 6;

/// Default session lifetime in minutes.
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 12 * 60;

/// Longest session lifetime accepted from configuration (one week).
pub const MAX_SESSION_TTL_MINUTES: i64 = 7 * 24 * 60;

/// Placeholder stored when allergy or underlying disease is left blank.
pub const NONE_TEXT: &str = "ไม่มี";

/// Default treatment-right category.
pub const DEFAULT_TREATMENT_RIGHT: &str = "บัตรทอง";

/// Default urgency for a new visit.
pub const DEFAULT_URGENCY: &str = "ไม่ฉุกเฉิน";

/// Default expense category.
pub const DEFAULT_EXPENSE_CATEGORY: &str = "ค่าใช้จ่ายทั่วไป";

/// Prefix of clinic-assigned patient numbers.
pub const HN_PREFIX: &str = "HN";

/// Default clinic name printed on documents.
pub const DEFAULT_CLINIC_NAME: &str = "คลินิก";

/// Examiner name used when none is configured.
pub const DEFAULT_EXAMINER: &str = "แพทย์ประจำคลินิก";

/// Default listen address for the REST server.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";
