//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::constants::{
    DEFAULT_CLINIC_NAME, DEFAULT_DATA_DIR, DEFAULT_EXAMINER, DEFAULT_SESSION_TTL_MINUTES,
    LOW_STOCK_THRESHOLD, MAX_SESSION_TTL_MINUTES, PIN_LEN, SNAPSHOT_FILENAME,
};
use crate::{ClinicError, ClinicResult, NonEmptyText};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    staff_pin_sha256: String,
    session_ttl: chrono::Duration,
    low_stock_threshold: u32,
    default_examiner: NonEmptyText,
    clinic_name: NonEmptyText,
    diagnosis_codes_file: Option<PathBuf>,
}

impl CoreConfig {
    /// Create a new `CoreConfig` with default thresholds.
    ///
    /// `staff_pin_sha256` is the lowercase hex SHA-256 digest of the 6-digit staff PIN.
    pub fn new(
        data_dir: PathBuf,
        staff_pin_sha256: impl Into<String>,
        default_examiner: NonEmptyText,
    ) -> ClinicResult<Self> {
        let staff_pin_sha256 = staff_pin_sha256.into().trim().to_lowercase();
        let valid_digest = staff_pin_sha256.len() == 64
            && staff_pin_sha256
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if !valid_digest {
            return Err(ClinicError::InvalidInput(
                "staff PIN digest must be 64 hex characters (SHA-256)".into(),
            ));
        }

        Ok(Self {
            data_dir,
            staff_pin_sha256,
            session_ttl: chrono::Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
            low_stock_threshold: LOW_STOCK_THRESHOLD,
            default_examiner,
            clinic_name: NonEmptyText::new(DEFAULT_CLINIC_NAME)?,
            diagnosis_codes_file: None,
        })
    }

    /// Sets the session lifetime, between 1 minute and [`MAX_SESSION_TTL_MINUTES`].
    pub fn with_session_ttl_minutes(mut self, minutes: i64) -> ClinicResult<Self> {
        if !(1..=MAX_SESSION_TTL_MINUTES).contains(&minutes) {
            return Err(ClinicError::InvalidInput(format!(
                "session TTL must be between 1 and {} minutes",
                MAX_SESSION_TTL_MINUTES
            )));
        }
        self.session_ttl = chrono::Duration::try_minutes(minutes).ok_or_else(|| {
            ClinicError::InvalidInput("session TTL is out of range".into())
        })?;
        Ok(self)
    }

    pub fn with_low_stock_threshold(mut self, threshold: u32) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    pub fn with_clinic_name(mut self, name: NonEmptyText) -> Self {
        self.clinic_name = name;
        self
    }

    pub fn with_diagnosis_codes_file(mut self, path: Option<PathBuf>) -> Self {
        self.diagnosis_codes_file = path;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILENAME)
    }

    pub fn staff_pin_sha256(&self) -> &str {
        &self.staff_pin_sha256
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        self.session_ttl
    }

    pub fn low_stock_threshold(&self) -> u32 {
        self.low_stock_threshold
    }

    pub fn default_examiner(&self) -> &NonEmptyText {
        &self.default_examiner
    }

    pub fn clinic_name(&self) -> &NonEmptyText {
        &self.clinic_name
    }

    pub fn diagnosis_codes_file(&self) -> Option<&Path> {
        self.diagnosis_codes_file.as_deref()
    }
}

/// Hex SHA-256 digest of a PIN, the form stored in configuration.
pub fn hash_pin(pin: &str) -> String {
    hex::encode(Sha256::digest(pin.as_bytes()))
}

/// Validate the shape of a staff PIN (exactly six ASCII digits).
pub fn validate_pin_format(pin: &str) -> ClinicResult<()> {
    if pin.len() == PIN_LEN && pin.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ClinicError::InvalidInput(format!(
            "PIN must be exactly {} digits",
            PIN_LEN
        )))
    }
}

/// Parse an optional numeric environment value, falling back to `default` when unset or blank.
pub fn parse_env_value<T: std::str::FromStr>(
    name: &str,
    value: Option<String>,
    default: T,
) -> ClinicResult<T> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    match value {
        Some(v) => v
            .parse::<T>()
            .map_err(|_| ClinicError::InvalidInput(format!("{} has an invalid value: {}", name, v))),
        None => Ok(default),
    }
}

/// Environment variable names read once by the binaries at startup.
pub mod env_keys {
    pub const DATA_DIR: &str = "CLINIC_DATA_DIR";
    pub const REST_ADDR: &str = "CLINIC_REST_ADDR";
    pub const STAFF_PIN_SHA256: &str = "CLINIC_STAFF_PIN_SHA256";
    pub const SESSION_TTL_MINUTES: &str = "CLINIC_SESSION_TTL_MINUTES";
    pub const LOW_STOCK_THRESHOLD: &str = "CLINIC_LOW_STOCK_THRESHOLD";
    pub const DEFAULT_EXAMINER: &str = "CLINIC_DEFAULT_EXAMINER";
    pub const DIAGNOSIS_CODES_FILE: &str = "CLINIC_DIAGNOSIS_CODES_FILE";
    pub const CLINIC_NAME: &str = "CLINIC_NAME";
}

/// Builds a [`CoreConfig`] from `lookup`, which maps a variable name to its value.
///
/// Binaries pass `|k| std::env::var(k).ok()`; tests pass a map. Only the staff PIN digest is
/// required.
pub fn config_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ClinicResult<CoreConfig> {
    let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let data_dir = non_blank(env_keys::DATA_DIR).unwrap_or_else(|| DEFAULT_DATA_DIR.into());
    let digest = non_blank(env_keys::STAFF_PIN_SHA256).ok_or_else(|| {
        ClinicError::InvalidInput(format!("{} must be set", env_keys::STAFF_PIN_SHA256))
    })?;
    let examiner = NonEmptyText::new(
        non_blank(env_keys::DEFAULT_EXAMINER).unwrap_or_else(|| DEFAULT_EXAMINER.into()),
    )?;

    let mut cfg = CoreConfig::new(PathBuf::from(data_dir.trim()), digest, examiner)?
        .with_session_ttl_minutes(parse_env_value(
            env_keys::SESSION_TTL_MINUTES,
            lookup(env_keys::SESSION_TTL_MINUTES),
            DEFAULT_SESSION_TTL_MINUTES,
        )?)?
        .with_low_stock_threshold(parse_env_value(
            env_keys::LOW_STOCK_THRESHOLD,
            lookup(env_keys::LOW_STOCK_THRESHOLD),
            LOW_STOCK_THRESHOLD,
        )?)
        .with_diagnosis_codes_file(
            non_blank(env_keys::DIAGNOSIS_CODES_FILE).map(|p| PathBuf::from(p.trim())),
        );
    if let Some(name) = non_blank(env_keys::CLINIC_NAME) {
        cfg = cfg.with_clinic_name(NonEmptyText::new(name)?);
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn examiner() -> NonEmptyText {
        NonEmptyText::new("Dr. Test").unwrap()
    }

    #[test]
    fn new_rejects_malformed_digest() {
        let err = CoreConfig::new(PathBuf::from("/tmp"), "abc", examiner())
            .expect_err("short digest should be rejected");
        assert!(matches!(err, ClinicError::InvalidInput(_)));
    }

    #[test]
    fn new_normalises_digest_case() {
        let digest = hash_pin("123456").to_uppercase();
        let cfg = CoreConfig::new(PathBuf::from("/tmp"), digest, examiner()).unwrap();
        assert_eq!(cfg.staff_pin_sha256(), hash_pin("123456"));
        assert_eq!(cfg.low_stock_threshold(), LOW_STOCK_THRESHOLD);
        assert_eq!(cfg.snapshot_path(), PathBuf::from("/tmp").join(SNAPSHOT_FILENAME));
    }

    #[test]
    fn session_ttl_must_be_within_bounds() {
        let cfg = CoreConfig::new(PathBuf::from("/tmp"), hash_pin("123456"), examiner()).unwrap();
        assert!(cfg.clone().with_session_ttl_minutes(0).is_err());
        assert!(cfg
            .clone()
            .with_session_ttl_minutes(MAX_SESSION_TTL_MINUTES + 1)
            .is_err());
        assert!(cfg
            .clone()
            .with_session_ttl_minutes(200_000_000_000)
            .is_err());
        assert!(cfg
            .clone()
            .with_session_ttl_minutes(MAX_SESSION_TTL_MINUTES)
            .is_ok());
        let cfg = cfg.with_session_ttl_minutes(30).unwrap();
        assert_eq!(cfg.session_ttl(), chrono::Duration::minutes(30));
    }

    #[test]
    fn pin_format() {
        assert!(validate_pin_format("123456").is_ok());
        assert!(validate_pin_format("12345").is_err());
        assert!(validate_pin_format("12345a").is_err());
    }

    #[test]
    fn config_from_lookup_applies_defaults_and_overrides() {
        use std::collections::HashMap;

        let mut vars: HashMap<&str, String> = HashMap::new();
        assert!(config_from_lookup(|k| vars.get(k).cloned()).is_err());

        vars.insert(env_keys::STAFF_PIN_SHA256, hash_pin("123456"));
        let cfg = config_from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(cfg.data_dir(), Path::new(DEFAULT_DATA_DIR));
        assert_eq!(cfg.default_examiner().as_str(), DEFAULT_EXAMINER);
        assert_eq!(cfg.low_stock_threshold(), LOW_STOCK_THRESHOLD);
        assert!(cfg.diagnosis_codes_file().is_none());

        vars.insert(env_keys::LOW_STOCK_THRESHOLD, "5".into());
        vars.insert(env_keys::CLINIC_NAME, "คลินิกหมอใจดี".into());
        vars.insert(env_keys::DIAGNOSIS_CODES_FILE, "/etc/clinic/icd10.yaml".into());
        let cfg = config_from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(cfg.low_stock_threshold(), 5);
        assert_eq!(cfg.clinic_name().as_str(), "คลินิกหมอใจดี");
        assert_eq!(
            cfg.diagnosis_codes_file(),
            Some(Path::new("/etc/clinic/icd10.yaml"))
        );

        vars.insert(env_keys::SESSION_TTL_MINUTES, "-1".into());
        assert!(config_from_lookup(|k| vars.get(k).cloned()).is_err());
    }

    #[test]
    fn parse_env_value_defaults_and_errors() {
        assert_eq!(parse_env_value("X", None, 7u32).unwrap(), 7);
        assert_eq!(parse_env_value("X", Some("  ".into()), 7u32).unwrap(), 7);
        assert_eq!(parse_env_value("X", Some("12".into()), 7u32).unwrap(), 12);
        assert!(parse_env_value("X", Some("nope".into()), 7u32).is_err());
    }
}
