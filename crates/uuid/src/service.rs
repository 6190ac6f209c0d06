//! Internal implementation of record identifiers.

use crate::{UuidError, UuidResult};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// The clinic's canonical record identifier (32 lowercase hex characters, no hyphens).
///
/// Once constructed, the contained UUID is in canonical form, so string conversions are
/// stable and safe to use as storage keys.
///
/// # Construction
/// - [`RecordId::new`] generates a new canonical identifier (for new records).
/// - [`RecordId::parse`] validates an externally supplied identifier.
///
/// # Errors
/// [`RecordId::parse`] returns [`UuidError::InvalidInput`] if the input is not already
/// canonical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(Uuid);

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordId {
    /// Generates a new identifier in canonical form (RFC 4122 version 4).
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses an identifier that must already be in canonical form.
    ///
    /// This does **not** normalise other common UUID forms (for example, hyphenated or uppercase).
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "identifier must be 32 lowercase hex characters without hyphens, got: '{}'",
                input
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(e.to_string()))
    }

    /// Returns the inner `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if `input` is in canonical form.
    ///
    /// This is a purely syntactic check: exactly 32 bytes, only `0-9` and `a-f`.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for RecordId {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordId::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Idempotency token for a single visit commit attempt.
///
/// A draft is issued one token when it is created; resubmitting the same draft (double click,
/// retry after a network error) presents the same token, which the commit transaction rejects
/// as a duplicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CommitToken(RecordId);

impl Default for CommitToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CommitToken {
    pub fn new() -> Self {
        Self(RecordId::new())
    }

    pub fn parse(input: &str) -> UuidResult<Self> {
        RecordId::parse(input).map(Self)
    }
}

impl fmt::Display for CommitToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_generates_canonical_id() {
        let id = RecordId::new();
        let s = id.to_string();

        assert_eq!(s.len(), 32);
        assert!(RecordId::is_canonical(&s));
    }

    #[test]
    fn test_parse_valid_canonical_id() {
        let input = "550e8400e29b41d4a716446655440000";
        let id = RecordId::parse(input).expect("should parse canonical id");
        assert_eq!(id.to_string(), input);
    }

    #[test]
    fn test_parse_rejects_hyphenated_id() {
        let err = RecordId::parse("550e8400-e29b-41d4-a716-446655440000")
            .expect_err("hyphenated form should be rejected");
        assert!(matches!(err, UuidError::InvalidInput(_)));
    }

    #[test]
    fn test_parse_rejects_uppercase_id() {
        assert!(RecordId::parse("550E8400E29B41D4A716446655440000").is_err());
    }

    #[test]
    fn test_is_canonical_invalid() {
        assert!(!RecordId::is_canonical("550e8400e29b41d4a71644665544000"));
        assert!(!RecordId::is_canonical("550e8400e29b41d4a7164466554400000"));
        assert!(!RecordId::is_canonical("550e8400e29b41d4a716446655440zzz"));
        assert!(!RecordId::is_canonical(""));
    }

    #[test]
    fn test_from_str_round_trip() {
        let id = RecordId::new();
        let parsed: RecordId = id.to_string().parse().expect("should parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_hash_consistency() {
        let id = RecordId::new();
        let mut set = HashSet::new();
        set.insert(id);
        set.insert(id);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let id = RecordId::parse("00112233445566778899aabbccddeeff").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00112233445566778899aabbccddeeff\"");

        let bad = serde_json::from_str::<RecordId>("\"not-an-id\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_commit_tokens_are_distinct() {
        assert_ne!(CommitToken::new(), CommitToken::new());
    }
}
