//! Input validation utilities.
//!
//! Sanitisers mirror what the intake forms do on every keystroke; validators run before anything
//! is written.

use crate::constants::{NATIONAL_ID_LEN, PHONE_LEN};
use crate::{ClinicError, ClinicResult};

fn digits_truncated(input: &str, max: usize) -> String {
    input.chars().filter(char::is_ascii_digit).take(max).collect()
}

/// Strips non-digit characters and truncates at 13 characters.
pub fn sanitize_national_id(input: &str) -> String {
    digits_truncated(input, NATIONAL_ID_LEN)
}

/// Strips non-digit characters and truncates at 10 characters.
pub fn sanitize_phone(input: &str) -> String {
    digits_truncated(input, PHONE_LEN)
}

/// A national ID must be exactly 13 ASCII digits.
pub fn validate_national_id(id: &str) -> ClinicResult<()> {
    if id.len() == NATIONAL_ID_LEN && id.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ClinicError::InvalidNationalId)
    }
}

/// A phone number is optional; when present it must be exactly 10 ASCII digits.
pub fn validate_phone(phone: &str) -> ClinicResult<()> {
    if phone.is_empty() || (phone.len() == PHONE_LEN && phone.bytes().all(|b| b.is_ascii_digit()))
    {
        Ok(())
    } else {
        Err(ClinicError::InvalidPhone)
    }
}

/// Validates the shape of a diagnosis classification code such as `J00`, `M791` or `K29.7`.
///
/// A letter followed by 2 to 6 alphanumerics, with at most one dot after the third character.
pub fn validate_diagnosis_code(code: &str) -> ClinicResult<()> {
    let invalid = || ClinicError::InvalidInput(format!("invalid diagnosis code: '{}'", code));

    let mut chars = code.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {}
        _ => return Err(invalid()),
    }

    let rest: Vec<char> = chars.collect();
    let dots = rest.iter().filter(|c| **c == '.').count();
    let alnum = rest.iter().filter(|c| c.is_ascii_alphanumeric()).count();
    let dot_ok = match rest.iter().position(|c| *c == '.') {
        None => true,
        Some(pos) => dots == 1 && pos >= 2 && pos + 1 < rest.len(),
    };

    if (2..=6).contains(&alnum) && alnum + dots == rest.len() && dot_ok {
        Ok(())
    } else {
        Err(invalid())
    }
}

/// Rejects strings that contain only whitespace, returning the trimmed value.
pub fn required_text(field: &str, value: &str) -> ClinicResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClinicError::InvalidInput(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn national_id_strips_and_truncates() {
        assert_eq!(sanitize_national_id("1-2345-67890-12-3"), "1234567890123");
        assert_eq!(sanitize_national_id("12345678901234567"), "1234567890123");
        assert_eq!(sanitize_national_id("abc"), "");
    }

    #[test]
    fn phone_strips_and_truncates() {
        assert_eq!(sanitize_phone("081-234-5678"), "0812345678");
        assert_eq!(sanitize_phone("08123456789999"), "0812345678");
    }

    #[test]
    fn national_id_requires_thirteen_digits() {
        assert!(validate_national_id("1234567890123").is_ok());
        assert!(matches!(
            validate_national_id("123456789012"),
            Err(ClinicError::InvalidNationalId)
        ));
        assert!(validate_national_id("123456789012a").is_err());
    }

    #[test]
    fn phone_optional_but_ten_digits() {
        assert!(validate_phone("").is_ok());
        assert!(validate_phone("0812345678").is_ok());
        assert!(matches!(validate_phone("081234567"), Err(ClinicError::InvalidPhone)));
    }

    #[test]
    fn diagnosis_codes() {
        for ok in ["J00", "M791", "K29", "A09", "T141", "K29.7"] {
            assert!(validate_diagnosis_code(ok).is_ok(), "{} should be valid", ok);
        }
        for bad in ["", "j00", "J0", "00J", "J00.", "J.00", "J00..1", "J00 1"] {
            assert!(validate_diagnosis_code(bad).is_err(), "{} should be invalid", bad);
        }
    }

    #[test]
    fn required_text_trims() {
        assert_eq!(required_text("title", "  rent ").unwrap(), "rent");
        assert!(required_text("title", "   ").is_err());
    }
}
