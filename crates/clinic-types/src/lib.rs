/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// Returns `Err(TextError::Empty)` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing money amounts.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("invalid amount: '{0}'")]
    Invalid(String),
    #[error("amount out of range")]
    Overflow,
}

/// An amount of Thai baht held as integer satang (1/100 baht).
///
/// Serialises as the satang integer. Displays with two decimals (`80.00`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_satang(satang: i64) -> Self {
        Self(satang)
    }

    pub const fn from_baht(baht: i64) -> Self {
        Self(baht * 100)
    }

    pub const fn satang(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Price of `qty` units at this unit price.
    pub fn checked_times(self, qty: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(qty)).map(Money)
    }

    /// Parses a baht amount written with at most two decimals (`"12"`, `"12.5"`, `"12.50"`).
    pub fn parse_baht(input: &str) -> Result<Money, MoneyError> {
        let trimmed = input.trim();
        let invalid = || MoneyError::Invalid(input.to_string());

        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty()
            || frac.len() > 2
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| MoneyError::Overflow)?;
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac.parse::<i64>().map_err(|_| invalid())?,
        };
        let satang = whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(frac))
            .ok_or(MoneyError::Overflow)?;

        Ok(Money(if negative { -satang } else { satang }))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_and_rejects_blank() {
        assert_eq!(NonEmptyText::new("  Somchai ").unwrap().as_str(), "Somchai");
        assert!(matches!(NonEmptyText::new("   "), Err(TextError::Empty)));
    }

    #[test]
    fn money_displays_two_decimals() {
        assert_eq!(Money::from_baht(80).to_string(), "80.00");
        assert_eq!(Money::from_satang(1205).to_string(), "12.05");
        assert_eq!(Money::from_satang(-50).to_string(), "-0.50");
    }

    #[test]
    fn money_parses_baht_amounts() {
        assert_eq!(Money::parse_baht("12"), Ok(Money::from_satang(1200)));
        assert_eq!(Money::parse_baht("12.5"), Ok(Money::from_satang(1250)));
        assert_eq!(Money::parse_baht("0.05"), Ok(Money::from_satang(5)));
        assert!(Money::parse_baht("1.234").is_err());
        assert!(Money::parse_baht("abc").is_err());
        assert!(Money::parse_baht(".5").is_err());
    }

    #[test]
    fn money_arithmetic_is_checked() {
        let total = Money::from_baht(5)
            .checked_times(2)
            .and_then(|a| a.checked_add(Money::from_baht(20)))
            .unwrap();
        assert_eq!(total, Money::from_baht(30));
        assert_eq!(Money::from_satang(i64::MAX).checked_times(2), None);
        assert_eq!(Money::from_satang(i64::MAX).checked_add(Money::from_satang(1)), None);
        assert_eq!(Money::from_satang(i64::MIN).checked_sub(Money::from_satang(1)), None);
    }

    #[test]
    fn money_serialises_as_satang() {
        let json = serde_json::to_string(&Money::from_baht(5)).unwrap();
        assert_eq!(json, "500");
    }
}
