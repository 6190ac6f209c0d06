//! Patient address representation and formatting.
//!
//! Older records hold the address as a single free-text line; current records hold the
//! structured form. Both deserialize into [`StoredAddress`]. Writes only accept [`Address`].

use serde::{Deserialize, Serialize};

/// Structured Thai postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub house_no: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moo: Option<String>,
    pub tambon: String,
    pub amphoe: String,
    pub province: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
}

/// Address as found in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredAddress {
    Structured(Address),
    Legacy(String),
}

impl From<Address> for StoredAddress {
    fn from(address: Address) -> Self {
        StoredAddress::Structured(address)
    }
}

impl Address {
    /// Trims every field and drops optional fields that are blank.
    pub fn normalised(self) -> Self {
        fn opt(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }
        Self {
            house_no: self.house_no.trim().to_string(),
            moo: opt(self.moo),
            tambon: self.tambon.trim().to_string(),
            amphoe: self.amphoe.trim().to_string(),
            province: self.province.trim().to_string(),
            zip: opt(self.zip),
        }
    }

    /// Formats as `บ้านเลขที่ {house} หมู่ {moo} ต.{tambon} อ.{amphoe} จ.{province} {zip}`,
    /// leaving out every segment whose field is blank.
    pub fn format(&self) -> String {
        fn seg(prefix: &str, value: Option<&str>) -> Option<String> {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| format!("{}{}", prefix, v))
        }

        [
            seg("บ้านเลขที่ ", Some(&self.house_no)),
            seg("หมู่ ", self.moo.as_deref()),
            seg("ต.", Some(&self.tambon)),
            seg("อ.", Some(&self.amphoe)),
            seg("จ.", Some(&self.province)),
            seg("", self.zip.as_deref()),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Formats a stored address for display; legacy strings are returned as-is and a missing
/// address renders as `-`.
pub fn format_address(address: Option<&StoredAddress>) -> String {
    match address {
        None => "-".to_string(),
        Some(StoredAddress::Legacy(text)) if text.trim().is_empty() => "-".to_string(),
        Some(StoredAddress::Legacy(text)) => text.clone(),
        Some(StoredAddress::Structured(address)) => {
            let formatted = address.format();
            if formatted.is_empty() {
                "-".to_string()
            } else {
                formatted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> Address {
        Address {
            house_no: "123/4".into(),
            moo: Some("5".into()),
            tambon: "Matoom".into(),
            amphoe: "Prompiram".into(),
            province: "Phitsanulok".into(),
            zip: Some("65180".into()),
        }
    }

    #[test]
    fn formats_all_fields_in_fixed_order() {
        assert_eq!(
            full().format(),
            "บ้านเลขที่ 123/4 หมู่ 5 ต.Matoom อ.Prompiram จ.Phitsanulok 65180"
        );
    }

    #[test]
    fn omits_missing_segments_without_double_spaces() {
        let address = Address {
            house_no: "123".into(),
            province: "Bangkok".into(),
            ..Default::default()
        };
        assert_eq!(address.format(), "บ้านเลขที่ 123 จ.Bangkok");
    }

    #[test]
    fn legacy_and_missing_addresses() {
        assert_eq!(format_address(None), "-");
        let legacy = StoredAddress::Legacy("123 Test Road".into());
        assert_eq!(format_address(Some(&legacy)), "123 Test Road");
        let empty = StoredAddress::Structured(Address::default());
        assert_eq!(format_address(Some(&empty)), "-");
    }

    #[test]
    fn stored_address_reads_both_shapes() {
        let legacy: StoredAddress = serde_json::from_str("\"12 Moo 3\"").unwrap();
        assert_eq!(legacy, StoredAddress::Legacy("12 Moo 3".into()));

        let structured: StoredAddress = serde_json::from_str(
            r#"{"house_no":"1","tambon":"t","amphoe":"a","province":"p"}"#,
        )
        .unwrap();
        assert!(matches!(structured, StoredAddress::Structured(_)));
    }

    #[test]
    fn normalised_drops_blank_optionals() {
        let address = Address {
            moo: Some("  ".into()),
            zip: Some(" 65180 ".into()),
            ..full()
        }
        .normalised();
        assert_eq!(address.moo, None);
        assert_eq!(address.zip.as_deref(), Some("65180"));
    }
}
