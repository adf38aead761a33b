//! Field-by-field checks for Italian postal addresses.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::provinces::PROVINCES;

/// Street designations an address may start with
pub const STREET_TYPES: &[&str] = &[
    "PIAZZA",
    "VIA",
    "CORSO",
    "VIALE",
    "VICOLO",
    "LARGO",
    "LUNGOMARE",
];

const MIN_STREET_LEN: usize = 5;
const MIN_CITY_LEN: usize = 4;

/// One address row: `[id_code, street, postal_code, city, province]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub id_code: String,
    pub street: String,
    /// Kept as text so leading zeros survive
    pub postal_code: String,
    pub city: String,
    pub province: String,
}

impl AddressRecord {
    /// Build from raw fields; anything but exactly five is a format issue
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Result<Self, AddressIssue> {
        match fields {
            [id_code, street, postal_code, city, province] => Ok(Self {
                id_code: id_code.as_ref().trim().to_string(),
                street: street.as_ref().trim().to_string(),
                postal_code: postal_code.as_ref().trim().to_string(),
                city: city.as_ref().trim().to_string(),
                province: province.as_ref().trim().to_string(),
            }),
            _ => Err(AddressIssue::FieldCount(fields.len())),
        }
    }
}

/// Part of the record an issue refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressField {
    Format,
    Id,
    Street,
    PostalCode,
    City,
    Province,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressIssue {
    #[error("Address data must contain exactly 5 elements, got {0}")]
    FieldCount(usize),

    #[error("Invalid ID format: {0}. Should be 10 alphanumeric characters.")]
    InvalidId(String),

    #[error("Invalid street type in address: {0}")]
    InvalidStreetType(String),

    #[error("Missing street number in address: {0}")]
    MissingStreetNumber(String),

    #[error("Multiple consecutive spaces found in address: {0}")]
    ConsecutiveSpaces(String),

    #[error("Street address too short: {0}")]
    StreetTooShort(String),

    #[error("Invalid postal code length for {city}: {code}. Should be 5 digits.")]
    PostalCodeLength { code: String, city: String },

    #[error("Postal code contains non-numeric characters: {0}")]
    PostalCodeNotNumeric(String),

    #[error("Postal code missing leading zeros: {0}")]
    PostalCodeMissingLeadingZeros(String),

    #[error("City name too short: {0}")]
    CityTooShort(String),

    #[error("Invalid province code: {0}")]
    UnknownProvince(String),
}

/// Issues grouped by field; only fields with issues are present
pub type AddressReport = BTreeMap<AddressField, Vec<AddressIssue>>;

pub struct ItalianAddressValidator {
    id_regex: Regex,
    digit_regex: Regex,
    spaces_regex: Regex,
}

impl Default for ItalianAddressValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ItalianAddressValidator {
    pub fn new() -> Self {
        Self {
            id_regex: Regex::new(r"^[A-Z0-9]{10}$").expect("static pattern"),
            digit_regex: Regex::new(r"\d").expect("static pattern"),
            spaces_regex: Regex::new(r"\s{2,}").expect("static pattern"),
        }
    }

    pub fn validate_id(&self, id_code: &str) -> Vec<AddressIssue> {
        if self.id_regex.is_match(id_code) {
            Vec::new()
        } else {
            vec![AddressIssue::InvalidId(id_code.to_string())]
        }
    }

    pub fn validate_street(&self, street: &str) -> Vec<AddressIssue> {
        let mut issues = Vec::new();

        // Leading run of letters, so `VIA.ROMA` still reads as `VIA`
        let street_type = street.split(|c: char| !c.is_alphabetic()).next().unwrap_or("");
        if !STREET_TYPES.contains(&street_type) {
            issues.push(AddressIssue::InvalidStreetType(street.to_string()));
        }
        if !self.digit_regex.is_match(street) {
            issues.push(AddressIssue::MissingStreetNumber(street.to_string()));
        }
        if self.spaces_regex.is_match(street) {
            issues.push(AddressIssue::ConsecutiveSpaces(street.to_string()));
        }
        if street.chars().count() < MIN_STREET_LEN {
            issues.push(AddressIssue::StreetTooShort(street.to_string()));
        }

        issues
    }

    pub fn validate_postal_code(&self, postal_code: &str, city: &str) -> Vec<AddressIssue> {
        let mut issues = Vec::new();
        let numeric = !postal_code.is_empty() && postal_code.chars().all(|c| c.is_ascii_digit());
        let len = postal_code.chars().count();

        if len != 5 {
            issues.push(AddressIssue::PostalCodeLength {
                code: postal_code.to_string(),
                city: city.to_string(),
            });
        }
        if !numeric {
            issues.push(AddressIssue::PostalCodeNotNumeric(postal_code.to_string()));
        } else if len < 5 {
            // Codes read as integers lose their leading zeros (e.g. 00031 -> 31)
            issues.push(AddressIssue::PostalCodeMissingLeadingZeros(
                postal_code.to_string(),
            ));
        }

        issues
    }

    pub fn validate_city(&self, city: &str) -> Vec<AddressIssue> {
        if city.chars().count() < MIN_CITY_LEN {
            vec![AddressIssue::CityTooShort(city.to_string())]
        } else {
            Vec::new()
        }
    }

    pub fn validate_province(&self, province: &str) -> Vec<AddressIssue> {
        if PROVINCES.iter().any(|(code, _)| *code == province) {
            Vec::new()
        } else {
            vec![AddressIssue::UnknownProvince(province.to_string())]
        }
    }

    /// Validate all components of an address
    pub fn validate(&self, record: &AddressRecord) -> AddressReport {
        let checks = [
            (AddressField::Id, self.validate_id(&record.id_code)),
            (AddressField::Street, self.validate_street(&record.street)),
            (
                AddressField::PostalCode,
                self.validate_postal_code(&record.postal_code, &record.city),
            ),
            (AddressField::City, self.validate_city(&record.city)),
            (AddressField::Province, self.validate_province(&record.province)),
        ];

        checks
            .into_iter()
            .filter(|(_, issues)| !issues.is_empty())
            .collect()
    }

    /// Validate one raw row, reporting a wrong field count as a format issue
    pub fn validate_fields<S: AsRef<str>>(&self, fields: &[S]) -> AddressReport {
        match AddressRecord::from_fields(fields) {
            Ok(record) => self.validate(&record),
            Err(issue) => BTreeMap::from([(AddressField::Format, vec![issue])]),
        }
    }

    /// Validate many rows; only rows with issues appear, keyed by position
    pub fn validate_all<I, R, S>(&self, rows: I) -> BTreeMap<usize, AddressReport>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        rows.into_iter()
            .enumerate()
            .filter_map(|(idx, row)| {
                let report = self.validate_fields(row.as_ref());
                (!report.is_empty()).then_some((idx, report))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> ItalianAddressValidator {
        ItalianAddressValidator::new()
    }

    #[test]
    fn test_valid_address() {
        let report = validator().validate_fields(&[
            "F0LC1F2J25",
            "PIAZZA VITTORIA 16",
            "88900",
            "CROTONE",
            "KR",
        ]);
        assert!(report.is_empty(), "unexpected issues: {:?}", report);
    }

    #[test]
    fn test_leading_zero_postal_code_is_valid() {
        let report =
            validator().validate_fields(&["ABCDE12345", "VIA DEL CORSO 1", "00186", "ROMA", "RM"]);
        assert!(report.is_empty(), "unexpected issues: {:?}", report);
    }

    #[test]
    fn test_truncated_postal_code() {
        let report = validator().validate_fields(&[
            "F1B41F39U1",
            "PIAZZA DEL FONTANILE 14",
            "31",
            "ARTENA",
            "RM",
        ]);
        assert_eq!(report.len(), 1);
        let issues = &report[&AddressField::PostalCode];
        assert!(matches!(issues[0], AddressIssue::PostalCodeLength { .. }));
        assert_eq!(
            issues[1],
            AddressIssue::PostalCodeMissingLeadingZeros("31".to_string())
        );
    }

    #[test]
    fn test_street_issues() {
        let issues = validator().validate_street("STRADA  MAESTRA");
        assert_eq!(
            issues,
            vec![
                AddressIssue::InvalidStreetType("STRADA  MAESTRA".to_string()),
                AddressIssue::MissingStreetNumber("STRADA  MAESTRA".to_string()),
                AddressIssue::ConsecutiveSpaces("STRADA  MAESTRA".to_string()),
            ]
        );
        // VIALE is its own street type, not a VIA prefix match
        assert!(validator().validate_street("VIALE EUROPA 3").is_empty());
        assert!(!validator().validate_street("VIAVAI 3").is_empty());
        assert!(validator().validate_street("VIA.ROMA 1").is_empty());
        assert!(validator().validate_street("CORSO,ITALIA 20").is_empty());
        assert_eq!(
            validator().validate_street("12 VIA ROMA"),
            vec![AddressIssue::InvalidStreetType("12 VIA ROMA".to_string())]
        );
    }

    #[test]
    fn test_invalid_id_and_province() {
        let report =
            validator().validate_fields(&["abc", "VIA ROMA 1", "20121", "MILANO", "XX"]);
        assert_eq!(
            report[&AddressField::Id],
            vec![AddressIssue::InvalidId("abc".to_string())]
        );
        assert_eq!(
            report[&AddressField::Province],
            vec![AddressIssue::UnknownProvince("XX".to_string())]
        );
        assert!(!report.contains_key(&AddressField::Street));
    }

    #[test]
    fn test_non_numeric_postal_code() {
        let issues = validator().validate_postal_code("2O121", "MILANO");
        assert_eq!(
            issues,
            vec![AddressIssue::PostalCodeNotNumeric("2O121".to_string())]
        );
    }

    #[test]
    fn test_field_count() {
        let report = validator().validate_fields(&["F0LC1F2J25", "PIAZZA VITTORIA 16"]);
        assert_eq!(
            report[&AddressField::Format],
            vec![AddressIssue::FieldCount(2)]
        );
    }

    #[test]
    fn test_validate_all_keeps_only_invalid_rows() {
        let rows = vec![
            vec!["F0LC1F2J25", "PIAZZA VITTORIA 16", "88900", "CROTONE", "KR"],
            vec!["F1B41F39U1", "PIAZZA DEL FONTANILE 14", "31", "ARTENA", "RM"],
            vec!["F1KJ7F3SBW", "PIAZZA FISAC 2", "22100", "COMO", "CO"],
        ];
        let results = validator().validate_all(&rows);
        assert_eq!(results.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_issue_messages() {
        assert_eq!(
            AddressIssue::PostalCodeLength {
                code: "31".to_string(),
                city: "ARTENA".to_string()
            }
            .to_string(),
            "Invalid postal code length for ARTENA: 31. Should be 5 digits."
        );
    }
}
