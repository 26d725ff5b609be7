//! Control number derivation, formatting, and parsing.
//!
//! A control number is the public, printed identifier on an issued
//! certificate: `CODE-YYYY-MM-NNNN` (e.g. `COR-2024-03-0007`). The non-sequence
//! portion (`COR-2024-03-`) is the prefix; all certificates of one type issued
//! in one month share it. Uniqueness is enforced at the full control-number
//! level, so two type names deriving the same code is acceptable.

use crate::foundation::{IssuanceError, CONTROL_NUMBER_SEPARATOR, FALLBACK_TYPE_CODE, SEQUENCE_PAD_WIDTH};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Short uppercase code derived from a certificate type name.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TypeCode(String);

impl TypeCode {
    /// Derive a code from a display name: the uppercased first letter of every
    /// whitespace-separated word ("Certificate of Residency" -> "COR").
    ///
    /// Words whose first character is not an ASCII letter contribute nothing,
    /// keeping the wire format `[A-Z]+` intact. A name that yields no letters
    /// falls back to [`TypeCode::fallback`].
    pub fn derive(name: &str) -> Self {
        let code: String = name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .filter(|ch| ch.is_ascii_alphabetic())
            .map(|ch| ch.to_ascii_uppercase())
            .collect();
        if code.is_empty() {
            Self::fallback()
        } else {
            Self(code)
        }
    }

    /// The explicit fallback code (`CERT`) used when a type is missing or its
    /// name yields no code.
    pub fn fallback() -> Self {
        Self(FALLBACK_TYPE_CODE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The non-sequence portion of a control number: type code + year + month.
///
/// Displays with the trailing separator (`COR-2024-03-`), matching the stored
/// counter key and the `LIKE 'COR-2024-03-%'` shape of the legacy schema.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct Prefix {
    code: TypeCode,
    year: i32,
    month: u32,
}

impl Prefix {
    pub fn new(code: TypeCode, year: i32, month: u32) -> Result<Self, IssuanceError> {
        if !(1..=12).contains(&month) {
            return Err(IssuanceError::ControlNumberMalformed {
                value: format!("{code}-{year:04}-{month:02}-"),
                reason: format!("month {month} out of range"),
            });
        }
        Ok(Self { code, year, month })
    }

    /// Prefix for a certificate of the given type issued on the given date.
    pub fn for_issue_date(code: TypeCode, issue_date: NaiveDate) -> Self {
        // NaiveDate months are always 1..=12.
        Self { code, year: issue_date.year(), month: issue_date.month() }
    }

    pub fn code(&self) -> &TypeCode {
        &self.code
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = CONTROL_NUMBER_SEPARATOR;
        write!(f, "{}{sep}{:04}{sep}{:02}{sep}", self.code, self.year, self.month)
    }
}

/// A fully allocated control number.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ControlNumber {
    prefix: Prefix,
    sequence: u32,
}

impl ControlNumber {
    pub fn new(prefix: Prefix, sequence: u32) -> Result<Self, IssuanceError> {
        if sequence == 0 {
            return Err(IssuanceError::ControlNumberMalformed {
                value: format!("{prefix}0000"),
                reason: "sequence must be >= 1".to_string(),
            });
        }
        Ok(Self { prefix, sequence })
    }

    pub fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl fmt::Display for ControlNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Width 4 is a floor: the 10000th issuance in a month renders as
        // `-10000`, never truncated.
        write!(f, "{}{:0width$}", self.prefix, self.sequence, width = SEQUENCE_PAD_WIDTH)
    }
}

impl FromStr for ControlNumber {
    type Err = IssuanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| IssuanceError::ControlNumberMalformed { value: s.to_string(), reason: reason.to_string() };

        let mut parts = s.split(CONTROL_NUMBER_SEPARATOR);
        let code = parts.next().filter(|p| !p.is_empty()).ok_or_else(|| malformed("missing type code"))?;
        let year = parts.next().ok_or_else(|| malformed("missing year"))?;
        let month = parts.next().ok_or_else(|| malformed("missing month"))?;
        let sequence = parts.next().ok_or_else(|| malformed("missing sequence"))?;
        if parts.next().is_some() {
            return Err(malformed("too many components"));
        }

        if !code.chars().all(|ch| ch.is_ascii_uppercase()) {
            return Err(malformed("type code must be uppercase ASCII letters"));
        }
        if year.len() != 4 || !year.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(malformed("year must be 4 digits"));
        }
        if month.len() != 2 || !month.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(malformed("month must be 2 digits"));
        }
        if sequence.len() < SEQUENCE_PAD_WIDTH || !sequence.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(malformed("sequence must be at least 4 digits"));
        }

        let year: i32 = year.parse().map_err(|_| malformed("year out of range"))?;
        let month: u32 = month.parse().map_err(|_| malformed("month out of range"))?;
        let sequence: u32 = sequence.parse().map_err(|_| malformed("sequence out of range"))?;

        let prefix = Prefix::new(TypeCode(code.to_string()), year, month)
            .map_err(|_| malformed("month out of range"))?;
        ControlNumber::new(prefix, sequence).map_err(|_| malformed("sequence must be >= 1"))
    }
}

impl Serialize for ControlNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ControlNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
