//! Accounting period identifiers.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::CustodyError;

/// Canonical period format: four-digit year, dash, two-digit month 01-12.
pub const PERIOD_PATTERN: &str = r"^\d{4}-(0[1-9]|1[0-2])$";

static PERIOD_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(PERIOD_PATTERN).expect("Invalid regex pattern"));

/// Returns true if `value` is a canonical `YYYY-MM` period.
#[must_use]
pub fn is_valid_period(value: &str) -> bool {
    PERIOD_REGEX.is_match(value)
}

/// A calendar month used as an accounting boundary (`YYYY-MM`).
///
/// Can only be constructed from a canonical value, so ordering by the inner
/// string is chronological.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period(String);

impl Period {
    /// Parses a period, rejecting anything that is not canonical `YYYY-MM`.
    ///
    /// # Errors
    ///
    /// Returns `CustodyError::MissingField` for an empty value and
    /// `CustodyError::InvalidPeriod` for a malformed one.
    pub fn parse(value: &str) -> Result<Self, CustodyError> {
        if value.trim().is_empty() {
            return Err(CustodyError::MissingField("period"));
        }
        if !is_valid_period(value) {
            return Err(CustodyError::InvalidPeriod(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    /// Returns the period as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Period {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Period {
    type Err = CustodyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Period {
    type Error = CustodyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.0
    }
}
