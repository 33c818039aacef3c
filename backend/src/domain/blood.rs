//! ABO/Rh blood groups.
//!
//! The wire representation (`"A+"`, `"AB-"`, ...) is shared by the JSON API,
//! the database text columns, and the notification templates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Blood group with Rh factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

/// Error returned when parsing an unknown blood group label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown blood type: {value}")]
pub struct BloodTypeParseError {
    value: String,
}

impl BloodTypeParseError {
    /// The rejected input.
    pub fn value(&self) -> &str {
        self.value.as_str()
    }
}

impl BloodType {
    /// Every blood group in presentation order.
    pub const ALL: [BloodType; 8] = [
        BloodType::APositive,
        BloodType::ANegative,
        BloodType::BPositive,
        BloodType::BNegative,
        BloodType::AbPositive,
        BloodType::AbNegative,
        BloodType::OPositive,
        BloodType::ONegative,
    ];

    /// Wire label for the blood group.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::APositive => "A+",
            Self::ANegative => "A-",
            Self::BPositive => "B+",
            Self::BNegative => "B-",
            Self::AbPositive => "AB+",
            Self::AbNegative => "AB-",
            Self::OPositive => "O+",
            Self::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodType {
    type Err = BloodTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| BloodTypeParseError {
                value: s.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("A+", BloodType::APositive)]
    #[case("ab-", BloodType::AbNegative)]
    #[case(" O- ", BloodType::ONegative)]
    fn parses_wire_labels(#[case] raw: &str, #[case] expected: BloodType) {
        assert_eq!(raw.parse::<BloodType>().expect("known label"), expected);
    }

    #[rstest]
    #[case("C+")]
    #[case("")]
    #[case("A")]
    fn rejects_unknown_labels(#[case] raw: &str) {
        let err = raw.parse::<BloodType>().expect_err("unknown label");
        assert_eq!(err.value(), raw);
    }

    #[rstest]
    fn serde_uses_wire_labels() {
        let json = serde_json::to_string(&BloodType::AbPositive).expect("serialise");
        assert_eq!(json, "\"AB+\"");
        let parsed: BloodType = serde_json::from_str("\"O-\"").expect("deserialise");
        assert_eq!(parsed, BloodType::ONegative);
    }

    #[rstest]
    fn all_lists_each_group_once() {
        let mut labels: Vec<_> = BloodType::ALL.iter().map(|t| t.as_str()).collect();
        labels.dedup();
        assert_eq!(labels.len(), 8);
    }
}
