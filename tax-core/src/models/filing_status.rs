use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FilingStatusCode {
    #[serde(rename = "S", alias = "single")]
    Single,
    #[serde(rename = "MFJ", alias = "married_filing_jointly")]
    MarriedFilingJointly,
    #[serde(rename = "MFS", alias = "married_filing_separately")]
    MarriedFilingSeparately,
    #[serde(rename = "HOH", alias = "head_of_household")]
    HeadOfHousehold,
    #[serde(rename = "QSS", alias = "qualifying_surviving_spouse")]
    QualifyingSurvivingSpouse,
}

impl FilingStatusCode {
    pub const ALL: [FilingStatusCode; 5] = [
        Self::Single,
        Self::MarriedFilingJointly,
        Self::MarriedFilingSeparately,
        Self::HeadOfHousehold,
        Self::QualifyingSurvivingSpouse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "S",
            Self::MarriedFilingJointly => "MFJ",
            Self::MarriedFilingSeparately => "MFS",
            Self::HeadOfHousehold => "HOH",
            Self::QualifyingSurvivingSpouse => "QSS",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Single => "Single",
            Self::MarriedFilingJointly => "Married Filing Jointly",
            Self::MarriedFilingSeparately => "Married Filing Separately",
            Self::HeadOfHousehold => "Head of Household",
            Self::QualifyingSurvivingSpouse => "Qualifying Surviving Spouse",
        }
    }

    /// Accepts the short codes (`MFJ`) as well as the long snake-case
    /// spellings (`married_filing_jointly`) used by older input files.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "S" | "single" => Some(Self::Single),
            "MFJ" | "married_filing_jointly" => Some(Self::MarriedFilingJointly),
            "MFS" | "married_filing_separately" => Some(Self::MarriedFilingSeparately),
            "HOH" | "head_of_household" => Some(Self::HeadOfHousehold),
            "QSS" | "qualifying_surviving_spouse" => Some(Self::QualifyingSurvivingSpouse),
            _ => None,
        }
    }

    pub fn is_married_filing_separately(&self) -> bool {
        matches!(self, Self::MarriedFilingSeparately)
    }
}

impl fmt::Display for FilingStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
