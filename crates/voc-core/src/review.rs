//! Derived per-review categories: sentiment label and issue tag.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Scores at or above this are labelled [`SentimentLabel::Positive`].
pub const POSITIVE_THRESHOLD: f64 = 0.05;

/// Scores at or below this are labelled [`SentimentLabel::Negative`].
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

/// Discrete sentiment bucket derived from a compound score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Label a compound score with the fixed +/-0.05 thresholds.
    ///
    /// Total over `f64`: anything that is neither `>= 0.05` nor `<= -0.05`
    /// (including NaN) is `Neutral`.
    pub fn from_score(score: f64) -> Self {
        if score >= POSITIVE_THRESHOLD {
            Self::Positive
        } else if score <= NEGATIVE_THRESHOLD {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Positive" => Ok(Self::Positive),
            "Negative" => Ok(Self::Negative),
            "Neutral" => Ok(Self::Neutral),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// Coarse root-cause category assigned by keyword rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueTag {
    #[serde(rename = "Sizing Issue")]
    SizingIssue,
    #[serde(rename = "Quality Issue")]
    QualityIssue,
    #[serde(rename = "Supply Chain")]
    SupplyChain,
    Pricing,
    General,
}

impl IssueTag {
    /// All tags in rule precedence order, `General` last.
    pub const ALL: [IssueTag; 5] = [
        Self::SizingIssue,
        Self::QualityIssue,
        Self::SupplyChain,
        Self::Pricing,
        Self::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SizingIssue => "Sizing Issue",
            Self::QualityIssue => "Quality Issue",
            Self::SupplyChain => "Supply Chain",
            Self::Pricing => "Pricing",
            Self::General => "General",
        }
    }

    /// Position in [`IssueTag::ALL`].
    pub fn precedence(&self) -> usize {
        match self {
            Self::SizingIssue => 0,
            Self::QualityIssue => 1,
            Self::SupplyChain => 2,
            Self::Pricing => 3,
            Self::General => 4,
        }
    }
}

impl fmt::Display for IssueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueTag {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A label or tag string that is not one of the known categories.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0:?}")]
pub struct UnknownCategory(pub String);
