//! Credit categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The closed set of loan products LoanScout searches over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanType {
    Housing,
    Vehicle,
    Personal,
}

impl LoanType {
    pub const ALL: [LoanType; 3] = [LoanType::Housing, LoanType::Vehicle, LoanType::Personal];

    /// Machine tag, as used in prompts and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Housing => "housing",
            Self::Vehicle => "vehicle",
            Self::Personal => "personal",
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Housing => "Konut Kredisi",
            Self::Vehicle => "Taşıt Kredisi",
            Self::Personal => "İhtiyaç Kredisi",
        }
    }

    /// Words that identify this type in free text, already folded with
    /// [`fold_keyword`].
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Housing => &["housing", "konut", "ev", "evi", "home", "house", "mortgage"],
            Self::Vehicle => &[
                "vehicle", "tasit", "arac", "araba", "otomobil", "oto", "car", "auto",
            ],
            Self::Personal => &[
                "personal", "ihtiyac", "kisisel", "tuketici", "consumer", "cash", "nakit",
            ],
        }
    }

    /// Matches a single word (already folded) against every type's keywords.
    pub fn from_keyword(word: &str) -> Option<LoanType> {
        Self::ALL
            .into_iter()
            .find(|t| t.keywords().iter().any(|k| *k == word))
    }
}

impl FromStr for LoanType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded = fold_keyword(s);
        let first = folded.split_whitespace().next().unwrap_or_default();
        LoanType::from_keyword(first).ok_or_else(|| ValidationError::UnknownLoanType(s.to_string()))
    }
}

impl fmt::Display for LoanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lowercases with Turkish casing rules and strips Turkish diacritics, so that
/// "İhtiyaç", "IHTIYAC" and "ihtiyaç" all fold to "ihtiyac".
pub fn fold_keyword(s: &str) -> String {
    s.chars()
        .flat_map(|c| match c {
            'İ' | 'I' | 'ı' => Some('i'),
            'Ç' | 'ç' => Some('c'),
            'Ğ' | 'ğ' => Some('g'),
            'Ö' | 'ö' => Some('o'),
            'Ş' | 'ş' => Some('s'),
            'Ü' | 'ü' => Some('u'),
            '\u{0307}' => None,
            other => Some(other),
        })
        .flat_map(char::to_lowercase)
        .collect()
}
