use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::codes;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LanguagePreferenceError {
    #[error("at least one language must be configured")]
    Empty,

    #[error("unknown language code: {0}")]
    Unknown(String),

    #[error("language listed more than once: {0}")]
    Duplicate(String),
}

/// Ordered list of wanted subtitle languages, most preferred first.
///
/// Always non-empty, codes are normalized to ISO 639-1 and unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LanguageList", into = "Vec<String>")]
pub struct LanguagePreference(Vec<String>);

impl LanguagePreference {
    pub fn new<I, S>(codes: I) -> Result<Self, LanguagePreferenceError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for raw in codes {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                continue;
            }
            let code = codes::normalize(raw)
                .ok_or_else(|| LanguagePreferenceError::Unknown(raw.to_string()))?;
            if normalized.iter().any(|c| c == code) {
                return Err(LanguagePreferenceError::Duplicate(code.to_string()));
            }
            normalized.push(code.to_string());
        }

        if normalized.is_empty() {
            return Err(LanguagePreferenceError::Empty);
        }
        Ok(Self(normalized))
    }

    pub fn primary(&self) -> &str {
        &self.0[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        codes::normalize(code).is_some_and(|c| self.0.iter().any(|l| l == c))
    }
}

impl Default for LanguagePreference {
    fn default() -> Self {
        Self(vec!["en".to_string()])
    }
}

impl fmt::Display for LanguagePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}

impl From<LanguagePreference> for Vec<String> {
    fn from(pref: LanguagePreference) -> Self {
        pref.0
    }
}

/// Accepts both `languages = ["nl", "en"]` and the compact `"nl,en"` form
/// that environment overrides produce.
#[derive(Deserialize)]
#[serde(untagged)]
enum LanguageList {
    List(Vec<String>),
    Compact(String),
}

impl TryFrom<LanguageList> for LanguagePreference {
    type Error = LanguagePreferenceError;

    fn try_from(list: LanguageList) -> Result<Self, Self::Error> {
        match list {
            LanguageList::List(codes) => Self::new(codes),
            LanguageList::Compact(s) => Self::new(s.split(',')),
        }
    }
}
