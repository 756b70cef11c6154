use std::str::FromStr;

use crate::error::{Error, Result};

/// Languages the search provider can be queried in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Chinese,
}

impl Language {
    /// Canonical short code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Chinese => "zh",
        }
    }

    /// Value the provider's `lr` query parameter expects.
    pub fn query_value(&self) -> &'static str {
        match self {
            Language::English => "lang_en",
            Language::Chinese => "lang_zh-CN",
        }
    }
}

impl FromStr for Language {
    type Err = Error;

    /// Case-insensitive; accepts the short code or the full name. Anything
    /// else is a hard error, raised before any network activity.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "zh" | "chinese" => Ok(Language::Chinese),
            other => Err(Error::UnknownLanguage(other.to_string())),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
