use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::language::Language;

/// Opaque store-assigned identifier. String-backed so that uuid-keyed and
/// rowid-keyed backends fit behind the same type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One discovered news item. Created by the search result extractor,
/// persisted once, and later mutated in place by the headline backfill.
/// Extraction misses leave fields `None` instead of dropping the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Assigned by the store on insert; `None` before insertion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Day the search window was set to, serialized `YYYY-MM-DD`.
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    /// Natural dedup key when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Set iff the extracted headline ended in an ellipsis; cleared exactly
    /// when the headline is replaced by a resolved value.
    #[serde(default, skip_serializing_if = "is_false")]
    pub truncated: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// One search against the provider: free text, a single day, a language.
/// Ephemeral, never persisted.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    pub date: NaiveDate,
    pub language: Language,
}
