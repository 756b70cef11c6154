use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{ArticleRecord, RecordId};

/// The narrow store capability the pipeline holds. Backends serialize
/// their own writes, but link uniqueness is NOT enforced here: dedup is
/// the caller's exists-then-insert, which is not atomic across tasks.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// True if any stored record carries this link.
    async fn exists(&self, link: &str) -> Result<bool>;

    async fn insert_one(&self, record: &ArticleRecord) -> Result<RecordId>;

    /// Inserts in order and returns the assigned ids. Empty input is a
    /// no-op returning an empty vec.
    async fn insert_batch(&self, records: &[ArticleRecord]) -> Result<Vec<RecordId>>;

    /// Records whose headline is still flagged truncated.
    async fn find_truncated(&self) -> Result<Vec<ArticleRecord>>;

    async fn find_all(&self) -> Result<Vec<ArticleRecord>>;

    /// Links of every stored record; records without one are skipped.
    async fn find_links(&self) -> Result<Vec<String>>;

    /// Records inserted at or after `cutoff`.
    async fn find_inserted_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<ArticleRecord>>;

    /// Sets the headline and clears the truncated flag in one operation.
    async fn update_headline(&self, id: &RecordId, headline: &str) -> Result<()>;
}
