use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use nw_core::storage::ArticleStore;
use nw_core::types::{ArticleRecord, RecordId};
use nw_core::{Error, Result};

struct StoredRecord {
    record: ArticleRecord,
    inserted_at: DateTime<Utc>,
}

/// In-memory store. Writes are serialized by the lock; link uniqueness is
/// not enforced, dedup stays the caller's exists-then-insert.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn push_record(records: &mut Vec<StoredRecord>, record: &ArticleRecord) -> RecordId {
    let id = RecordId::new(Uuid::new_v4().to_string());
    let mut record = record.clone();
    record.id = Some(id.clone());
    records.push(StoredRecord {
        record,
        inserted_at: Utc::now(),
    });
    id
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn exists(&self, link: &str) -> Result<bool> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .any(|s| s.record.link.as_deref() == Some(link)))
    }

    async fn insert_one(&self, record: &ArticleRecord) -> Result<RecordId> {
        let mut records = self.records.write().await;
        Ok(push_record(&mut records, record))
    }

    async fn insert_batch(&self, batch: &[ArticleRecord]) -> Result<Vec<RecordId>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        // one lock acquisition: the batch lands as a unit
        let mut records = self.records.write().await;
        Ok(batch.iter().map(|r| push_record(&mut records, r)).collect())
    }

    async fn find_truncated(&self) -> Result<Vec<ArticleRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|s| s.record.truncated)
            .map(|s| s.record.clone())
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<ArticleRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().map(|s| s.record.clone()).collect())
    }

    async fn find_links(&self) -> Result<Vec<String>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter_map(|s| s.record.link.clone())
            .collect())
    }

    async fn find_inserted_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<ArticleRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|s| s.inserted_at >= cutoff)
            .map(|s| s.record.clone())
            .collect())
    }

    async fn update_headline(&self, id: &RecordId, headline: &str) -> Result<()> {
        let mut records = self.records.write().await;
        let stored = records
            .iter_mut()
            .find(|s| s.record.id.as_ref() == Some(id))
            .ok_or_else(|| Error::Storage(format!("no record with id {id}")))?;
        stored.record.headline = Some(headline.to_string());
        stored.record.truncated = false;
        Ok(())
    }
}
