use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::debug;

use nw_core::storage::ArticleStore;
use nw_core::types::{ArticleRecord, RecordId};
use nw_core::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        publication TEXT,
        headline TEXT,
        link TEXT,
        truncated INTEGER NOT NULL DEFAULT 0,
        inserted_at TEXT NOT NULL
    )
    "#,
    // NOTE: link is deliberately not UNIQUE; dedup is the caller's
    // exists-then-insert.
];

/// SQLite-backed store. Rowids back the opaque record ids.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", path.display()))
            .await
            .map_err(|e| Error::Storage(format!("failed to open {}: {e}", path.display())))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("migration {i} failed: {e}")))?;
        }

        debug!(path = %path.display(), "opened sqlite article store");
        Ok(Self { pool })
    }
}

/// Fixed-width UTC timestamp so lexicographic comparison in SQL matches
/// chronological order.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_record(row: &SqliteRow) -> Result<ArticleRecord> {
    let date: String = row.get("date");
    let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
        .map_err(|e| Error::Storage(format!("malformed stored date {date:?}: {e}")))?;

    Ok(ArticleRecord {
        id: Some(RecordId::new(row.get::<i64, _>("id").to_string())),
        date,
        publication: row.get("publication"),
        headline: row.get("headline"),
        link: row.get("link"),
        truncated: row.get::<i64, _>("truncated") != 0,
    })
}

fn parse_id(id: &RecordId) -> Result<i64> {
    id.as_str()
        .parse::<i64>()
        .map_err(|_| Error::Storage(format!("not a sqlite record id: {id}")))
}

#[async_trait]
impl ArticleStore for SqliteStore {
    async fn exists(&self, link: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM articles WHERE link = ? LIMIT 1")
            .bind(link)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("exists query failed: {e}")))?;
        Ok(row.is_some())
    }

    async fn insert_one(&self, record: &ArticleRecord) -> Result<RecordId> {
        let result = sqlx::query(
            r#"
            INSERT INTO articles (date, publication, headline, link, truncated, inserted_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.date.format(DATE_FORMAT).to_string())
        .bind(record.publication.as_deref())
        .bind(record.headline.as_deref())
        .bind(record.link.as_deref())
        .bind(record.truncated as i64)
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("insert failed: {e}")))?;

        Ok(RecordId::new(result.last_insert_rowid().to_string()))
    }

    async fn insert_batch(&self, records: &[ArticleRecord]) -> Result<Vec<RecordId>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            ids.push(self.insert_one(record).await?);
        }
        Ok(ids)
    }

    async fn find_truncated(&self) -> Result<Vec<ArticleRecord>> {
        let rows = sqlx::query("SELECT * FROM articles WHERE truncated != 0 ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("truncated query failed: {e}")))?;
        rows.iter().map(row_to_record).collect()
    }

    async fn find_all(&self) -> Result<Vec<ArticleRecord>> {
        let rows = sqlx::query("SELECT * FROM articles ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("find_all query failed: {e}")))?;
        rows.iter().map(row_to_record).collect()
    }

    async fn find_links(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT link FROM articles WHERE link IS NOT NULL ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("links query failed: {e}")))?;
        Ok(rows.iter().map(|row| row.get("link")).collect())
    }

    async fn find_inserted_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<ArticleRecord>> {
        let rows = sqlx::query("SELECT * FROM articles WHERE inserted_at >= ? ORDER BY id")
            .bind(timestamp(cutoff))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("inserted_since query failed: {e}")))?;
        rows.iter().map(row_to_record).collect()
    }

    async fn update_headline(&self, id: &RecordId, headline: &str) -> Result<()> {
        let result = sqlx::query("UPDATE articles SET headline = ?, truncated = 0 WHERE id = ?")
            .bind(headline)
            .bind(parse_id(id)?)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("update failed: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(Error::Storage(format!("no record with id {id}")));
        }
        Ok(())
    }
}
