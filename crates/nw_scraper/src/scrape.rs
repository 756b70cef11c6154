use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use nw_core::types::{ArticleRecord, SearchQuery};
use nw_core::{ArticleStore, HeadlinePicker, Language, PageFetcher, Result};

use crate::headline::resolve_headline;
use crate::search::{create_search_url, extract_search_results};

/// Two-phase scrape pipeline: concurrent per-day discovery against the
/// search provider, then a sequential backfill pass that revisits stored
/// records whose headline was cut off.
///
/// Dedup is exists-then-insert and not atomic: with more than one worker,
/// two days that surface the same link can both pass the existence check
/// before either inserts. Accepted limitation, inherited by design.
pub struct NewsScraper {
    store: Arc<dyn ArticleStore>,
    search: Arc<dyn PageFetcher>,
    content: Arc<dyn PageFetcher>,
    picker: Option<Arc<dyn HeadlinePicker>>,
    workers: usize,
}

impl NewsScraper {
    /// `search` fetches provider result pages; `content` fetches article
    /// pages and is expected to carry its own fallback tier.
    pub fn new(
        store: Arc<dyn ArticleStore>,
        search: Arc<dyn PageFetcher>,
        content: Arc<dyn PageFetcher>,
    ) -> Self {
        Self {
            store,
            search,
            content,
            picker: None,
            workers: 1,
        }
    }

    /// Picker consulted when an article page offers more than one
    /// candidate headline. Without one, ambiguous pages stay unresolved.
    pub fn with_picker(mut self, picker: Arc<dyn HeadlinePicker>) -> Self {
        self.picker = Some(picker);
        self
    }

    /// Bound on concurrent per-day discovery tasks. 1 means sequential.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Runs discovery over `(date_start, date_end]`, one task per day,
    /// then the headline backfill pass. All discovery tasks complete
    /// before backfill begins.
    pub async fn scrape_news(
        &self,
        query: &str,
        date_start: NaiveDate,
        date_end: NaiveDate,
        language: Language,
    ) -> Result<()> {
        self.discover(query, date_start, date_end, language).await?;
        self.backfill_headlines().await
    }

    async fn discover(
        &self,
        query: &str,
        date_start: NaiveDate,
        date_end: NaiveDate,
        language: Language,
    ) -> Result<()> {
        let n_days = (date_end - date_start).num_days().max(0);
        let semaphore = Arc::new(Semaphore::new(self.workers));

        info!(
            query,
            %date_start,
            %date_end,
            days = n_days,
            workers = self.workers,
            "starting discovery"
        );

        let tasks: Vec<_> = (1..=n_days)
            .map(|offset| {
                let date = date_start + Duration::days(offset);
                let semaphore = semaphore.clone();
                async move {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|e| nw_core::Error::External(e.into()))?;
                    self.discover_on_date(query, date, language).await
                }
            })
            .collect();

        // Barrier: every day's task settles before backfill may start. A
        // failed day is logged and does not abort its siblings.
        let results = join_all(tasks).await;

        let mut failed = 0usize;
        for (i, result) in results.into_iter().enumerate() {
            if let Err(e) = result {
                let date = date_start + Duration::days(i as i64 + 1);
                warn!(%date, error = %e, "discovery failed for day");
                failed += 1;
            }
        }
        info!(days = n_days, failed, "discovery finished");

        Ok(())
    }

    /// One day's discovery: fetch the results page, extract candidates,
    /// drop links already stored, insert the rest as one batch.
    async fn discover_on_date(
        &self,
        query: &str,
        date: NaiveDate,
        language: Language,
    ) -> Result<()> {
        let search_query = SearchQuery {
            text: query.to_string(),
            date,
            language,
        };
        let url = create_search_url(&search_query);

        let html = self.search.fetch(&url).await?;
        let records = extract_search_results(&html, date);
        let found = records.len();

        let mut fresh: Vec<ArticleRecord> = Vec::new();
        for record in records {
            if let Some(link) = record.link.as_deref() {
                if self.store.exists(link).await? {
                    continue;
                }
            }
            fresh.push(record);
        }

        let inserted = self.store.insert_batch(&fresh).await?;
        debug!(%date, found, inserted = inserted.len(), "stored day's results");

        Ok(())
    }

    /// Sequential backfill over stored records still flagged truncated.
    /// One at a time: the picker is rate limited and the render fallback
    /// should not be hit concurrently.
    async fn backfill_headlines(&self) -> Result<()> {
        let truncated = self.store.find_truncated().await?;
        info!(count = truncated.len(), "backfilling truncated headlines");

        let mut resolved_count = 0usize;
        for record in truncated {
            let Some(link) = record.link.as_deref() else {
                continue;
            };
            let Some(id) = record.id.as_ref() else {
                warn!(link, "stored record has no id, skipping");
                continue;
            };

            let html = match self.content.fetch(link).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(link, error = %e, "content fetch failed, leaving record truncated");
                    continue;
                }
            };

            match resolve_headline(&html, self.picker.as_deref()).await {
                Ok(Some(headline)) => {
                    self.store.update_headline(id, &headline).await?;
                    resolved_count += 1;
                }
                // No answer: keep the headline and the flag, so the
                // record stays eligible for a future pass.
                Ok(None) => debug!(link, "headline unresolved"),
                Err(e) => warn!(link, error = %e, "picker failed, leaving record truncated"),
            }
        }

        info!(resolved = resolved_count, "backfill finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use nw_core::types::RecordId;
    use nw_core::Error;
    use nw_storage::MemoryStore;
    use std::sync::Mutex;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    /// Search fetcher that records requested URLs and answers each with a
    /// canned page.
    struct CannedSearch {
        page: &'static str,
        urls: Mutex<Vec<String>>,
    }

    impl CannedSearch {
        fn new(page: &'static str) -> Self {
            Self {
                page,
                urls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for CannedSearch {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.urls.lock().unwrap().push(url.to_string());
            Ok(self.page.to_string())
        }
    }

    /// Content fetcher that maps exact URLs to canned pages and fails on
    /// anything else.
    struct CannedContent {
        pages: Vec<(&'static str, &'static str)>,
    }

    #[async_trait]
    impl PageFetcher for CannedContent {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.pages
                .iter()
                .find(|(u, _)| *u == url)
                .map(|(_, page)| page.to_string())
                .ok_or_else(|| Error::Scraping(format!("no canned page for {url}")))
        }
    }

    const EMPTY_PAGE: &str = "<html><body></body></html>";

    const ONE_RESULT_PAGE: &str = r#"
        <div class="SoaBEf">
          <a href="https://example.com/story">
            <div><g-img></g-img><span>Example Times</span></div>
            <div role="heading">A story that got cut o...</div>
          </a>
        </div>
    "#;

    fn truncated_record(link: &str) -> ArticleRecord {
        ArticleRecord {
            id: None,
            date: day(2),
            publication: None,
            headline: Some("A story that got cut o...".to_string()),
            link: Some(link.to_string()),
            truncated: true,
        }
    }

    #[tokio::test]
    async fn schedules_one_task_per_day_excluding_the_start_date() {
        let store = Arc::new(MemoryStore::new());
        let search = Arc::new(CannedSearch::new(EMPTY_PAGE));
        let content = Arc::new(CannedContent { pages: vec![] });

        let scraper = NewsScraper::new(store, search.clone(), content);
        scraper
            .scrape_news("q", day(1), day(3), Language::English)
            .await
            .unwrap();

        let urls = search.urls.lock().unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls.iter().any(|u| u.contains("cd_min:01/02/2024")));
        assert!(urls.iter().any(|u| u.contains("cd_min:01/03/2024")));
        assert!(!urls.iter().any(|u| u.contains("cd_min:01/01/2024")));
    }

    #[tokio::test]
    async fn empty_date_range_schedules_nothing() {
        let store = Arc::new(MemoryStore::new());
        let search = Arc::new(CannedSearch::new(EMPTY_PAGE));
        let content = Arc::new(CannedContent { pages: vec![] });

        let scraper = NewsScraper::new(store, search.clone(), content);
        scraper
            .scrape_news("q", day(5), day(5), Language::English)
            .await
            .unwrap();

        assert!(search.urls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn known_links_are_not_inserted_again() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_one(&truncated_record("https://example.com/story"))
            .await
            .unwrap();

        let search = Arc::new(CannedSearch::new(ONE_RESULT_PAGE));
        let content = Arc::new(CannedContent { pages: vec![] });

        let scraper = NewsScraper::new(store.clone(), search, content);
        scraper
            .discover("q", day(1), day(3), Language::English)
            .await
            .unwrap();

        // both days surfaced the same link; the seeded record is the only one
        let all = store.find_all().await.unwrap();
        let matching = all
            .iter()
            .filter(|r| r.link.as_deref() == Some("https://example.com/story"))
            .count();
        assert_eq!(matching, 1);
    }

    #[tokio::test]
    async fn discovery_inserts_extracted_records() {
        let store = Arc::new(MemoryStore::new());
        let search = Arc::new(CannedSearch::new(ONE_RESULT_PAGE));
        let content = Arc::new(CannedContent { pages: vec![] });

        let scraper = NewsScraper::new(store.clone(), search, content);
        scraper
            .discover("q", day(1), day(2), Language::English)
            .await
            .unwrap();

        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].publication.as_deref(), Some("Example Times"));
        assert!(all[0].truncated);
        assert_eq!(all[0].date, day(2));
    }

    #[tokio::test]
    async fn a_failing_day_does_not_abort_its_siblings() {
        struct FlakySearch {
            urls: Mutex<Vec<String>>,
        }

        #[async_trait]
        impl PageFetcher for FlakySearch {
            async fn fetch(&self, url: &str) -> Result<String> {
                self.urls.lock().unwrap().push(url.to_string());
                if url.contains("cd_min:01/02/2024") {
                    Err(Error::Scraping("search page returned 429".to_string()))
                } else {
                    Ok(ONE_RESULT_PAGE.to_string())
                }
            }
        }

        let store = Arc::new(MemoryStore::new());
        let search = Arc::new(FlakySearch {
            urls: Mutex::new(Vec::new()),
        });
        let content = Arc::new(CannedContent { pages: vec![] });

        let scraper = NewsScraper::new(store.clone(), search.clone(), content);
        scraper
            .discover("q", day(1), day(3), Language::English)
            .await
            .unwrap();

        // both days ran; the good day's record landed
        assert_eq!(search.urls.lock().unwrap().len(), 2);
        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn backfill_replaces_headline_and_clears_flag() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_one(&truncated_record("https://example.com/story"))
            .await
            .unwrap();

        let search = Arc::new(CannedSearch::new(EMPTY_PAGE));
        let content = Arc::new(CannedContent {
            pages: vec![(
                "https://example.com/story",
                "<html><h1>Full Headline</h1></html>",
            )],
        });

        let scraper = NewsScraper::new(store.clone(), search, content);
        scraper
            .scrape_news("q", day(5), day(5), Language::English)
            .await
            .unwrap();

        let all = store.find_all().await.unwrap();
        assert_eq!(all[0].headline.as_deref(), Some("Full Headline"));
        assert!(!all[0].truncated);
    }

    #[tokio::test]
    async fn backfill_leaves_record_untouched_when_unresolved() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_one(&truncated_record("https://example.com/story"))
            .await
            .unwrap();

        // page with no headings at all: resolver has no answer
        let search = Arc::new(CannedSearch::new(EMPTY_PAGE));
        let content = Arc::new(CannedContent {
            pages: vec![("https://example.com/story", "<html><p>body</p></html>")],
        });

        let scraper = NewsScraper::new(store.clone(), search, content);
        scraper
            .scrape_news("q", day(5), day(5), Language::English)
            .await
            .unwrap();

        let all = store.find_all().await.unwrap();
        assert_eq!(all[0].headline.as_deref(), Some("A story that got cut o..."));
        assert!(all[0].truncated);
    }

    #[tokio::test]
    async fn backfill_resolves_ambiguous_page_through_the_picker() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_one(&truncated_record("https://example.com/story"))
            .await
            .unwrap();

        let search = Arc::new(CannedSearch::new(EMPTY_PAGE));
        let content = Arc::new(CannedContent {
            pages: vec![(
                "https://example.com/story",
                "<html><h1>Full Headline</h1><h1>Related coverage</h1></html>",
            )],
        });

        let scraper = NewsScraper::new(store.clone(), search, content)
            .with_picker(Arc::new(nw_inference::DummyPicker));
        scraper
            .scrape_news("q", day(5), day(5), Language::English)
            .await
            .unwrap();

        let all = store.find_all().await.unwrap();
        assert_eq!(all[0].headline.as_deref(), Some("Full Headline"));
        assert!(!all[0].truncated);
    }

    #[tokio::test]
    async fn backfill_continues_past_a_failing_fetch() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_one(&truncated_record("https://example.com/unreachable"))
            .await
            .unwrap();
        store
            .insert_one(&truncated_record("https://example.com/story"))
            .await
            .unwrap();

        let search = Arc::new(CannedSearch::new(EMPTY_PAGE));
        let content = Arc::new(CannedContent {
            pages: vec![(
                "https://example.com/story",
                "<html><h1>Full Headline</h1></html>",
            )],
        });

        let scraper = NewsScraper::new(store.clone(), search, content);
        scraper
            .scrape_news("q", day(5), day(5), Language::English)
            .await
            .unwrap();

        let all = store.find_all().await.unwrap();
        assert!(all[0].truncated, "unreachable record stays truncated");
        assert_eq!(all[1].headline.as_deref(), Some("Full Headline"));
        assert!(!all[1].truncated);
    }

    /// Store wrapper that logs operation names so tests can assert the
    /// discovery/backfill barrier.
    struct OrderedStore {
        inner: MemoryStore,
        ops: Mutex<Vec<&'static str>>,
    }

    impl OrderedStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                ops: Mutex::new(Vec::new()),
            }
        }

        fn log(&self, op: &'static str) {
            self.ops.lock().unwrap().push(op);
        }
    }

    #[async_trait]
    impl ArticleStore for OrderedStore {
        async fn exists(&self, link: &str) -> Result<bool> {
            self.log("exists");
            self.inner.exists(link).await
        }

        async fn insert_one(&self, record: &ArticleRecord) -> Result<RecordId> {
            self.log("insert_one");
            self.inner.insert_one(record).await
        }

        async fn insert_batch(&self, records: &[ArticleRecord]) -> Result<Vec<RecordId>> {
            self.log("insert_batch");
            self.inner.insert_batch(records).await
        }

        async fn find_truncated(&self) -> Result<Vec<ArticleRecord>> {
            self.log("find_truncated");
            self.inner.find_truncated().await
        }

        async fn find_all(&self) -> Result<Vec<ArticleRecord>> {
            self.inner.find_all().await
        }

        async fn find_links(&self) -> Result<Vec<String>> {
            self.inner.find_links().await
        }

        async fn find_inserted_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<ArticleRecord>> {
            self.inner.find_inserted_since(cutoff).await
        }

        async fn update_headline(&self, id: &RecordId, headline: &str) -> Result<()> {
            self.log("update_headline");
            self.inner.update_headline(id, headline).await
        }
    }

    /// Search fetcher that stalls so slow discovery tasks are still in
    /// flight when an unenforced barrier would let backfill start.
    struct SlowSearch;

    #[async_trait]
    impl PageFetcher for SlowSearch {
        async fn fetch(&self, url: &str) -> Result<String> {
            let delay = if url.contains("cd_min:01/02/2024") {
                50
            } else {
                5
            };
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            Ok(EMPTY_PAGE.to_string())
        }
    }

    #[tokio::test]
    async fn every_insert_precedes_the_backfill_query() {
        let store = Arc::new(OrderedStore::new());
        let content = Arc::new(CannedContent { pages: vec![] });

        let scraper = NewsScraper::new(store.clone(), Arc::new(SlowSearch), content)
            .with_workers(4);
        scraper
            .scrape_news("q", day(1), day(5), Language::English)
            .await
            .unwrap();

        let ops = store.ops.lock().unwrap();
        let first_find = ops
            .iter()
            .position(|op| *op == "find_truncated")
            .expect("backfill queried the store");
        let last_insert = ops
            .iter()
            .rposition(|op| *op == "insert_batch")
            .expect("discovery inserted");
        assert!(
            last_insert < first_find,
            "backfill must start only after every discovery task inserted: {ops:?}"
        );
    }
}
