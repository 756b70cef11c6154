pub mod fetch;
pub mod headline;
pub mod logging;
pub mod scrape;
pub mod search;

pub use scrape::NewsScraper;

pub mod prelude {
    pub use crate::fetch::{ChromeRenderer, DirectFetcher, TieredFetcher};
    pub use crate::scrape::NewsScraper;
    pub use nw_core::{ArticleRecord, Language, Result};
}
