use async_trait::async_trait;

use crate::error::Result;

/// Returns page content for a URL. Implementations decide how: a plain
/// GET, a tiered fetch with a render fallback, or a test stub.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Full browser rendering of a URL. The adapter owns the renderer
/// lifecycle; callers only ever see the rendered page source.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<String>;
}
