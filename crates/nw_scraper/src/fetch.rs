use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use nw_core::{Error, PageFetcher, PageRenderer, Result};

use crate::search::USER_AGENT;

/// Hard cap on a single render; a page slower than this is a failure.
const RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Plain GET with the fixed User-Agent. A non-success status is an error:
/// there is no fallback tier here, search pages either load or the day's
/// task fails.
pub struct DirectFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl DirectFetcher {
    pub fn new() -> Self {
        Self::with_user_agent(USER_AGENT)
    }

    pub fn with_user_agent(user_agent: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            user_agent: user_agent.to_string(),
        }
    }
}

impl Default for DirectFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for DirectFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Two-tier content fetch: fast direct GET first, full browser render
/// when the direct path does not succeed. Some sites refuse simple
/// clients but serve browsers, and rendering is expensive, so it stays
/// strictly the fallback tier.
pub struct TieredFetcher {
    direct: DirectFetcher,
    renderer: Arc<dyn PageRenderer>,
}

impl TieredFetcher {
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        Self {
            direct: DirectFetcher::new(),
            renderer,
        }
    }

    pub fn with_user_agent(renderer: Arc<dyn PageRenderer>, user_agent: &str) -> Self {
        Self {
            direct: DirectFetcher::with_user_agent(user_agent),
            renderer,
        }
    }
}

#[async_trait]
impl PageFetcher for TieredFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        match self.direct.fetch(url).await {
            Ok(body) => Ok(body),
            Err(e) => {
                debug!(url, error = %e, "direct fetch failed, falling back to renderer");
                self.renderer.render(url).await
            }
        }
    }
}

/// Renders a URL with a headless Chromium subprocess (`--dump-dom`). Each
/// render gets a throwaway profile directory, removed when its guard
/// drops, and the process exits with the call, so there is no renderer
/// state to manage between fetches.
pub struct ChromeRenderer {
    chrome_bin: String,
}

impl ChromeRenderer {
    /// Uses `$CHROME_BIN` when set, otherwise `chromium` from PATH.
    pub fn new() -> Self {
        Self {
            chrome_bin: std::env::var("CHROME_BIN").unwrap_or_else(|_| "chromium".to_string()),
        }
    }

    pub fn with_binary(chrome_bin: &str) -> Self {
        Self {
            chrome_bin: chrome_bin.to_string(),
        }
    }
}

impl Default for ChromeRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn render(&self, url: &str) -> Result<String> {
        let parsed = url::Url::parse(url).map_err(|e| Error::Render(format!("invalid url {url}: {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::Render(format!(
                "only http/https urls can be rendered, got {}",
                parsed.scheme()
            )));
        }

        let profile_dir = tempfile::tempdir()?;

        info!(url, "rendering page");
        let output = tokio::time::timeout(
            RENDER_TIMEOUT,
            tokio::process::Command::new(&self.chrome_bin)
                .args([
                    "--headless",
                    "--no-sandbox",
                    "--disable-gpu",
                    "--disable-dev-shm-usage",
                    &format!("--user-data-dir={}", profile_dir.path().display()),
                    "--dump-dom",
                    url,
                ])
                .output(),
        )
        .await
        .map_err(|_| {
            Error::Render(format!(
                "render timed out after {}s for {url}",
                RENDER_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|e| Error::Render(format!("failed to launch {}: {e}", self.chrome_bin)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(url, %stderr, "renderer exited with error");
            return Err(Error::Render(format!(
                "renderer exited with {} for {url}",
                output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
