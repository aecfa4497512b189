//! Browser capability consumed by the scrapers, and its Chrome implementation.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use crate::error::BrowserError;

const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One live browser tab that scrapers drive.
///
/// Everything past navigation (field extraction) runs over the HTML returned
/// by [`BrowserSession::page_source`]; see [`crate::dom`].
#[async_trait]
pub trait BrowserSession: Send {
    /// Loads `url` and waits for the navigation to settle.
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Polls until any of `selectors` matches an element, returning the one
    /// that matched first.
    async fn wait_for_selector(
        &mut self,
        selectors: &[&str],
        timeout: Duration,
    ) -> Result<String, BrowserError>;

    /// The rendered DOM serialized as HTML.
    async fn page_source(&mut self) -> Result<String, BrowserError>;

    async fn current_url(&mut self) -> Result<String, BrowserError>;

    /// Shuts the browser down. Calling it twice is a no-op.
    async fn close(&mut self) -> Result<(), BrowserError>;
}

/// Launch parameters for a [`ChromeSession`], resolved by the session manager.
#[derive(Debug, Clone)]
pub struct ChromeLaunch {
    pub headless: bool,
    pub proxy: Option<String>,
    pub user_agent: String,
    pub page_timeout: Duration,
    pub chrome_bin: Option<PathBuf>,
}

impl ChromeLaunch {
    /// Command-line flags passed to Chrome, excluding the profile directory.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            format!("--user-agent={}", self.user_agent),
        ];
        if let Some(proxy) = &self.proxy {
            args.push(format!("--proxy-server={proxy}"));
        }
        args
    }
}

/// A Chrome process driven over CDP, with its own throwaway profile.
///
/// Dropping the session kills the process, stops the CDP handler task and
/// deletes the profile directory, whether or not [`BrowserSession::close`]
/// ran first.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    // Declared after `browser` so the process is gone before the directory
    // is removed.
    profile: TempDir,
    closed: bool,
}

impl ChromeSession {
    /// Launches Chrome and opens a blank tab.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Launch`] if the profile directory cannot be
    /// created, the config is rejected, or Chrome fails to start.
    pub async fn launch(launch: &ChromeLaunch) -> Result<Self, BrowserError> {
        let profile = tempfile::Builder::new()
            .prefix("trendbot-profile-")
            .tempdir()
            .map_err(|e| BrowserError::Launch(format!("profile directory: {e}")))?;

        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile.path())
            .request_timeout(launch.page_timeout);
        for arg in launch.args() {
            builder = builder.arg(arg);
        }
        if !launch.headless {
            builder = builder.with_head();
        }
        if let Some(bin) = &launch.chrome_bin {
            builder = builder.chrome_executable(bin);
        }

        let config = builder
            .build()
            .map_err(|e| BrowserError::Launch(format!("browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(BrowserError::Launch(format!("open tab: {e}")));
            }
        };

        tracing::debug!(
            profile = %profile.path().display(),
            headless = launch.headless,
            proxy = launch.proxy.is_some(),
            "chrome session launched"
        );

        Ok(Self {
            browser,
            page,
            handler,
            profile,
            closed: false,
        })
    }

    fn ensure_open(&self) -> Result<(), BrowserError> {
        if self.closed {
            Err(BrowserError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.ensure_open()?;
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        selectors: &[&str],
        timeout: Duration,
    ) -> Result<String, BrowserError> {
        self.ensure_open()?;
        let page = &self.page;
        let poll = async {
            loop {
                for selector in selectors {
                    if page.find_element(*selector).await.is_ok() {
                        return (*selector).to_string();
                    }
                }
                tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| BrowserError::Timeout {
                selectors: selectors.join(", "),
                after: timeout,
            })
    }

    async fn page_source(&mut self) -> Result<String, BrowserError> {
        self.ensure_open()?;
        self.page
            .content()
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        self.ensure_open()?;
        let url = self
            .page
            .url()
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))?;
        Ok(url.unwrap_or_default())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = self
            .browser
            .close()
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()));
        if let Err(e) = self.browser.wait().await {
            tracing::warn!(error = %e, "chrome process did not exit cleanly");
        }
        self.handler.abort();

        tracing::debug!(profile = %self.profile.path().display(), "chrome session closed");
        result.map(|_| ())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
