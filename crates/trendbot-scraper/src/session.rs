//! Session manager: opens and closes browser sessions with rotated identities.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use trendbot_core::{AppConfig, DEFAULT_USER_AGENTS};

use crate::browser::{BrowserSession, ChromeLaunch, ChromeSession};
use crate::error::ScraperError;

/// Per-session launch options.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub headless: bool,
    pub proxy: Option<String>,
    /// When `None`, one is drawn from the factory's user-agent pool.
    pub user_agent: Option<String>,
    pub page_timeout: Duration,
}

impl SessionOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            headless: config.headless,
            proxy: config.proxy_url.clone(),
            user_agent: None,
            page_timeout: Duration::from_secs(config.page_timeout_secs),
        }
    }
}

/// Produces ready-to-navigate browser sessions.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ScraperError::Launch`] if no session could be started.
    async fn open(&self, options: &SessionOptions) -> Result<Box<dyn BrowserSession>, ScraperError>;
}

/// Launches one Chrome process per session.
#[derive(Debug, Clone)]
pub struct ChromeSessionFactory {
    user_agents: Vec<String>,
    chrome_bin: Option<PathBuf>,
}

impl ChromeSessionFactory {
    /// An empty `user_agents` pool falls back to the built-in agents.
    #[must_use]
    pub fn new(user_agents: Vec<String>, chrome_bin: Option<PathBuf>) -> Self {
        let user_agents = if user_agents.is_empty() {
            DEFAULT_USER_AGENTS.iter().map(|ua| (*ua).to_string()).collect()
        } else {
            user_agents
        };
        Self {
            user_agents,
            chrome_bin,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(config.user_agents.clone(), config.chrome_bin.clone())
    }

    fn resolve(&self, options: &SessionOptions) -> ChromeLaunch {
        let user_agent = options
            .user_agent
            .clone()
            .unwrap_or_else(|| pick_user_agent(&self.user_agents));
        ChromeLaunch {
            headless: options.headless,
            proxy: options.proxy.clone(),
            user_agent,
            page_timeout: options.page_timeout,
            chrome_bin: self.chrome_bin.clone(),
        }
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    async fn open(&self, options: &SessionOptions) -> Result<Box<dyn BrowserSession>, ScraperError> {
        let launch = self.resolve(options);
        tracing::info!(
            headless = launch.headless,
            proxy = launch.proxy.is_some(),
            user_agent = %launch.user_agent,
            "opening browser session"
        );
        let session = ChromeSession::launch(&launch)
            .await
            .map_err(|e| ScraperError::Launch(e.to_string()))?;
        Ok(Box::new(session))
    }
}

/// Draws a user agent uniformly from `pool`, or the first built-in agent
/// when the pool is empty.
#[must_use]
pub fn pick_user_agent(pool: &[String]) -> String {
    pool.choose(&mut rand::rng())
        .cloned()
        .unwrap_or_else(|| DEFAULT_USER_AGENTS[0].to_string())
}

/// Opens a session through `factory`.
///
/// # Errors
///
/// Returns [`ScraperError::Launch`] if the factory cannot start a session.
pub async fn open_session(
    factory: &dyn SessionFactory,
    options: &SessionOptions,
) -> Result<Box<dyn BrowserSession>, ScraperError> {
    factory.open(options).await
}

/// Closes `session`, logging rather than propagating shutdown errors.
///
/// The session is consumed; any resources `close` could not release are
/// reclaimed when it drops.
pub async fn close_session(mut session: Box<dyn BrowserSession>) {
    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "browser session did not close cleanly");
    }
}
