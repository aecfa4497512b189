use std::path::PathBuf;

use crate::Platform;

/// Desktop user agents rotated across browser sessions when
/// `TRENDBOT_USER_AGENTS` is not set.
pub const DEFAULT_USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

pub(crate) const DEFAULT_AMAZON_URL: &str = "https://www.amazon.com/gp/movers-and-shakers/";
pub(crate) const DEFAULT_ALIEXPRESS_URL: &str =
    "https://www.aliexpress.com/category/100003109/women-clothing.html?trafficChannel=main&SortType=bestmatch_sort";
pub(crate) const DEFAULT_REDDIT_URL: &str = "https://www.reddit.com/r/shutupandtakemymoney/hot/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub headless: bool,
    pub proxy_url: Option<String>,
    pub delay_min_secs: f64,
    pub delay_max_secs: f64,
    pub page_timeout_secs: u64,
    pub max_items: usize,
    pub amazon_url: String,
    pub aliexpress_url: String,
    pub reddit_url: String,
    pub user_agents: Vec<String>,
    pub debug_dir: Option<PathBuf>,
    pub chrome_bin: Option<PathBuf>,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl AppConfig {
    /// Listing URL scraped for `platform`, after env overrides.
    #[must_use]
    pub fn listing_url(&self, platform: Platform) -> &str {
        match platform {
            Platform::Amazon => &self.amazon_url,
            Platform::AliExpress => &self.aliexpress_url,
            Platform::Reddit => &self.reddit_url,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &self.database_url)
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("headless", &self.headless)
            .field("proxy_url", &self.proxy_url.as_ref().map(|_| "[redacted]"))
            .field("delay_min_secs", &self.delay_min_secs)
            .field("delay_max_secs", &self.delay_max_secs)
            .field("page_timeout_secs", &self.page_timeout_secs)
            .field("max_items", &self.max_items)
            .field("amazon_url", &self.amazon_url)
            .field("aliexpress_url", &self.aliexpress_url)
            .field("reddit_url", &self.reddit_url)
            .field("user_agents", &self.user_agents.len())
            .field("debug_dir", &self.debug_dir)
            .field("chrome_bin", &self.chrome_bin)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
