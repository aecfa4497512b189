pub mod app_config;
pub mod config;
pub mod platform;
pub mod products;
pub mod runs;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, DEFAULT_USER_AGENTS};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use platform::Platform;
pub use products::{Metrics, ProductRecord, RawItem};
pub use runs::{ScrapeRunStatus, SourceRun, SourceRunStatus};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid platform: {0}")]
    InvalidPlatform(String),
}
