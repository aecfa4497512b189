use std::path::PathBuf;

use crate::app_config::{
    AppConfig, Environment, DEFAULT_ALIEXPRESS_URL, DEFAULT_AMAZON_URL, DEFAULT_REDDIT_URL,
    DEFAULT_USER_AGENTS,
};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every setting has a default, so an empty lookup yields a usable
/// development config. Tests pass a `HashMap`-backed lookup instead of
/// mutating the process environment.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] when a value does not parse or the
/// delay bounds are inverted.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_secs = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .trim()
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(var, "must be a non-negative number of seconds".into()));
        }
        Ok(value)
    };

    let database_url = or_default("TRENDBOT_DATABASE_URL", "sqlite://data/trendbot.db");
    let env = parse_environment(&or_default("TRENDBOT_ENV", "development"));
    let log_level = or_default("TRENDBOT_LOG_LEVEL", "info");
    let headless = parse_headless(&or_default("TRENDBOT_HEADLESS", "true"));
    let proxy_url = optional("TRENDBOT_PROXY_URL");

    let delay_min_secs = parse_secs("TRENDBOT_DELAY_MIN_SECS", "2")?;
    let delay_max_secs = parse_secs("TRENDBOT_DELAY_MAX_SECS", "5")?;
    if delay_min_secs > delay_max_secs {
        return Err(invalid(
            "TRENDBOT_DELAY_MIN_SECS",
            format!("{delay_min_secs} exceeds TRENDBOT_DELAY_MAX_SECS ({delay_max_secs})"),
        ));
    }

    let page_timeout_secs = parse_u64("TRENDBOT_PAGE_TIMEOUT_SECS", "45")?;
    let max_items = parse_usize("TRENDBOT_MAX_ITEMS", "25")?;

    let amazon_url = or_default("TRENDBOT_AMAZON_URL", DEFAULT_AMAZON_URL);
    let aliexpress_url = or_default("TRENDBOT_ALIEXPRESS_URL", DEFAULT_ALIEXPRESS_URL);
    let reddit_url = or_default("TRENDBOT_REDDIT_URL", DEFAULT_REDDIT_URL);

    let user_agents = optional("TRENDBOT_USER_AGENTS").map_or_else(
        || DEFAULT_USER_AGENTS.iter().map(|ua| (*ua).to_string()).collect(),
        |raw| parse_user_agents(&raw),
    );
    if user_agents.is_empty() {
        return Err(invalid(
            "TRENDBOT_USER_AGENTS",
            "no user agents after splitting on '|'".into(),
        ));
    }

    let debug_dir = optional("TRENDBOT_DEBUG_DIR").map(PathBuf::from);
    let chrome_bin = optional("TRENDBOT_CHROME_BIN").map(PathBuf::from);

    let db_max_connections = parse_u32("TRENDBOT_DB_MAX_CONNECTIONS", "5")?;
    let db_acquire_timeout_secs = parse_u64("TRENDBOT_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        headless,
        proxy_url,
        delay_min_secs,
        delay_max_secs,
        page_timeout_secs,
        max_items,
        amazon_url,
        aliexpress_url,
        reddit_url,
        user_agents,
        debug_dir,
        chrome_bin,
        db_max_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

/// Only an explicit `false` turns headless mode off.
fn parse_headless(s: &str) -> bool {
    !s.trim().eq_ignore_ascii_case("false")
}

fn parse_user_agents(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|ua| !ua.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
