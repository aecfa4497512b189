use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A marketplace or community whose trending listing is scraped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Amazon,
    AliExpress,
    Reddit,
}

impl Platform {
    /// All platforms in the default scrape order.
    pub const ALL: [Platform; 3] = [Platform::Amazon, Platform::AliExpress, Platform::Reddit];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Amazon => "amazon",
            Platform::AliExpress => "aliexpress",
            Platform::Reddit => "reddit",
        }
    }

    /// Scheme and host used to absolutize relative links scraped from this
    /// platform's listing pages.
    #[must_use]
    pub fn origin(self) -> &'static str {
        match self {
            Platform::Amazon => "https://www.amazon.com",
            Platform::AliExpress => "https://www.aliexpress.com",
            Platform::Reddit => "https://www.reddit.com",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "amazon" => Ok(Platform::Amazon),
            "aliexpress" => Ok(Platform::AliExpress),
            "reddit" => Ok(Platform::Reddit),
            other => Err(CoreError::InvalidPlatform(other.to_string())),
        }
    }
}
