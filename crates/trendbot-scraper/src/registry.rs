use std::collections::BTreeMap;

use trendbot_core::Platform;

use crate::scrape::SourceScraper;
use crate::sources::{AliExpressScraper, AmazonScraper, RedditScraper};

/// Maps each platform to its scraper.
#[derive(Default)]
pub struct ScraperRegistry {
    scrapers: BTreeMap<Platform, Box<dyn SourceScraper>>,
}

impl ScraperRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in Amazon, AliExpress and Reddit scrapers.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(AmazonScraper));
        registry.register(Box::new(AliExpressScraper));
        registry.register(Box::new(RedditScraper));
        registry
    }

    /// Adds `scraper`, replacing any previous one for its platform.
    pub fn register(&mut self, scraper: Box<dyn SourceScraper>) {
        self.scrapers.insert(scraper.platform(), scraper);
    }

    #[must_use]
    pub fn get(&self, platform: Platform) -> Option<&dyn SourceScraper> {
        self.scrapers.get(&platform).map(|scraper| &**scraper)
    }

    #[must_use]
    pub fn platforms(&self) -> Vec<Platform> {
        self.scrapers.keys().copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scrapers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scrapers.is_empty()
    }
}

impl std::fmt::Debug for ScraperRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScraperRegistry")
            .field("platforms", &self.platforms())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_platform() {
        let registry = ScraperRegistry::with_defaults();
        assert_eq!(registry.len(), Platform::ALL.len());
        for platform in Platform::ALL {
            let scraper = registry.get(platform).expect("scraper registered");
            assert_eq!(scraper.platform(), platform);
        }
    }

    #[test]
    fn register_replaces_existing_platform() {
        let mut registry = ScraperRegistry::new();
        assert!(registry.is_empty());
        registry.register(Box::new(RedditScraper));
        registry.register(Box::new(RedditScraper));
        assert_eq!(registry.platforms(), vec![Platform::Reddit]);
        assert!(registry.get(Platform::Amazon).is_none());
    }
}
