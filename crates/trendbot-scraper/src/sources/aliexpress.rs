//! AliExpress trending category listing.

use async_trait::async_trait;
use trendbot_core::Platform;

use crate::browser::BrowserSession;
use crate::scrape::{
    scrape_listing, FieldSource, FieldSpec, ScrapeOptions, ScrapeOutcome, SiteProfile,
    SourceScraper,
};

pub(crate) const PROFILE: SiteProfile = SiteProfile {
    platform: Platform::AliExpress,
    ready_selectors: &["div.list-item", "div.JIIxO"],
    item_selector: "div.list-item, div.JIIxO",
    title: FieldSpec {
        key: "title",
        selector: "a.item-title, a._3t7zg, h3",
        source: FieldSource::Text,
    },
    fields: &[
        // Item links are protocol-relative ("//www.aliexpress.com/item/...").
        FieldSpec {
            key: "link",
            selector: "a.item-title, a._3t7zg, a",
            source: FieldSource::Link("href"),
        },
        FieldSpec {
            key: "image_url",
            selector: "img",
            source: FieldSource::Link("src"),
        },
        FieldSpec {
            key: "price",
            selector: "span.price, div._1NoI8",
            source: FieldSource::Text,
        },
        // "1,234 sold"
        FieldSpec {
            key: "sold",
            selector: "span.item-sold, span._1kNf9",
            source: FieldSource::Text,
        },
        FieldSpec {
            key: "stars",
            selector: "span.rating, span._1cE1T",
            source: FieldSource::Text,
        },
    ],
};

#[derive(Debug, Default, Clone, Copy)]
pub struct AliExpressScraper;

#[async_trait]
impl SourceScraper for AliExpressScraper {
    fn platform(&self) -> Platform {
        Platform::AliExpress
    }

    async fn scrape(
        &self,
        session: &mut dyn BrowserSession,
        options: &ScrapeOptions,
    ) -> ScrapeOutcome {
        scrape_listing(&PROFILE, session, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::parse_listing;

    const FIXTURE: &str = include_str!("../../tests/fixtures/aliexpress_trending.html");

    #[test]
    fn parses_fixture_items() {
        let items = parse_listing(&PROFILE, FIXTURE, 25);
        assert_eq!(items.len(), 2);

        let first = items[0].as_ref().expect("first item should parse");
        assert_eq!(first.get("title"), Some("Mini Portable Projector 1080P"));
        assert_eq!(
            first.get("link"),
            Some("https://www.aliexpress.com/item/1005001234567890.html")
        );
        assert_eq!(
            first.get("image_url"),
            Some("https://ae01.alicdn.com/kf/projector.jpg")
        );
        assert_eq!(first.get("price"), Some("US $39.99"));
        assert_eq!(first.get("sold"), Some("1,234 sold"));
        assert_eq!(first.get("stars"), Some("4.7"));
    }

    #[test]
    fn legacy_layout_is_also_recognised() {
        let items = parse_listing(&PROFILE, FIXTURE, 25);
        let second = items[1].as_ref().expect("second item should parse");
        assert_eq!(second.get("title"), Some("LED Strip Lights 10m"));
        assert_eq!(second.get("sold"), Some("56 sold"));
        assert_eq!(second.get("stars"), None);
    }

    #[test]
    fn selectors_are_valid_css() {
        for css in std::iter::once(PROFILE.item_selector)
            .chain(PROFILE.ready_selectors.iter().copied())
            .chain(std::iter::once(PROFILE.title.selector))
            .chain(PROFILE.fields.iter().map(|f| f.selector))
        {
            assert!(scraper::Selector::parse(css).is_ok(), "invalid selector {css}");
        }
    }
}
