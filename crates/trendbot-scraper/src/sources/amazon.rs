//! Amazon Movers & Shakers.

use async_trait::async_trait;
use trendbot_core::Platform;

use crate::browser::BrowserSession;
use crate::scrape::{
    scrape_listing, FieldSource, FieldSpec, ScrapeOptions, ScrapeOutcome, SiteProfile,
    SourceScraper,
};

pub(crate) const PROFILE: SiteProfile = SiteProfile {
    platform: Platform::Amazon,
    ready_selectors: &["div#gridItemRoot", "div.p13n-gridRow"],
    item_selector: "div#gridItemRoot, div.p13n-gridRow div.zg-grid-general-faceout",
    title: FieldSpec {
        key: "title",
        selector: "div._cDEzb_p13n-sc-css-line-clamp-3_g3dy1, \
                   span._cDEzb_p13n-sc-css-line-clamp-3_g3dy1, \
                   div.p13n-sc-truncate, span.p13n-sc-truncate",
        source: FieldSource::Text,
    },
    fields: &[
        FieldSpec {
            key: "url",
            selector: "a.a-link-normal",
            source: FieldSource::Link("href"),
        },
        FieldSpec {
            key: "image_url",
            selector: "img",
            source: FieldSource::Attr("src"),
        },
        // "4.5 out of 5 stars"
        FieldSpec {
            key: "rating",
            selector: "span.a-icon-alt",
            source: FieldSource::Text,
        },
        FieldSpec {
            key: "review_count",
            selector: "span.a-size-small.a-color-secondary, span.a-size-small",
            source: FieldSource::Text,
        },
        FieldSpec {
            key: "price",
            selector: "span._cDEzb_p13n-sc-price_3mJ9Z, span.p13n-sc-price",
            source: FieldSource::Text,
        },
    ],
};

#[derive(Debug, Default, Clone, Copy)]
pub struct AmazonScraper;

#[async_trait]
impl SourceScraper for AmazonScraper {
    fn platform(&self) -> Platform {
        Platform::Amazon
    }

    async fn scrape(
        &self,
        session: &mut dyn BrowserSession,
        options: &ScrapeOptions,
    ) -> ScrapeOutcome {
        scrape_listing(&PROFILE, session, options).await
    }
}
