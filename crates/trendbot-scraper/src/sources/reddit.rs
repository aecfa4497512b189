//! Reddit product subreddits.

use async_trait::async_trait;
use trendbot_core::Platform;

use crate::browser::BrowserSession;
use crate::scrape::{
    scrape_listing, FieldSource, FieldSpec, ScrapeOptions, ScrapeOutcome, SiteProfile,
    SourceScraper,
};

pub(crate) const PROFILE: SiteProfile = SiteProfile {
    platform: Platform::Reddit,
    ready_selectors: &["div[data-testid='post-container']", "div.Post"],
    item_selector: "div[data-testid='post-container'], div.Post",
    title: FieldSpec {
        key: "title",
        selector: "h3",
        source: FieldSource::Text,
    },
    fields: &[
        FieldSpec {
            key: "url",
            selector: "a[data-click-id='body']",
            source: FieldSource::Link("href"),
        },
        // "2.3k", "145", "Vote"
        FieldSpec {
            key: "upvotes",
            selector: "div._1rZYMD_4xY3gRcSS3p8ODO, div[data-click-id='upvote'] span",
            source: FieldSource::Text,
        },
        // "145 comments"
        FieldSpec {
            key: "num_comments",
            selector: "span[data-testid='comments-page-link-num-comments'], \
                       span.FHCV02u6Cp2zYL0fhQPsO",
            source: FieldSource::Text,
        },
        // The subreddit stands in for a product description.
        FieldSpec {
            key: "description",
            selector: "a[data-click-id='subreddit']",
            source: FieldSource::Text,
        },
        FieldSpec {
            key: "image_url",
            selector: "img[alt='Post image'], img.ImageBox-image",
            source: FieldSource::Attr("src"),
        },
    ],
};

#[derive(Debug, Default, Clone, Copy)]
pub struct RedditScraper;

#[async_trait]
impl SourceScraper for RedditScraper {
    fn platform(&self) -> Platform {
        Platform::Reddit
    }

    async fn scrape(
        &self,
        session: &mut dyn BrowserSession,
        options: &ScrapeOptions,
    ) -> ScrapeOutcome {
        scrape_listing(&PROFILE, session, options).await
    }
}
