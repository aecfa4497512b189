use super::*;

// -----------------------------------------------------------------------
// Fake session
// -----------------------------------------------------------------------

struct FakeSession {
    html: String,
    fail_navigation: bool,
    fail_wait: bool,
    navigated_to: Vec<String>,
}

impl FakeSession {
    fn serving(html: &str) -> Self {
        Self {
            html: html.to_string(),
            fail_navigation: false,
            fail_wait: false,
            navigated_to: Vec::new(),
        }
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.navigated_to.push(url.to_string());
        if self.fail_navigation {
            return Err(BrowserError::Navigation("net::ERR_NAME_NOT_RESOLVED".to_string()));
        }
        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        selectors: &[&str],
        timeout: Duration,
    ) -> Result<String, BrowserError> {
        if self.fail_wait {
            return Err(BrowserError::Timeout {
                selectors: selectors.join(", "),
                after: timeout,
            });
        }
        Ok(selectors[0].to_string())
    }

    async fn page_source(&mut self) -> Result<String, BrowserError> {
        Ok(self.html.clone())
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        Ok(self.navigated_to.last().cloned().unwrap_or_default())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        Ok(())
    }
}

const PROFILE: SiteProfile = SiteProfile {
    platform: Platform::Amazon,
    ready_selectors: &["ol.grid"],
    item_selector: "ol.grid li",
    title: FieldSpec {
        key: "title",
        selector: "span.name",
        source: FieldSource::Text,
    },
    fields: &[
        FieldSpec {
            key: "url",
            selector: "a",
            source: FieldSource::Link("href"),
        },
        FieldSpec {
            key: "image_url",
            selector: "img",
            source: FieldSource::Attr("src"),
        },
        FieldSpec {
            key: "review_count",
            selector: "span.reviews",
            source: FieldSource::Text,
        },
    ],
};

const LISTING: &str = r#"
<html><body><ol class="grid">
  <li><a href="/dp/1"><span class="name">Widget</span></a><img src="https://img/1.jpg"><span class="reviews">120</span></li>
  <li><a href="/dp/2"><span class="name">Gadget</span></a></li>
  <li><a href="/dp/3"></a><span class="reviews">7</span></li>
  <li><a href="https://elsewhere.example/4"><span class="name">Doohickey</span></a></li>
  <li><a href="/dp/5"><span class="name">Thingamajig</span></a></li>
</ol></body></html>
"#;

fn options(max_items: usize) -> ScrapeOptions {
    ScrapeOptions {
        listing_url: "https://www.amazon.com/gp/movers-and-shakers/".to_string(),
        max_items,
        timeout: Duration::from_secs(5),
    }
}

// -----------------------------------------------------------------------
// parse_listing
// -----------------------------------------------------------------------

#[test]
fn parse_listing_extracts_fields_and_reports_missing_title() {
    let items = parse_listing(&PROFILE, LISTING, 25);
    assert_eq!(items.len(), 5);

    let first = items[0].as_ref().expect("first item should parse");
    assert_eq!(first.index, 0);
    assert_eq!(first.get("title"), Some("Widget"));
    assert_eq!(first.get("url"), Some("https://www.amazon.com/dp/1"));
    assert_eq!(first.get("image_url"), Some("https://img/1.jpg"));
    assert_eq!(first.get("review_count"), Some("120"));

    let second = items[1].as_ref().expect("second item should parse");
    assert_eq!(second.get("review_count"), None);

    let failure = items[2].as_ref().expect_err("third item has no title");
    assert_eq!(failure.index, 2);
    assert_eq!(failure.field, "name");
    assert_eq!(failure.platform, Platform::Amazon);
}

#[test]
fn parse_listing_respects_max_items() {
    let items = parse_listing(&PROFILE, LISTING, 2);
    assert_eq!(items.len(), 2);
}

#[test]
fn parse_listing_keeps_absolute_links() {
    let items = parse_listing(&PROFILE, LISTING, 25);
    let fourth = items[3].as_ref().expect("fourth item should parse");
    assert_eq!(fourth.get("url"), Some("https://elsewhere.example/4"));
}

// -----------------------------------------------------------------------
// absolutize / is_blocked
// -----------------------------------------------------------------------

#[test]
fn absolutize_handles_root_relative_and_protocol_relative() {
    assert_eq!(
        absolutize(Platform::Reddit, "/r/gadgets/comments/1"),
        "https://www.reddit.com/r/gadgets/comments/1"
    );
    assert_eq!(
        absolutize(Platform::AliExpress, "//www.aliexpress.com/item/9.html"),
        "https://www.aliexpress.com/item/9.html"
    );
    assert_eq!(absolutize(Platform::Amazon, "https://a.example/x"), "https://a.example/x");
}

#[test]
fn is_blocked_detects_captcha_and_robot_check() {
    assert!(is_blocked("<title>Amazon.com</title><h4>Enter the characters</h4> CAPTCHA"));
    assert!(is_blocked("<h1>Robot Check</h1>"));
    assert!(!is_blocked(LISTING));
}

// -----------------------------------------------------------------------
// Listing
// -----------------------------------------------------------------------

#[test]
fn listing_is_single_pass() {
    let mut listing: Listing = vec![
        Ok(RawItem::new(Platform::Reddit, 0)),
        Err(ExtractionFailure::new(Platform::Reddit, 1, "name", "missing")),
    ]
    .into_iter()
    .collect();

    assert_eq!(listing.size_hint(), (2, Some(2)));
    assert!(listing.next().is_some_and(|r| r.is_ok()));
    assert!(listing.next().is_some_and(|r| r.is_err()));
    assert!(listing.next().is_none());
    assert!(listing.next().is_none(), "exhausted listing stays exhausted");
}

// -----------------------------------------------------------------------
// scrape_listing
// -----------------------------------------------------------------------

#[tokio::test]
async fn scrape_listing_returns_items_on_success() {
    let mut session = FakeSession::serving(LISTING);
    let outcome = scrape_listing(&PROFILE, &mut session, &options(25)).await;

    assert!(outcome.failure.is_none());
    assert!(outcome.page_html.is_none());
    let results: Vec<_> = outcome.listing.collect();
    assert_eq!(results.len(), 5);
    assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
    assert_eq!(
        session.navigated_to,
        vec!["https://www.amazon.com/gp/movers-and-shakers/".to_string()]
    );
}

#[tokio::test]
async fn scrape_listing_reports_navigation_failure() {
    let mut session = FakeSession::serving(LISTING);
    session.fail_navigation = true;
    let outcome = scrape_listing(&PROFILE, &mut session, &options(25)).await;

    assert!(matches!(
        outcome.failure,
        Some(ScraperError::Navigation { platform: Platform::Amazon, .. })
    ));
    assert_eq!(outcome.listing.count(), 0);
}

#[tokio::test]
async fn scrape_listing_reports_timeout_with_selector() {
    let mut session = FakeSession::serving("<html><body>still loading</body></html>");
    session.fail_wait = true;
    let outcome = scrape_listing(&PROFILE, &mut session, &options(25)).await;

    match outcome.failure {
        Some(ScraperError::Timeout { selector, secs, .. }) => {
            assert_eq!(selector, "ol.grid");
            assert_eq!(secs, 5);
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
    assert!(outcome.page_html.is_some(), "timeout keeps the page for debugging");
}

#[tokio::test]
async fn scrape_listing_reports_captcha_as_blocked_even_when_wait_times_out() {
    let mut session = FakeSession::serving("<form action='/errors/validateCaptcha'></form>");
    session.fail_wait = true;
    let outcome = scrape_listing(&PROFILE, &mut session, &options(25)).await;

    assert!(matches!(outcome.failure, Some(ScraperError::Blocked { .. })));
}

#[tokio::test]
async fn scrape_listing_reports_captcha_after_render() {
    let page = format!("{LISTING}<div>Type the characters you see (captcha)</div>");
    let mut session = FakeSession::serving(&page);
    let outcome = scrape_listing(&PROFILE, &mut session, &options(25)).await;

    assert!(matches!(outcome.failure, Some(ScraperError::Blocked { .. })));
    assert_eq!(outcome.listing.count(), 0);
    assert!(outcome.page_html.is_some());
}
