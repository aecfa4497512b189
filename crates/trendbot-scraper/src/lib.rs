pub mod browser;
pub mod debug;
pub mod delay;
pub mod dom;
pub mod error;
pub mod normalize;
pub mod registry;
pub mod score;
pub mod scrape;
pub mod session;
pub mod sources;

pub use browser::{BrowserSession, ChromeLaunch, ChromeSession};
pub use debug::dump_page;
pub use delay::DelayRange;
pub use error::{BrowserError, ExtractionFailure, ScraperError};
pub use normalize::{normalize, normalize_at, normalize_batch, NormalizedBatch};
pub use registry::ScraperRegistry;
pub use score::score;
pub use scrape::{Listing, ScrapeOptions, ScrapeOutcome, SourceScraper};
pub use session::{
    close_session, open_session, pick_user_agent, ChromeSessionFactory, SessionFactory,
    SessionOptions,
};
