//! Per-platform listing scrapers.

pub mod aliexpress;
pub mod amazon;
pub mod reddit;

pub use aliexpress::AliExpressScraper;
pub use amazon::AmazonScraper;
pub use reddit::RedditScraper;
