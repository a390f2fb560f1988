//! ShelfCrawl - retail category snapshot crawler
//!
//! Crawls a bounded set of category pages on a retail site, discovers the
//! product pages reachable from them, extracts structured attributes and
//! image references, downloads the images, and persists the records in
//! tabular and relational form. Safe to re-run: output writes are idempotent.

// Module declarations
pub mod domain;
pub mod application;
pub mod infrastructure;

// Re-export the main entry points for easier access
pub use application::CrawlEngine;
pub use domain::product::{CrawlSummary, FrontierEntry, ProductRecord, SnapshotSink};
pub use infrastructure::config::AppConfig;
