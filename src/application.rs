//! Application layer
//!
//! Contains the crawl engine that sequences the pipeline stages over the
//! seed pages and the product frontier.

pub mod crawl_engine;

pub use crawl_engine::CrawlEngine;
