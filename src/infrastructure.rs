//! Infrastructure layer for network access, parsing, storage and logging
//!
//! Provides the HTTP client, HTML extraction, image retrieval, persistence
//! sinks, configuration and logging setup used by the crawl engine.

pub mod config;
pub mod error;
pub mod http_client;
pub mod html_parser;
pub mod image_store;
pub mod store;
pub mod logging;

// Re-export commonly used items
pub use config::AppConfig;
pub use error::{ScrapeError, ScrapeResult};
pub use http_client::HttpClient;
pub use html_parser::ProductDataExtractor;
pub use image_store::ImageDownloader;
pub use store::{CsvSink, SqlDumpSink, SqliteSink};
pub use logging::init_logging;
