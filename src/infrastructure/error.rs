//! Error types for the crawl pipeline
//!
//! Every failure carries the address it occurred at and a rendered cause so
//! the operator can reproduce it manually. Nothing here is fatal to a run:
//! a fetch failure skips the unit it belongs to, a parse failure is treated
//! as absent data, an asset failure drops only that asset.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ScrapeError {
    #[error("fetch failed for {url}: {cause}")]
    Fetch { url: String, cause: String },

    #[error("parse failed for {url}: {cause}")]
    Parse { url: String, cause: String },

    #[error("asset retrieval failed for {url}: {cause}")]
    Asset { url: String, cause: String },
}

impl ScrapeError {
    pub fn fetch(url: &str, cause: impl ToString) -> Self {
        Self::Fetch {
            url: url.to_string(),
            cause: cause.to_string(),
        }
    }

    pub fn parse(url: &str, cause: impl ToString) -> Self {
        Self::Parse {
            url: url.to_string(),
            cause: cause.to_string(),
        }
    }

    pub fn asset(url: &str, cause: impl ToString) -> Self {
        Self::Asset {
            url: url.to_string(),
            cause: cause.to_string(),
        }
    }
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;
