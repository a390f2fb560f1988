use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One extracted product, the unit of output.
///
/// All free-text fields hold the empty string when the source page did not
/// yield a value; they are never null. `product_url` uniquely identifies a
/// record within a run, while `id` is a presentation counter assigned in
/// emission order starting at 1 and must not be used for identity across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: u64,
    pub title: String,
    pub price: String,
    pub unit_price: String,
    pub description: String,
    pub brand: String,
    pub sku: String,
    pub category: String,
    pub subcategory: String,
    pub product_url: String,
    pub image_urls: Vec<String>,
    pub crawl_timestamp: DateTime<Utc>,
    pub downloaded_images: Vec<String>,
}

/// A product address awaiting extraction, tagged with the subcategory label
/// of the seed page it was discovered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    pub subcategory: String,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlSummary {
    pub seeds_crawled: usize,
    pub seeds_failed: usize,
    pub products_discovered: usize,
    pub products_extracted: usize,
    pub products_failed: usize,
    pub images_downloaded: usize,
}

/// Persistence collaborator: accepts the completed record collection.
///
/// Implementations must serialize list-valued fields losslessly and may
/// assume `product_url` values are pairwise distinct within the slice.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn persist(&self, records: &[ProductRecord]) -> anyhow::Result<()>;
}
