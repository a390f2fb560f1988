//! Two-stage crawl engine
//!
//! Stage 1 (seeding) builds the frontier of product addresses from the seed
//! listing pages; stage 2 (extraction) visits each frontier entry, extracts
//! fields and images, and emits the record collection. The run is
//! single-threaded and sequential with a fixed pacing delay after each
//! network round trip. Nothing is fatal to the run: a failed seed loses only
//! that seed's links, a failed product loses only that record, and partial
//! progress already written to disk persists.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Result;
use scraper::Html;
use tokio::time::sleep;
use tracing::{info, warn};
use url::Url;

use crate::domain::product::{CrawlSummary, FrontierEntry, ProductRecord};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::error::ScrapeResult;
use crate::infrastructure::html_parser::{ExtractorConfig, ProductDataExtractor};
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::image_store::ImageDownloader;

pub struct CrawlEngine {
    http: HttpClient,
    extractor: ProductDataExtractor,
    images: ImageDownloader,
    seed_pages: Vec<String>,
    category: String,
    request_delay: Duration,
}

impl CrawlEngine {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let http = HttpClient::new(&config.http)?;
        let extractor = ProductDataExtractor::new(ExtractorConfig {
            base_url: config.crawl.base_url.clone(),
            product_path_marker: config.crawl.product_path_marker.clone(),
            ..Default::default()
        })?;
        let images = ImageDownloader::new(
            http.clone(),
            config.output.images_path(),
            config.crawl.image_delay_ms,
        );

        Ok(Self {
            http,
            extractor,
            images,
            seed_pages: config.crawl.seed_pages.clone(),
            category: config.crawl.category.clone(),
            request_delay: Duration::from_millis(config.crawl.request_delay_ms),
        })
    }

    /// Run the whole crawl: seeding, then per-product extraction.
    pub async fn execute(&self) -> Result<(Vec<ProductRecord>, CrawlSummary)> {
        let start = Instant::now();
        let mut summary = CrawlSummary::default();

        info!("Stage 1: building frontier from {} seed pages", self.seed_pages.len());
        let frontier = self.build_frontier(&mut summary).await;
        summary.products_discovered = frontier.len();
        info!("Stage 1 completed: {} product addresses discovered", frontier.len());

        info!("Stage 2: extracting {} products", frontier.len());
        let records = self.extract_products(frontier, &mut summary).await;

        info!(
            "Crawl completed in {:?}: {} records, {} images, {} products failed",
            start.elapsed(),
            records.len(),
            summary.images_downloaded,
            summary.products_failed
        );
        Ok((records, summary))
    }

    /// Visit every seed page, discover product links and the seed's
    /// subcategory label, and merge them into the frontier. A failed seed is
    /// logged and contributes nothing.
    async fn build_frontier(&self, summary: &mut CrawlSummary) -> Vec<FrontierEntry> {
        let mut frontier = Vec::new();
        let mut index = HashMap::new();

        for seed in &self.seed_pages {
            match self.http.fetch_html_string(seed).await {
                Ok(body) => {
                    let (links, label) = {
                        let document = Html::parse_document(&body);
                        let links = self.extractor.extract_product_links(&document);
                        let label = Url::parse(seed)
                            .map(|seed_url| {
                                self.extractor.extract_subcategory_label(&document, &seed_url)
                            })
                            .unwrap_or_default();
                        (links, label)
                    };
                    info!(
                        "Found {} product links on {} (subcategory: '{}')",
                        links.len(),
                        seed,
                        label
                    );
                    merge_into_frontier(&mut frontier, &mut index, links, &label);
                    summary.seeds_crawled += 1;
                }
                Err(e) => {
                    warn!("Skipping seed {}: {}", seed, e);
                    summary.seeds_failed += 1;
                }
            }
            sleep(self.request_delay).await;
        }

        frontier
    }

    /// Visit every frontier entry and emit the record collection. Records
    /// receive their id in emission order starting at 1; a failed product is
    /// logged and dropped.
    async fn extract_products(
        &self,
        frontier: Vec<FrontierEntry>,
        summary: &mut CrawlSummary,
    ) -> Vec<ProductRecord> {
        let mut records: Vec<ProductRecord> = Vec::new();

        for entry in frontier {
            match self.extract_one(&entry).await {
                Ok(mut record) => {
                    record.id = records.len() as u64 + 1;
                    summary.products_extracted += 1;
                    summary.images_downloaded += record.downloaded_images.len();
                    records.push(record);
                }
                Err(e) => {
                    warn!("Skipping product {}: {}", entry.url, e);
                    summary.products_failed += 1;
                }
            }
            sleep(self.request_delay).await;
        }

        records
    }

    /// Fetch one product page, extract its fields and image set, and
    /// download the images. Only the page fetch can fail; field extraction
    /// is best-effort and asset failures are absorbed downstream.
    async fn extract_one(&self, entry: &FrontierEntry) -> ScrapeResult<ProductRecord> {
        let body = self.http.fetch_html_string(&entry.url).await?;

        // The parsed document is dropped before the first await below.
        let (mut record, image_urls) = {
            let document = Html::parse_document(&body);
            let mut record = self.extractor.extract_record(&document, &entry.url, &self.category);
            let json_ld = self.extractor.extract_json_ld(&document, &entry.url);
            let image_urls = self.extractor.extract_image_urls(&document, json_ld.as_ref());
            record.subcategory = if entry.subcategory.is_empty() {
                self.category.clone()
            } else {
                entry.subcategory.clone()
            };
            (record, image_urls)
        };

        let name_seed = if record.sku.is_empty() {
            record.title.clone()
        } else {
            record.sku.clone()
        };
        record.downloaded_images = self
            .images
            .download_for_product(&image_urls, &record.subcategory, &name_seed)
            .await;
        record.image_urls = image_urls;

        Ok(record)
    }
}

/// Merge newly discovered links into the frontier. An address seen before
/// keeps its first-discovery position but takes the later seed's label
/// (accepted last-writer-wins policy); a new address is appended.
pub fn merge_into_frontier(
    frontier: &mut Vec<FrontierEntry>,
    index: &mut HashMap<String, usize>,
    links: Vec<String>,
    label: &str,
) {
    for url in links {
        match index.get(&url) {
            Some(&position) => frontier[position].subcategory = label.to_string(),
            None => {
                index.insert(url.clone(), frontier.len());
                frontier.push(FrontierEntry {
                    url,
                    subcategory: label.to_string(),
                });
            }
        }
    }
}
