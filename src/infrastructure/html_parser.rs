//! HTML parsing and data extraction for retail product pages
//!
//! Provides the extractors for listing pages (product link discovery and
//! subcategory labeling) and product pages (field extraction with ordered
//! selector fallback chains, structured-metadata augmentation, and image
//! address resolution). Markup conventions vary across the site, so the
//! link scan is deliberately broad: any anchor qualifies and the
//! product-path filter rejects non-product links. Precision is sacrificed
//! for recall.

use std::collections::HashSet;

use anyhow::{Result, anyhow};
use chrono::Utc;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::domain::product::ProductRecord;
use crate::infrastructure::error::ScrapeError;

/// Extensions an anchor target must end in to count as a gallery image link
const IMAGE_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".webp"];

/// CSS selectors for listing pages
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    /// Selector for the page's primary heading
    pub heading: String,
    /// Fallback selector for the page title element
    pub page_title: String,
}

/// CSS selector fallback chains for product pages.
///
/// Each field is an ordered list of candidate selectors; the first one that
/// yields a non-empty text match wins, and the field is the empty string
/// when none match.
#[derive(Debug, Clone)]
pub struct ProductSelectors {
    pub title: Vec<String>,
    pub price: Vec<String>,
    pub unit_price: Vec<String>,
    pub description: Vec<String>,
    pub brand: Vec<String>,
    pub sku: Vec<String>,
}

/// Configuration for retail page data extraction
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub listing: ListingSelectors,
    pub product: ProductSelectors,
    /// Base URL for resolving relative links
    pub base_url: String,
    /// Path segment a link must contain to qualify as a product page
    pub product_path_marker: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            listing: ListingSelectors {
                heading: "h1".to_string(),
                page_title: ".page-title".to_string(),
            },
            product: ProductSelectors {
                title: vec![
                    "h1".to_string(),
                    ".product-title".to_string(),
                    ".page-title".to_string(),
                ],
                price: vec![".product-price".to_string(), ".price".to_string()],
                unit_price: vec![".unit-price".to_string()],
                description: vec![
                    ".product-description".to_string(),
                    ".short-description".to_string(),
                ],
                brand: vec![".brand".to_string()],
                sku: vec!["[data-sku]".to_string()],
            },
            base_url: "https://www.aldi.us".to_string(),
            product_path_marker: "/products/".to_string(),
        }
    }
}

/// Data extractor for retail listing and product pages
pub struct ProductDataExtractor {
    config: ExtractorConfig,
    base: Url,
    anchor_selector: Selector,
    image_selector: Selector,
    json_ld_selector: Selector,
}

impl ProductDataExtractor {
    /// Create a new extractor with default selectors for the configured origin.
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| anyhow!("Invalid base URL {}: {}", config.base_url, e))?;
        let anchor_selector = Selector::parse("a[href]")
            .map_err(|e| anyhow!("Invalid anchor selector: {}", e))?;
        let image_selector =
            Selector::parse("img").map_err(|e| anyhow!("Invalid image selector: {}", e))?;
        let json_ld_selector = Selector::parse(r#"script[type="application/ld+json"]"#)
            .map_err(|e| anyhow!("Invalid JSON-LD selector: {}", e))?;

        Ok(Self {
            config,
            base,
            anchor_selector,
            image_selector,
            json_ld_selector,
        })
    }

    /// Extract the deduplicated set of product page addresses from a listing
    /// document.
    ///
    /// Scans all anchors, resolves each against the configured origin, keeps
    /// only those whose path contains the product-path marker, and strips
    /// query components for identity. First-discovery order is preserved so
    /// output ordering is deterministic for identical markup.
    pub fn extract_product_links(&self, html: &Html) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for anchor in html.select(&self.anchor_selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Some(resolved) = self.resolve(href) else {
                continue;
            };
            if !resolved.path().contains(&self.config.product_path_marker) {
                continue;
            }
            push_unique(&mut seen, &mut links, resolved);
        }

        debug!("Extracted {} product links from listing page", links.len());
        links
    }

    /// Derive the subcategory label for a seed page: primary heading text if
    /// present, else the page title element, else the last non-empty path
    /// segment of the seed address. The label is derived once per seed and
    /// applies to every link discovered from it.
    pub fn extract_subcategory_label(&self, html: &Html, seed: &Url) -> String {
        let chain = [
            self.config.listing.heading.clone(),
            self.config.listing.page_title.clone(),
        ];
        let label = self.first_text(html, &chain);
        if !label.is_empty() {
            return label;
        }

        seed.path_segments()
            .and_then(|segments| {
                segments
                    .filter(|segment| !segment.is_empty())
                    .next_back()
                    .map(str::to_string)
            })
            .unwrap_or_default()
    }

    /// Extract a best-effort product record from a product document.
    ///
    /// `id`, `subcategory`, `image_urls` and `downloaded_images` are filled
    /// in later by the engine.
    pub fn extract_record(&self, html: &Html, product_url: &str, category: &str) -> ProductRecord {
        ProductRecord {
            id: 0,
            title: self.first_text(html, &self.config.product.title),
            price: self.first_text(html, &self.config.product.price),
            unit_price: self.first_text(html, &self.config.product.unit_price),
            description: self.first_text(html, &self.config.product.description),
            brand: self.first_text(html, &self.config.product.brand),
            sku: self.first_text(html, &self.config.product.sku),
            category: category.to_string(),
            subcategory: String::new(),
            product_url: product_url.to_string(),
            image_urls: Vec::new(),
            crawl_timestamp: Utc::now(),
            downloaded_images: Vec::new(),
        }
    }

    /// Parse the first embedded JSON-LD block, if any. A malformed block is
    /// treated as absent data rather than failing the extraction.
    pub fn extract_json_ld(&self, html: &Html, url: &str) -> Option<Value> {
        let script = html.select(&self.json_ld_selector).next()?;
        let raw: String = script.text().collect();
        match serde_json::from_str(raw.trim()) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("{}", ScrapeError::parse(url, e));
                None
            }
        }
    }

    /// Resolve the set of image addresses for one product by merging three
    /// sources: `img` source attributes (with lazy-load fallbacks), anchors
    /// targeting known image extensions, and the structured-metadata image
    /// field. Protocol-relative addresses are promoted to https and query
    /// components stripped before deduplication; first-seen order is kept.
    pub fn extract_image_urls(&self, html: &Html, json_ld: Option<&Value>) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();

        for image in html.select(&self.image_selector) {
            let element = image.value();
            let src = ["src", "data-src", "data-lazy-src"]
                .into_iter()
                .find_map(|attr| element.attr(attr).map(str::trim).filter(|s| !s.is_empty()));
            if let Some(resolved) = src.and_then(|s| self.resolve(s)) {
                push_unique(&mut seen, &mut urls, resolved);
            }
        }

        for anchor in html.select(&self.anchor_selector) {
            let resolved = anchor.value().attr("href").and_then(|href| self.resolve(href));
            if let Some(resolved) = resolved {
                let path = resolved.path().to_ascii_lowercase();
                if IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
                    push_unique(&mut seen, &mut urls, resolved);
                }
            }
        }

        if let Some(value) = json_ld {
            match value.get("image").or_else(|| value.get("images")) {
                Some(Value::String(address)) => {
                    if let Some(resolved) = self.resolve(address) {
                        push_unique(&mut seen, &mut urls, resolved);
                    }
                }
                Some(Value::Array(addresses)) => {
                    for address in addresses {
                        if let Some(resolved) = address.as_str().and_then(|s| self.resolve(s)) {
                            push_unique(&mut seen, &mut urls, resolved);
                        }
                    }
                }
                _ => {}
            }
        }

        urls
    }

    /// Evaluate a selector fallback chain: the first selector yielding a
    /// non-empty trimmed text match wins; none matching yields "".
    fn first_text(&self, html: &Html, chain: &[String]) -> String {
        for selector in chain {
            let Ok(parsed) = Selector::parse(selector) else {
                continue;
            };
            if let Some(element) = html.select(&parsed).next() {
                let text = element.text().collect::<String>().trim().to_string();
                if !text.is_empty() {
                    return text;
                }
            }
        }
        String::new()
    }

    /// Resolve a possibly-relative reference against the configured origin.
    /// Protocol-relative references are promoted to the secure scheme first.
    fn resolve(&self, href: &str) -> Option<Url> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        if let Some(rest) = href.strip_prefix("//") {
            return Url::parse(&format!("https://{rest}")).ok();
        }
        self.base.join(href).ok()
    }
}

fn push_unique(seen: &mut HashSet<String>, urls: &mut Vec<String>, mut url: Url) {
    url.set_query(None);
    let address = url.to_string();
    if seen.insert(address.clone()) {
        urls.push(address);
    }
}
