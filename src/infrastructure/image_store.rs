//! Idempotent image retrieval keyed by a deterministic naming scheme
//!
//! Images land under `images/<subcategory>/<name-seed>_<index><ext>`, where
//! both path components are sanitized and the index is the 1-based position
//! of the address in the product's resolved image set. A destination path
//! that already exists is never re-fetched; the existing file is recorded as
//! if freshly downloaded. This path-based check is the system's only
//! download cache, and it is not content-aware: two source addresses that
//! sanitize to the same name collide silently.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::infrastructure::http_client::HttpClient;

const MAX_SUBCATEGORY_LEN: usize = 120;
const MAX_NAME_SEED_LEN: usize = 60;

/// Downloads a product's resolved image set to durable storage
pub struct ImageDownloader {
    http: HttpClient,
    images_dir: PathBuf,
    delay: Duration,
}

impl ImageDownloader {
    pub fn new(http: HttpClient, images_dir: PathBuf, image_delay_ms: u64) -> Self {
        Self {
            http,
            images_dir,
            delay: Duration::from_millis(image_delay_ms),
        }
    }

    /// Retrieve every image for one product, returning the local paths that
    /// were materialized (freshly downloaded or already present).
    ///
    /// An individual failure logs a warning and omits that image; it never
    /// aborts the product. A fixed pause follows each successful download.
    pub async fn download_for_product(
        &self,
        image_urls: &[String],
        subcategory: &str,
        name_seed: &str,
    ) -> Vec<String> {
        let target_dir = self
            .images_dir
            .join(sanitize_component(subcategory, MAX_SUBCATEGORY_LEN, "uncategorized"));
        if let Err(e) = fs::create_dir_all(&target_dir).await {
            warn!("Failed to create image directory {}: {}", target_dir.display(), e);
            return Vec::new();
        }

        let seed = sanitize_component(name_seed, MAX_NAME_SEED_LEN, "product");
        let mut saved = Vec::new();

        for (index, url) in image_urls.iter().enumerate() {
            let filename = format!("{}_{}{}", seed, index + 1, extension_for(url));
            let path = target_dir.join(filename);

            if path.exists() {
                debug!("Image already present, skipping fetch: {}", path.display());
                saved.push(path.to_string_lossy().into_owned());
                continue;
            }

            match self.http.fetch_bytes(url).await {
                Ok(bytes) => {
                    if let Err(e) = fs::write(&path, &bytes).await {
                        warn!("Failed to write image {}: {}", path.display(), e);
                        continue;
                    }
                    saved.push(path.to_string_lossy().into_owned());
                    sleep(self.delay).await;
                }
                Err(e) => warn!("Failed to download image {}: {}", url, e),
            }
        }

        saved
    }
}

/// Sanitize a string for use as a single path component: every character
/// that is not alphanumeric, space, hyphen or underscore becomes an
/// underscore, the result is truncated, and empty input falls back to the
/// given default. The result never contains a path separator and is never
/// empty.
pub fn sanitize_component(input: &str, max_len: usize, fallback: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect();

    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

/// Infer the local file extension from a source address's path suffix,
/// defaulting to `.jpg` when the path carries none.
pub fn extension_for(url: &str) -> String {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_default();

    match Path::new(&path).extension() {
        Some(ext) if !ext.is_empty() => format!(".{}", ext.to_string_lossy()),
        _ => ".jpg".to_string(),
    }
}
