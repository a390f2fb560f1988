//! Configuration infrastructure
//!
//! All tunables are carried in one `AppConfig` value threaded into each
//! component at construction, so components stay independently testable.
//! Configuration is organized into four sections:
//! 1. Crawl scope (seeds, origin, pacing)
//! 2. HTTP behavior (identity header, timeouts)
//! 3. Output layout (export files, image directory)
//! 4. Logging

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub crawl: CrawlConfig,
    pub http: HttpConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Crawl scope and pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Seed listing pages, absolute URLs under the target origin
    pub seed_pages: Vec<String>,

    /// Origin used to resolve relative links
    pub base_url: String,

    /// Category label applied to every record of the crawl
    pub category: String,

    /// Path segment a link must contain to qualify as a product page
    pub product_path_marker: String,

    /// Fixed pause between page requests in milliseconds
    pub request_delay_ms: u64,

    /// Fixed pause after each successful image download in milliseconds
    pub image_delay_ms: u64,
}

/// HTTP client behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Identity header sent with every request
    pub user_agent: String,

    /// Timeout for page requests in seconds
    pub page_timeout_seconds: u64,

    /// Timeout for image requests in seconds
    pub image_timeout_seconds: u64,

    /// Whether to follow redirects (limited to 10 hops)
    pub follow_redirects: bool,
}

/// Output file layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory all output artifacts live under
    pub output_dir: PathBuf,

    /// CSV export file name, relative to `output_dir`
    pub csv_file: String,

    /// SQLite database file name, relative to `output_dir`
    pub sqlite_file: String,

    /// SQL dump file name, relative to `output_dir`
    pub sql_dump_file: String,

    /// Image directory name, relative to `output_dir`
    pub images_dir: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable file output in addition to the console
    pub file_output: bool,

    /// Directory log files are written to
    pub log_dir: PathBuf,

    /// Log file name
    pub log_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            crawl: CrawlConfig::default(),
            http: HttpConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            seed_pages: vec![
                "https://www.aldi.us/products/thanksgiving/thanksgiving-desserts/k/257"
                    .to_string(),
            ],
            base_url: "https://www.aldi.us".to_string(),
            category: "Thanksgiving".to_string(),
            product_path_marker: "/products/".to_string(),
            request_delay_ms: 800,
            image_delay_ms: 120,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (compatible; ShelfCrawl/1.0; +https://example.com/bot)"
                .to_string(),
            page_timeout_seconds: 20,
            image_timeout_seconds: 30,
            follow_redirects: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            csv_file: "products.csv".to_string(),
            sqlite_file: "products.db".to_string(),
            sql_dump_file: "products.sql".to_string(),
            images_dir: "images".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_output: false,
            log_dir: PathBuf::from("logs"),
            log_file: "shelfcrawl.log".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file, falling back to defaults when
    /// the file does not exist.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

impl OutputConfig {
    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(&self.csv_file)
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.output_dir.join(&self.sqlite_file)
    }

    pub fn sql_dump_path(&self) -> PathBuf {
        self.output_dir.join(&self.sql_dump_file)
    }

    pub fn images_path(&self) -> PathBuf {
        self.output_dir.join(&self.images_dir)
    }

    /// Create the output directory tree if it does not exist yet.
    pub async fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.output_dir.display()))?;
        fs::create_dir_all(self.images_path())
            .await
            .with_context(|| format!("Failed to create {}", self.images_path().display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.crawl.product_path_marker, "/products/");
        assert_eq!(config.crawl.request_delay_ms, 800);
        assert_eq!(config.http.page_timeout_seconds, 20);
        assert_eq!(config.output.csv_path(), PathBuf::from("output/products.csv"));
        assert_eq!(config.output.images_path(), PathBuf::from("output/images"));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"crawl": {"category": "Holiday"}}"#).unwrap();
        assert_eq!(config.crawl.category, "Holiday");
        assert_eq!(config.crawl.base_url, "https://www.aldi.us");
        assert_eq!(config.logging.level, "info");
    }

    #[tokio::test]
    async fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("missing.json")).await.unwrap();
        assert_eq!(config.crawl.category, "Thanksgiving");
    }

    #[tokio::test]
    async fn test_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = AppConfig::default();
        config.crawl.seed_pages = vec!["https://example.com/products/snacks".to_string()];
        tokio::fs::write(&path, serde_json::to_string_pretty(&config).unwrap())
            .await
            .unwrap();

        let loaded = AppConfig::load(&path).await.unwrap();
        assert_eq!(loaded.crawl.seed_pages, config.crawl.seed_pages);
    }
}
