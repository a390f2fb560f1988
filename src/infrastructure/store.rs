//! Persistence sinks for the completed record collection
//!
//! Three `SnapshotSink` implementations: a CSV export, a SQLite database
//! keyed on `product_url` so re-runs replace rows instead of appending
//! shifted duplicates, and a plain SQL dump of the same table. List-valued
//! fields are serialized as JSON arrays in every form, timestamps as
//! RFC 3339.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::fs;
use tracing::info;

use crate::domain::product::{ProductRecord, SnapshotSink};

const CSV_HEADER: [&str; 13] = [
    "id",
    "title",
    "price",
    "unit_price",
    "description",
    "brand",
    "sku",
    "category",
    "subcategory",
    "product_url",
    "image_urls",
    "crawl_timestamp",
    "downloaded_images",
];

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS products (
  product_url TEXT PRIMARY KEY,
  id INTEGER,
  title TEXT,
  price TEXT,
  unit_price TEXT,
  description TEXT,
  brand TEXT,
  sku TEXT,
  category TEXT,
  subcategory TEXT,
  image_urls TEXT,
  crawl_timestamp TEXT,
  downloaded_images TEXT
)";

const INSERT_SQL: &str = "INSERT OR REPLACE INTO products \
  (product_url, id, title, price, unit_price, description, brand, sku, \
   category, subcategory, image_urls, crawl_timestamp, downloaded_images) \
  VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// Tabular CSV export
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl SnapshotSink for CsvSink {
    async fn persist(&self, records: &[ProductRecord]) -> Result<()> {
        let mut writer = csv::Writer::from_path(&self.path)
            .with_context(|| format!("Failed to open CSV file: {}", self.path.display()))?;

        writer.write_record(CSV_HEADER)?;
        for record in records {
            writer.write_record(&[
                record.id.to_string(),
                record.title.clone(),
                record.price.clone(),
                record.unit_price.clone(),
                record.description.clone(),
                record.brand.clone(),
                record.sku.clone(),
                record.category.clone(),
                record.subcategory.clone(),
                record.product_url.clone(),
                serde_json::to_string(&record.image_urls)?,
                record.crawl_timestamp.to_rfc3339(),
                serde_json::to_string(&record.downloaded_images)?,
            ])?;
        }
        writer.flush()?;

        info!("CSV saved to {} ({} records)", self.path.display(), records.len());
        Ok(())
    }
}

/// Relational SQLite storage
pub struct SqliteSink {
    path: PathBuf,
}

impl SqliteSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl SnapshotSink for SqliteSink {
    async fn persist(&self, records: &[ProductRecord]) -> Result<()> {
        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open SQLite DB: {}", self.path.display()))?;

        sqlx::query(CREATE_TABLE_SQL).execute(&pool).await?;

        for record in records {
            sqlx::query(INSERT_SQL)
                .bind(&record.product_url)
                .bind(record.id as i64)
                .bind(&record.title)
                .bind(&record.price)
                .bind(&record.unit_price)
                .bind(&record.description)
                .bind(&record.brand)
                .bind(&record.sku)
                .bind(&record.category)
                .bind(&record.subcategory)
                .bind(serde_json::to_string(&record.image_urls)?)
                .bind(record.crawl_timestamp.to_rfc3339())
                .bind(serde_json::to_string(&record.downloaded_images)?)
                .execute(&pool)
                .await?;
        }

        pool.close().await;
        info!("SQLite DB saved to {} ({} records)", self.path.display(), records.len());
        Ok(())
    }
}

/// Plain SQL dump of the products table
pub struct SqlDumpSink {
    path: PathBuf,
}

impl SqlDumpSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl SnapshotSink for SqlDumpSink {
    async fn persist(&self, records: &[ProductRecord]) -> Result<()> {
        let mut dump = String::new();
        dump.push_str(CREATE_TABLE_SQL);
        dump.push_str(";\n");

        for record in records {
            let values = [
                sql_quote(&record.product_url),
                record.id.to_string(),
                sql_quote(&record.title),
                sql_quote(&record.price),
                sql_quote(&record.unit_price),
                sql_quote(&record.description),
                sql_quote(&record.brand),
                sql_quote(&record.sku),
                sql_quote(&record.category),
                sql_quote(&record.subcategory),
                sql_quote(&serde_json::to_string(&record.image_urls)?),
                sql_quote(&record.crawl_timestamp.to_rfc3339()),
                sql_quote(&serde_json::to_string(&record.downloaded_images)?),
            ];
            dump.push_str(&format!(
                "INSERT OR REPLACE INTO products VALUES ({});\n",
                values.join(", ")
            ));
        }

        fs::write(&self.path, dump)
            .await
            .with_context(|| format!("Failed to write SQL dump: {}", self.path.display()))?;

        info!("SQL dump saved to {}", self.path.display());
        Ok(())
    }
}

/// Quote a string literal for the SQL dump, doubling embedded quotes.
fn sql_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::Row;

    fn sample_record(id: u64, product_url: &str) -> ProductRecord {
        ProductRecord {
            id,
            title: "Pumpkin Pie".to_string(),
            price: "$4.49".to_string(),
            unit_price: "$0.56/oz".to_string(),
            description: "A pie".to_string(),
            brand: "Bake Shop".to_string(),
            sku: "SKU-1".to_string(),
            category: "Thanksgiving".to_string(),
            subcategory: "Desserts".to_string(),
            product_url: product_url.to_string(),
            image_urls: vec!["https://cdn.example.com/a.jpg".to_string()],
            crawl_timestamp: Utc::now(),
            downloaded_images: vec!["output/images/Desserts/SKU-1_1.jpg".to_string()],
        }
    }

    #[tokio::test]
    async fn test_csv_sink_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");
        let records = vec![sample_record(1, "https://shop.example.com/products/pie")];

        CsvSink::new(path.clone()).persist(&records).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), CSV_HEADER.join(","));
        let row = lines.next().unwrap();
        assert!(row.starts_with("1,Pumpkin Pie,"));
        assert!(row.contains("https://shop.example.com/products/pie"));
    }

    #[tokio::test]
    async fn test_sqlite_sink_upserts_on_rerun() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.db");
        let sink = SqliteSink::new(path.clone());

        let records = vec![
            sample_record(1, "https://shop.example.com/products/pie"),
            sample_record(2, "https://shop.example.com/products/cider"),
        ];
        sink.persist(&records).await.unwrap();
        // A second run with the same product URLs must replace, not append.
        sink.persist(&records).await.unwrap();

        let options = SqliteConnectOptions::new().filename(&path);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        let row = sqlx::query("SELECT COUNT(*) AS n FROM products")
            .fetch_one(&pool)
            .await
            .unwrap();
        let count: i64 = row.get("n");
        assert_eq!(count, 2);
        pool.close().await;
    }

    #[tokio::test]
    async fn test_sql_dump_escapes_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.sql");
        let mut record = sample_record(1, "https://shop.example.com/products/pie");
        record.title = "Baker's Choice".to_string();

        SqlDumpSink::new(path.clone()).persist(&[record]).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("CREATE TABLE IF NOT EXISTS products"));
        assert!(content.contains("'Baker''s Choice'"));
    }

    #[test]
    fn test_sql_quote() {
        assert_eq!(sql_quote("plain"), "'plain'");
        assert_eq!(sql_quote("it's"), "'it''s'");
    }
}
