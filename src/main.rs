//! ShelfCrawl command-line entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use shelfcrawl::domain::product::SnapshotSink;
use shelfcrawl::infrastructure::config::AppConfig;
use shelfcrawl::infrastructure::logging::init_logging;
use shelfcrawl::infrastructure::store::{CsvSink, SqlDumpSink, SqliteSink};
use shelfcrawl::CrawlEngine;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the JSON config file
    #[arg(long, default_value = "shelfcrawl.json")]
    config: PathBuf,

    /// Seed listing pages (overrides the config when given; repeatable)
    #[arg(long = "seed")]
    seeds: Vec<String>,

    /// Output directory (overrides the config)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Category label applied to every record (overrides the config)
    #[arg(long)]
    category: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(&args.config).await?;
    if !args.seeds.is_empty() {
        config.crawl.seed_pages = args.seeds.clone();
    }
    if let Some(output_dir) = &args.output_dir {
        config.output.output_dir = output_dir.clone();
    }
    if let Some(category) = &args.category {
        config.crawl.category = category.clone();
    }

    init_logging(&config.logging)?;
    config.output.ensure_dirs().await?;

    let engine = CrawlEngine::new(&config)?;
    let (records, summary) = engine.execute().await?;

    let sinks: Vec<Box<dyn SnapshotSink>> = vec![
        Box::new(CsvSink::new(config.output.csv_path())),
        Box::new(SqliteSink::new(config.output.sqlite_path())),
        Box::new(SqlDumpSink::new(config.output.sql_dump_path())),
    ];
    for sink in &sinks {
        sink.persist(&records).await?;
    }

    info!(
        "Done. {} products ({} discovered, {} failed), {} images, output in {}",
        summary.products_extracted,
        summary.products_discovered,
        summary.products_failed,
        summary.images_downloaded,
        config.output.output_dir.display()
    );
    Ok(())
}
