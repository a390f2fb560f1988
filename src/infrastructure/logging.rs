//! Logging system configuration and initialization
//!
//! Builds a `tracing` subscriber with an `EnvFilter` driven by the config
//! level (overridable through `RUST_LOG`), a console layer, and an optional
//! non-blocking file layer. The file writer guard must outlive the process,
//! so it is parked in a global.

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use std::sync::Mutex;
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::infrastructure::config::LoggingConfig;

// Keeps the non-blocking log file writer alive for the process lifetime
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

/// Initialize the logging system from the logging configuration.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    if config.file_output {
        std::fs::create_dir_all(&config.log_dir)
            .with_context(|| format!("Failed to create log directory {}", config.log_dir.display()))?;
        let appender = tracing_appender::rolling::never(&config.log_dir, &config.log_file);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        LOG_GUARDS.lock().expect("log guard mutex poisoned").push(guard);

        Registry::default()
            .with(filter)
            .with(fmt::layer())
            .with(fmt::layer().with_ansi(false).with_writer(writer))
            .try_init()
            .context("Failed to initialize logging")?;
    } else {
        Registry::default()
            .with(filter)
            .with(fmt::layer())
            .try_init()
            .context("Failed to initialize logging")?;
    }

    Ok(())
}
