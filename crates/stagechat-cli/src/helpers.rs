//! Shared helpers for the CLI: tracing setup and reply producer selection.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use stagechat_adapters::{ReplyProducer, SearchReplyProducer, TemplateReplyProducer};

use crate::cli::ProducerKind;
use crate::config::AppConfig;

/// Default log file used while the TUI owns the terminal.
pub const DEFAULT_LOG_FILE: &str = "stagechat.log";

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize the global tracing subscriber writing to stderr.
pub fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Initialize the global tracing subscriber writing to `path`.
///
/// Used for the TUI, where anything written to the terminal would corrupt
/// the display.
pub fn init_file_tracing(default_level: &str, path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .compact()
        .init();
    Ok(())
}

// ---------------------------------------------------------------------------
// Reply producer
// ---------------------------------------------------------------------------

/// Build the reply producer selected on the command line.
///
/// The search producer needs its credential at startup; a missing key is
/// reported here rather than on the first request.
pub fn build_producer(kind: ProducerKind, config: &AppConfig) -> Result<Arc<dyn ReplyProducer>> {
    let producer: Arc<dyn ReplyProducer> = match kind {
        ProducerKind::Template => Arc::new(TemplateReplyProducer::new()),
        ProducerKind::Search => Arc::new(
            SearchReplyProducer::new(config.search_config())
                .context("search reply producer is not configured")?,
        ),
    };
    tracing::info!(producer = producer.name(), "reply producer selected");
    Ok(producer)
}
