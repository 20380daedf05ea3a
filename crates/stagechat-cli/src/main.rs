//! CLI entry point for stagechat.
//!
//! This binary provides the `stagechat` command: the terminal chat by
//! default, or a one-shot `ask` that prints the staged reply to stdout.

mod cli;
mod config;
mod helpers;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;

use stagechat_adapters::ReplyProducer;
use stagechat_sequencer::{Sequencer, SequencerConfig};
use stagechat_store::{ConversationStore, Sender};

use crate::cli::{Cli, Commands, DEFAULT_CONFIG_PATH};
use crate::config::AppConfig;
use crate::helpers::{DEFAULT_LOG_FILE, build_producer, init_file_tracing, init_tracing};

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env is fine; the environment may already carry the key.
    let _ = dotenvy::dotenv();

    let (config_path, required) = match &cli.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };
    let config = AppConfig::load(&config_path, required)?;

    match cli.command.as_ref().unwrap_or(&Commands::Chat) {
        Commands::Chat => {
            let log_file = config
                .log_file
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
            init_file_tracing(&cli.log_level, &log_file)?;
            cmd_chat(&cli, &config).await
        }
        Commands::Ask { text } => {
            init_tracing(&cli.log_level);
            cmd_ask(&cli, &config, &text.join(" ")).await
        }
    }
}

// ---------------------------------------------------------------------------
// Subcommand: chat
// ---------------------------------------------------------------------------

async fn cmd_chat(cli: &Cli, config: &AppConfig) -> Result<()> {
    let sequencer_config = config.sequencer_config()?;
    let producer = build_producer(cli.producer, config)?;

    info!(
        total_ms = sequencer_config.total_delay().as_millis() as u64,
        steps = sequencer_config.step_count(),
        "starting stagechat"
    );

    stagechat_tui::run_tui(producer, sequencer_config)
        .await
        .context("terminal UI failed")
}

// ---------------------------------------------------------------------------
// Subcommand: ask
// ---------------------------------------------------------------------------

async fn cmd_ask(cli: &Cli, config: &AppConfig, question: &str) -> Result<()> {
    let sequencer_config = config.sequencer_config()?;
    let producer = build_producer(cli.producer, config)?;

    let transcript =
        ask_once(producer, sequencer_config, question, |line| println!("{line}")).await?;

    for message in transcript.messages() {
        let who = match message.sender {
            Sender::User => "You",
            Sender::System => "System",
        };
        println!("\n[{}] {who}:\n{}", message.timestamp, message.content);
    }
    Ok(())
}

/// Run one submission through the store and the sequencer, reporting each
/// step through `on_step` as it begins.
async fn ask_once(
    producer: Arc<dyn ReplyProducer>,
    sequencer_config: SequencerConfig,
    question: &str,
    mut on_step: impl FnMut(String),
) -> Result<ConversationStore> {
    let mut store = ConversationStore::new();
    let Some(submission) = store.submit(question) else {
        bail!("nothing to ask: the question is empty");
    };

    let text = producer.produce(&submission.text).await;
    let payload = store
        .reply_resolved(submission.ticket, text)
        .context("reply arrived for an unknown submission")?;

    let (done_tx, mut done_rx) = tokio::sync::mpsc::unbounded_channel();
    let sequencer = Sequencer::new(sequencer_config, move |resolved| {
        let _ = done_tx.send(resolved);
    });
    let mut steps = sequencer.step_events();
    sequencer.set_payload(Some(payload));

    // Steps are queued before the completion hook runs, so draining them
    // first never drops the last one.
    let resolved = loop {
        tokio::select! {
            biased;
            Some(step) = steps.recv() => {
                on_step(format!("[{}/{}] {}...", step.index, step.total, step.label));
            }
            resolved = done_rx.recv() => {
                break resolved.context("sequencer stopped without resolving")?;
            }
        }
    };

    store.on_reply_ready(&resolved);
    sequencer.set_payload(store.pending().cloned());
    Ok(store)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
