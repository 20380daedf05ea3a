//! CLI argument definitions for stagechat.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// stagechat -- a chat that takes its time to answer.
#[derive(Parser)]
#[command(
    name = "stagechat",
    version,
    about = "stagechat -- chat with a staged, delayed response",
    long_about = "A terminal chat that reveals each reply after a multi-step delay. \
                  Replies are either templated locally or built from web search results."
)]
pub struct Cli {
    /// Where replies come from.
    #[arg(long, short, value_enum, default_value_t = ProducerKind::Template, global = true)]
    pub producer: ProducerKind,

    /// Path to the TOML configuration file.
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Default log level when `RUST_LOG` is not set.
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the terminal chat (default).
    Chat,

    /// Ask a single question and print the staged reply to stdout.
    Ask {
        /// The question to ask.
        #[arg(required = true)]
        text: Vec<String>,
    },
}

/// Which reply producer to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProducerKind {
    /// Canned sentences with the question filled in.
    Template,
    /// Top results from the configured web search endpoint.
    Search,
}
