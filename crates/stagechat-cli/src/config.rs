//! Application configuration.
//!
//! Defaults are compiled in.  An optional TOML file can override timing and
//! search settings; credentials only ever come from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use stagechat_adapters::{SEARCH_API_KEY_ENV, SearchConfig};
use stagechat_adapters::web_search::{
    DEFAULT_NUM_RESULTS, DEFAULT_SEARCH_ENDPOINT, DEFAULT_SEARCH_TYPE, DEFAULT_TIMEOUT,
    MAX_RESULTS_SHOWN,
};
use stagechat_sequencer::{
    DEFAULT_STEP_DELAY, DEFAULT_STEP_LABELS, DEFAULT_TOTAL_DELAY, SequencerConfig,
};

// ---------------------------------------------------------------------------
// File layout
// ---------------------------------------------------------------------------

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Where the TUI writes its logs.
    pub log_file: Option<PathBuf>,
    pub sequencer: SequencerSection,
    pub search: SearchSection,
}

/// `[sequencer]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SequencerSection {
    pub total_delay_ms: u64,
    pub step_delay_ms: u64,
    pub step_labels: Vec<String>,
}

/// `[search]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchSection {
    pub endpoint: String,
    pub search_type: String,
    pub num_results: usize,
    pub timeout_secs: u64,
}

impl Default for SequencerSection {
    fn default() -> Self {
        Self {
            total_delay_ms: DEFAULT_TOTAL_DELAY.as_millis() as u64,
            step_delay_ms: DEFAULT_STEP_DELAY.as_millis() as u64,
            step_labels: DEFAULT_STEP_LABELS.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_owned(),
            search_type: DEFAULT_SEARCH_TYPE.to_owned(),
            num_results: DEFAULT_NUM_RESULTS,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults unless `required` is set (the user
    /// named the file explicitly).  A file that exists but does not parse is
    /// always an error.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Build the validated sequencer timing.
    pub fn sequencer_config(&self) -> Result<SequencerConfig> {
        let s = &self.sequencer;
        SequencerConfig::new(
            Duration::from_millis(s.total_delay_ms),
            Duration::from_millis(s.step_delay_ms),
            s.step_labels.clone(),
        )
        .context("invalid [sequencer] configuration")
    }

    /// Build search settings, taking the credential from the environment.
    pub fn search_config(&self) -> SearchConfig {
        self.search_config_with_key(std::env::var(SEARCH_API_KEY_ENV).ok())
    }

    /// Build search settings with an explicit credential.
    pub fn search_config_with_key(&self, api_key: Option<String>) -> SearchConfig {
        let s = &self.search;
        SearchConfig {
            endpoint: s.endpoint.clone(),
            api_key,
            search_type: s.search_type.clone(),
            num_results: s.num_results,
            max_results_shown: MAX_RESULTS_SHOWN,
            timeout: Duration::from_secs(s.timeout_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
