//! Web search reply producer -- one neural search request per submission.
//!
//! The user's raw text is sent to the configured search endpoint and the top
//! results are stitched into a single reply.  Every failure mode (transport
//! error, non-2xx status, undecodable body) degrades to a fixed apology that
//! names the query; nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::{AdapterError, Result};
use crate::traits::ReplyProducer;

// ═══════════════════════════════════════════════════════════════════════
//  Constants
// ═══════════════════════════════════════════════════════════════════════

/// Default search endpoint.
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.exa.ai/search";

/// Environment variable holding the search API key.
pub const SEARCH_API_KEY_ENV: &str = "STAGECHAT_SEARCH_API_KEY";

/// Default semantic search mode.
pub const DEFAULT_SEARCH_TYPE: &str = "neural";

/// Default number of results requested from the endpoint.
pub const DEFAULT_NUM_RESULTS: usize = 5;

/// Number of results included in a reply.
pub const MAX_RESULTS_SHOWN: usize = 3;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("stagechat/", env!("CARGO_PKG_VERSION"));

// ═══════════════════════════════════════════════════════════════════════
//  Configuration and wire types
// ═══════════════════════════════════════════════════════════════════════

/// Settings for [`SearchReplyProducer`], resolved at startup.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub endpoint: String,
    /// Bearer credential.  Must be injected; never compiled in.
    pub api_key: Option<String>,
    pub search_type: String,
    pub num_results: usize,
    pub max_results_shown: usize,
    pub timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_owned(),
            api_key: None,
            search_type: DEFAULT_SEARCH_TYPE.to_owned(),
            num_results: DEFAULT_NUM_RESULTS,
            max_results_shown: MAX_RESULTS_SHOWN,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// One hit from the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

// ═══════════════════════════════════════════════════════════════════════
//  Reply formatting
// ═══════════════════════════════════════════════════════════════════════

/// Reply used when the search succeeded but found nothing.
pub fn not_found_reply(query: &str) -> String {
    format!("I couldn't find any results for \"{query}\".")
}

/// Reply used when the search could not be completed.
pub fn search_error_reply(query: &str) -> String {
    format!(
        "Sorry, I couldn't complete the search for \"{query}\" right now. \
         Please try again later."
    )
}

/// Format up to `max_shown` results as `Result N: <text>` blocks under a
/// header naming the query.  An empty result list yields [`not_found_reply`].
pub fn format_search_reply(query: &str, results: &[SearchResult], max_shown: usize) -> String {
    if results.is_empty() || max_shown == 0 {
        return not_found_reply(query);
    }

    let body = results
        .iter()
        .take(max_shown)
        .enumerate()
        .map(|(i, r)| format!("Result {}: {}", i + 1, r.text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("Here's what I found about \"{query}\":\n\n{body}")
}

// ═══════════════════════════════════════════════════════════════════════
//  Producer
// ═══════════════════════════════════════════════════════════════════════

/// Reply producer backed by a remote neural search endpoint.
pub struct SearchReplyProducer {
    client: reqwest::Client,
    endpoint: url::Url,
    api_key: String,
    config: SearchConfig,
}

impl SearchReplyProducer {
    /// Create a producer from resolved configuration.
    ///
    /// # Errors
    ///
    /// - [`AdapterError::MissingCredential`] if no non-blank API key is set.
    /// - [`AdapterError::ConfigError`] if the endpoint is not a valid URL, no
    ///   results are requested, the timeout is zero, or the HTTP client cannot
    ///   be built.
    pub fn new(config: SearchConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AdapterError::MissingCredential {
                adapter: "search".into(),
                env_var: SEARCH_API_KEY_ENV.into(),
            })?
            .to_owned();

        let endpoint = url::Url::parse(&config.endpoint).map_err(|e| {
            AdapterError::ConfigError(format!("invalid search endpoint `{}`: {e}", config.endpoint))
        })?;

        if config.num_results == 0 {
            return Err(AdapterError::ConfigError(
                "search num_results must be at least 1".into(),
            ));
        }
        if config.timeout.is_zero() {
            return Err(AdapterError::ConfigError(
                "search timeout must be greater than zero".into(),
            ));
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AdapterError::ConfigError(format!("failed to build HTTP client: {e}")))?;

        info!(endpoint = %endpoint, search_type = %config.search_type, "search reply producer ready");

        Ok(Self {
            client,
            endpoint,
            api_key,
            config,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run one search request and decode its results.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let endpoint = self.endpoint.as_str();
        let body = json!({
            "query": query,
            "type": self.config.search_type,
            "numResults": self.config.num_results,
            "contents": { "text": true },
        });

        debug!(query, "performing search");

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AdapterError::RequestFailed {
                endpoint: endpoint.to_owned(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::HttpStatus {
                endpoint: endpoint.to_owned(),
                status: status.as_u16(),
            });
        }

        let parsed: SearchResponse =
            response
                .json()
                .await
                .map_err(|e| AdapterError::InvalidResponse {
                    endpoint: endpoint.to_owned(),
                    reason: e.to_string(),
                })?;

        debug!(count = parsed.results.len(), "search completed");
        Ok(parsed.results)
    }
}

#[async_trait]
impl ReplyProducer for SearchReplyProducer {
    fn name(&self) -> &str {
        "search"
    }

    async fn produce(&self, input: &str) -> String {
        match self.search(input).await {
            Ok(results) => format_search_reply(input, &results, self.config.max_results_shown),
            Err(e) => {
                warn!(error = %e, "search failed, replying with fallback");
                search_error_reply(input)
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn result(text: &str) -> SearchResult {
        SearchResult {
            text: text.to_owned(),
            url: None,
            title: None,
        }
    }

    fn config_with_key(key: Option<&str>) -> SearchConfig {
        SearchConfig {
            api_key: key.map(str::to_owned),
            ..SearchConfig::default()
        }
    }

    #[test]
    fn format_keeps_only_first_three() {
        let results: Vec<_> = ["one", "two", "three", "four", "five"]
            .iter()
            .map(|t| result(t))
            .collect();
        let reply = format_search_reply("weather", &results, MAX_RESULTS_SHOWN);
        assert_eq!(
            reply,
            "Here's what I found about \"weather\":\n\n\
             Result 1: one\n\nResult 2: two\n\nResult 3: three"
        );
        assert!(!reply.contains("four"));
    }

    #[test]
    fn format_fewer_than_three() {
        let reply = format_search_reply("rust", &[result("  only  ")], MAX_RESULTS_SHOWN);
        assert_eq!(reply, "Here's what I found about \"rust\":\n\nResult 1: only");
    }

    #[test]
    fn format_empty_is_not_found() {
        assert_eq!(
            format_search_reply("nothing", &[], MAX_RESULTS_SHOWN),
            not_found_reply("nothing")
        );
        assert!(not_found_reply("nothing").contains("couldn't find"));
        assert!(not_found_reply("nothing").contains("\"nothing\""));
    }

    #[test]
    fn error_reply_names_query() {
        assert!(search_error_reply("weather").contains("\"weather\""));
        assert_ne!(search_error_reply("weather"), not_found_reply("weather"));
    }

    #[test]
    fn missing_key_is_config_error() {
        assert!(matches!(
            SearchReplyProducer::new(config_with_key(None)),
            Err(AdapterError::MissingCredential { .. })
        ));
        assert!(matches!(
            SearchReplyProducer::new(config_with_key(Some("   "))),
            Err(AdapterError::MissingCredential { .. })
        ));
    }

    #[test]
    fn invalid_endpoint_rejected() {
        let config = SearchConfig {
            endpoint: "not a url".into(),
            ..config_with_key(Some("k"))
        };
        assert!(matches!(
            SearchReplyProducer::new(config),
            Err(AdapterError::ConfigError(_))
        ));
    }

    #[test]
    fn zero_results_requested_rejected() {
        let config = SearchConfig {
            num_results: 0,
            ..config_with_key(Some("k"))
        };
        assert!(SearchReplyProducer::new(config).is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = SearchConfig {
            timeout: Duration::ZERO,
            ..config_with_key(Some("k"))
        };
        assert!(matches!(
            SearchReplyProducer::new(config),
            Err(AdapterError::ConfigError(_))
        ));
    }

    #[test]
    fn decodes_results_with_optional_fields() {
        let body = r#"{"results":[{"text":"a","url":"https://x","title":"X"},{"text":"b"}]}"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].title.as_deref(), Some("X"));
        assert_eq!(parsed.results[1].url, None);
    }

    #[test]
    fn missing_results_field_is_empty() {
        let parsed: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.results.is_empty());
    }
}
