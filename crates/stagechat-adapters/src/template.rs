//! Template reply producer -- fabricates a reply from canned sentences.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::error::{AdapterError, Result};
use crate::traits::ReplyProducer;

/// Placeholder replaced with the user's input.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Built-in reply templates.
pub const DEFAULT_TEMPLATES: [&str; 5] = [
    "I understand your question about \"{query}\". Here's what I think...",
    "Thanks for asking about \"{query}\". Let me explain...",
    "Regarding \"{query}\", the answer is quite interesting...",
    "\"{query}\" is an excellent question. Here's my perspective...",
    "I've analyzed \"{query}\" and can offer this insight...",
];

/// Picks one template at random and substitutes the input into it.
pub struct TemplateReplyProducer {
    templates: Vec<String>,
}

impl TemplateReplyProducer {
    /// Create a producer using [`DEFAULT_TEMPLATES`].
    pub fn new() -> Self {
        Self {
            templates: DEFAULT_TEMPLATES.iter().map(|t| (*t).to_owned()).collect(),
        }
    }

    /// Create a producer with custom templates.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::ConfigError`] if `templates` is empty.
    pub fn with_templates(templates: Vec<String>) -> Result<Self> {
        if templates.is_empty() {
            return Err(AdapterError::ConfigError(
                "template reply producer needs at least one template".into(),
            ));
        }
        Ok(Self { templates })
    }

    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    fn pick(&self) -> &str {
        self.templates
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(DEFAULT_TEMPLATES[0])
    }
}

impl Default for TemplateReplyProducer {
    fn default() -> Self {
        Self::new()
    }
}

/// Substitute `query` for every [`QUERY_PLACEHOLDER`] in `template`.
pub fn render_template(template: &str, query: &str) -> String {
    template.replace(QUERY_PLACEHOLDER, query)
}

#[async_trait]
impl ReplyProducer for TemplateReplyProducer {
    fn name(&self) -> &str {
        "template"
    }

    async fn produce(&self, input: &str) -> String {
        let reply = render_template(self.pick(), input);
        debug!(chars = reply.len(), "templated reply");
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_query() {
        assert_eq!(
            render_template("About \"{query}\": {query}!", "rust"),
            "About \"rust\": rust!"
        );
        assert_eq!(render_template("no placeholder", "rust"), "no placeholder");
    }

    #[test]
    fn empty_template_list_rejected() {
        assert!(matches!(
            TemplateReplyProducer::with_templates(vec![]),
            Err(AdapterError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn single_template_is_deterministic() {
        let producer =
            TemplateReplyProducer::with_templates(vec!["Echo: {query}".to_owned()]).unwrap();
        assert_eq!(producer.produce("weather").await, "Echo: weather");
    }

    #[tokio::test]
    async fn default_reply_is_one_of_the_templates() {
        let producer = TemplateReplyProducer::new();
        let expected: Vec<String> = DEFAULT_TEMPLATES
            .iter()
            .map(|t| render_template(t, "weather"))
            .collect();
        for _ in 0..20 {
            let reply = producer.produce("weather").await;
            assert!(expected.contains(&reply), "unexpected reply: {reply}");
        }
    }

    #[test]
    fn name_is_template() {
        assert_eq!(TemplateReplyProducer::new().name(), "template");
    }
}
