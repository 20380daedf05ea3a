//! Reply producers for stagechat.
//!
//! A reply producer turns the user's input into the text of the next system
//! reply.  Two strategies are provided behind the [`ReplyProducer`] trait:
//!
//! - [`TemplateReplyProducer`] -- picks one of a fixed set of sentences and
//!   drops the input into it.
//! - [`SearchReplyProducer`] -- sends one neural search request and formats
//!   the top results, falling back to a fixed apology on any failure.

pub mod error;
pub mod template;
pub mod traits;
pub mod web_search;

pub use error::{AdapterError, Result};
pub use template::{DEFAULT_TEMPLATES, TemplateReplyProducer, render_template};
pub use traits::ReplyProducer;
pub use web_search::{
    DEFAULT_SEARCH_ENDPOINT, MAX_RESULTS_SHOWN, SEARCH_API_KEY_ENV, SearchConfig,
    SearchReplyProducer, SearchResult, format_search_reply, not_found_reply, search_error_reply,
};
