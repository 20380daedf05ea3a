//! # stagechat-store
//!
//! In-memory conversation state for stagechat.
//!
//! [`ConversationStore`] owns the ordered [`Message`] list and the reply
//! currently in flight.  Nothing is persisted; the conversation lives as long
//! as the process.

pub mod conversation;
pub mod message;

pub use conversation::{ConversationStore, Phase, ReplyTicket, Submission};
pub use message::{Message, Sender, TIMESTAMP_FORMAT};
