//! Conversation store.
//!
//! Holds the ordered message list and enforces the single-pending invariant:
//! from the moment a submission is accepted until its reply is revealed,
//! every further submission is silently dropped.
//!
//! # Phase lifecycle
//!
//! ```text
//! Idle --submit--> AwaitingReply(ticket) --reply_resolved--> Pending(payload)
//!   ^                                                              |
//!   +-------------------------on_reply_ready-----------------------+
//! ```

use stagechat_sequencer::Payload;
use tracing::debug;
use uuid::Uuid;

use crate::message::{Message, Sender};

/// Identifies one accepted submission while its reply is being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplyTicket(Uuid);

impl ReplyTicket {
    fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for ReplyTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// What the store is waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Ready to accept a submission.
    Idle,
    /// A reply producer is working on this ticket.
    AwaitingReply(ReplyTicket),
    /// The reply text is known and being revealed by the sequencer.
    Pending(Payload),
}

/// An accepted submission: the trimmed text and the ticket to answer it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub ticket: ReplyTicket,
    pub text: String,
}

/// Ordered conversation plus the reply currently in flight.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    messages: Vec<Message>,
    phase: Phase,
}

impl ConversationStore {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            phase: Phase::Idle,
        }
    }

    // -- Accessors ----------------------------------------------------------

    /// All messages in display order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The payload being revealed, if any.
    pub fn pending(&self) -> Option<&Payload> {
        match &self.phase {
            Phase::Pending(payload) => Some(payload),
            _ => None,
        }
    }

    /// Whether a reply is being produced (before the payload exists).
    pub fn is_awaiting_reply(&self) -> bool {
        matches!(self.phase, Phase::AwaitingReply(_))
    }

    /// Whether input must be disabled.
    pub fn is_busy(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    // -- Transitions --------------------------------------------------------

    /// Accept user input.
    ///
    /// Returns `None` without touching any state if the trimmed text is empty
    /// or a reply is already in flight.  Otherwise appends the user message
    /// and returns the ticket the reply must be delivered under.
    pub fn submit(&mut self, text: &str) -> Option<Submission> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if self.is_busy() {
            debug!("submission dropped: reply already in flight");
            return None;
        }

        self.messages.push(Message::user(text));
        let ticket = ReplyTicket::new();
        self.phase = Phase::AwaitingReply(ticket);
        debug!(%ticket, "submission accepted");

        Some(Submission {
            ticket,
            text: text.to_owned(),
        })
    }

    /// Record the produced reply text for `ticket`.
    ///
    /// Returns the new pending payload, or `None` if `ticket` is not the one
    /// being awaited.
    pub fn reply_resolved(
        &mut self,
        ticket: ReplyTicket,
        text: impl Into<String>,
    ) -> Option<Payload> {
        match self.phase {
            Phase::AwaitingReply(expected) if expected == ticket => {
                let payload = Payload::new(text);
                debug!(%ticket, payload_id = %payload.id, "reply pending");
                self.phase = Phase::Pending(payload.clone());
                Some(payload)
            }
            _ => {
                debug!(%ticket, "ignoring reply for stale ticket");
                None
            }
        }
    }

    /// Reveal `payload` as a system message and clear the pending state.
    ///
    /// Returns `false` (and changes nothing) unless `payload` is the pending
    /// instance.
    pub fn on_reply_ready(&mut self, payload: &Payload) -> bool {
        match &self.phase {
            Phase::Pending(pending) if pending.id == payload.id => {
                self.messages
                    .push(Message::new(Sender::System, payload.text.clone()));
                self.phase = Phase::Idle;
                debug!(payload_id = %payload.id, "reply revealed");
                true
            }
            _ => {
                debug!(payload_id = %payload.id, "ignoring completion for non-pending payload");
                false
            }
        }
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
