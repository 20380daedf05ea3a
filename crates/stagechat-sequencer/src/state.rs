//! Payload and state types shared by the sequencer and its callers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique, time-ordered payload identifier (UUID v7).
pub type PayloadId = Uuid;

/// One instance of a system reply waiting to be revealed.
///
/// Identity is carried by [`Payload::id`]: two payloads with the same text
/// are still distinct instances and each gets its own full sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub id: PayloadId,
    pub text: String,
}

impl Payload {
    /// Create a new payload instance with a fresh id.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            text: text.into(),
        }
    }
}

/// Where the sequencer is in its progression.
///
/// ```text
/// Idle --(payload)--> RunningStep(1) --(step_delay)--> ... --(total_delay)--> Resolved
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequencerState {
    /// No payload in flight and no timers armed.
    Idle,
    /// Showing the given 1-based step.
    RunningStep(usize),
    /// Terminal for the payload; the completion hook has fired.
    Resolved(Payload),
}

impl SequencerState {
    /// Whether timers may still be outstanding in this state.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::RunningStep(_))
    }

    /// The resolved payload, if terminal.
    pub fn resolved(&self) -> Option<&Payload> {
        match self {
            Self::Resolved(p) => Some(p),
            _ => None,
        }
    }
}

impl std::fmt::Display for SequencerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::RunningStep(n) => write!(f, "step {n}"),
            Self::Resolved(_) => write!(f, "resolved"),
        }
    }
}

/// Snapshot of the current step, for progress display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView {
    /// 1-based step index.
    pub index: usize,
    /// Total number of steps.
    pub total: usize,
    /// Label of the current step.
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payloads_with_same_text_are_distinct() {
        let a = Payload::new("hello");
        let b = Payload::new("hello");
        assert_ne!(a.id, b.id);
        assert_ne!(a, b);
    }

    #[test]
    fn state_helpers() {
        let p = Payload::new("x");
        assert!(SequencerState::RunningStep(2).is_running());
        assert!(!SequencerState::Idle.is_running());
        assert_eq!(SequencerState::Resolved(p.clone()).resolved(), Some(&p));
        assert_eq!(SequencerState::RunningStep(3).to_string(), "step 3");
    }
}
