//! Sequencer error types.
//!
//! The timing logic itself has no failure mode; every variant here describes
//! a [`SequencerConfig`](crate::SequencerConfig) that was rejected at
//! construction time.

use std::time::Duration;

/// Unified error type for the staged delay sequencer.
#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    /// The configuration declares no steps at all.
    #[error("sequencer config must declare at least one step label")]
    NoSteps,

    /// A step label is empty or whitespace-only.
    #[error("step label at index {index} is blank")]
    BlankLabel { index: usize },

    /// The total delay ends before the last step would start.
    #[error(
        "total delay {total:?} is shorter than the {required:?} needed to reach the final step"
    )]
    TotalDelayTooShort {
        /// The configured total delay.
        total: Duration,
        /// `step_delay * (steps - 1)`.
        required: Duration,
    },

    /// `step_delay * (steps - 1)` does not fit in a [`Duration`].
    #[error("step schedule overflows: {steps} steps of {step_delay:?}")]
    ScheduleOverflow { steps: usize, step_delay: Duration },
}

/// Convenience alias used throughout the sequencer crate.
pub type Result<T> = std::result::Result<T, SequencerError>;
