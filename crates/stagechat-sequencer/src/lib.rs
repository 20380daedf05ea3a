//! Staged delay sequencer.
//!
//! Reveals a pending reply only after a perceived "working" period that is
//! broken into labeled steps:
//!
//! - **[`config`]** -- [`SequencerConfig`]: total delay, step spacing, labels,
//!   validated on construction.
//! - **[`state`]** -- [`Payload`], [`SequencerState`] and the [`StepView`]
//!   used for progress display.
//! - **[`sequencer`]** -- [`Sequencer`]: arms tokio timers for each step,
//!   cancels superseded payloads by generation, and fires its completion hook
//!   exactly once per resolved payload.  Step changes can be watched through
//!   [`Sequencer::step_events`].
//! - **[`error`]** -- configuration errors via [`thiserror`].

pub mod config;
pub mod error;
pub mod sequencer;
pub mod state;

pub use config::{DEFAULT_STEP_DELAY, DEFAULT_STEP_LABELS, DEFAULT_TOTAL_DELAY, SequencerConfig};
pub use error::{Result, SequencerError};
pub use sequencer::{CompletionHook, Sequencer};
pub use state::{Payload, PayloadId, SequencerState, StepView};
