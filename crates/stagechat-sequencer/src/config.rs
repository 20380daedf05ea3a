//! Static timing configuration for the sequencer.

use std::time::Duration;

use crate::error::{Result, SequencerError};

/// Default time from payload arrival to resolution.
pub const DEFAULT_TOTAL_DELAY: Duration = Duration::from_millis(9000);

/// Default spacing between consecutive step starts.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(2000);

/// Default step labels, one per step.
pub const DEFAULT_STEP_LABELS: [&str; 3] = [
    "Understanding your question",
    "Searching the web",
    "Finding relevant results",
];

/// Validated timing configuration.
///
/// Step `i` (1-based) starts at `(i - 1) * step_delay`; the payload resolves
/// at `total_delay`.  Whatever remains after the last step starts is spent
/// displaying that last step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencerConfig {
    total_delay: Duration,
    step_delay: Duration,
    step_labels: Vec<String>,
}

impl SequencerConfig {
    /// Build a configuration, rejecting schedules that cannot be honoured.
    ///
    /// # Errors
    ///
    /// - [`SequencerError::NoSteps`] if `step_labels` is empty.
    /// - [`SequencerError::BlankLabel`] if any label is blank.
    /// - [`SequencerError::TotalDelayTooShort`] if `total_delay` ends before
    ///   the last step starts.
    pub fn new(
        total_delay: Duration,
        step_delay: Duration,
        step_labels: Vec<String>,
    ) -> Result<Self> {
        if step_labels.is_empty() {
            return Err(SequencerError::NoSteps);
        }
        if let Some(index) = step_labels.iter().position(|l| l.trim().is_empty()) {
            return Err(SequencerError::BlankLabel { index });
        }

        let steps = step_labels.len();
        let required = u32::try_from(steps - 1)
            .ok()
            .and_then(|n| step_delay.checked_mul(n))
            .ok_or(SequencerError::ScheduleOverflow { steps, step_delay })?;

        if total_delay < required {
            return Err(SequencerError::TotalDelayTooShort {
                total: total_delay,
                required,
            });
        }

        Ok(Self {
            total_delay,
            step_delay,
            step_labels,
        })
    }

    /// Time from payload arrival until the payload resolves.
    pub fn total_delay(&self) -> Duration {
        self.total_delay
    }

    /// Spacing between consecutive step starts.
    pub fn step_delay(&self) -> Duration {
        self.step_delay
    }

    /// All step labels in order.
    pub fn step_labels(&self) -> &[String] {
        &self.step_labels
    }

    /// Number of steps in the schedule.
    pub fn step_count(&self) -> usize {
        self.step_labels.len()
    }

    /// Label for the 1-based `step`, clamped to the last label.
    pub fn label(&self, step: usize) -> &str {
        let idx = step.clamp(1, self.step_labels.len()) - 1;
        &self.step_labels[idx]
    }

    /// Offset from payload arrival at which `step` begins.
    ///
    /// Step 1 starts immediately.
    pub fn step_start(&self, step: usize) -> Duration {
        let n = u32::try_from(step.saturating_sub(1)).unwrap_or(u32::MAX);
        self.step_delay.saturating_mul(n)
    }
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            total_delay: DEFAULT_TOTAL_DELAY,
            step_delay: DEFAULT_STEP_DELAY,
            step_labels: DEFAULT_STEP_LABELS.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
