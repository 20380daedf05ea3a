//! Timer-driven step sequencer.
//!
//! A [`Sequencer`] turns a pending [`Payload`] into a staged reveal: it shows
//! step 1 immediately, advances one step every `step_delay`, and resolves the
//! payload at `total_delay`, invoking its completion hook exactly once.
//!
//! # Cancellation
//!
//! Each payload instance runs under its own *generation*.  Replacing or
//! clearing the payload aborts every timer of the current generation and bumps
//! the counter before anything new is armed.  Timer callbacks re-check their
//! generation under the lock when they fire, so a timer that slipped past the
//! abort still cannot touch state belonging to a newer payload.
//!
//! # Step notifications
//!
//! [`Sequencer::step_events`] hands out a receiver that gets one [`StepView`]
//! per step entered, in order, before the completion hook runs.  Steps that
//! share an instant with resolution are still reported.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

use crate::config::SequencerConfig;
use crate::state::{Payload, SequencerState, StepView};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Callback invoked once per resolved payload.
///
/// Runs on a tokio worker after the sequencer lock has been released, so it
/// may call back into the [`Sequencer`].
pub type CompletionHook = Arc<dyn Fn(Payload) + Send + Sync>;

/// Mutable state shared with armed timers.
struct Inner {
    /// Bumped on every payload change; timers compare against it when firing.
    generation: u64,
    state: SequencerState,
    /// The payload instance the current generation belongs to.
    payload: Option<Payload>,
    /// Timers armed for the current generation.
    timers: Vec<JoinHandle<()>>,
    /// Receivers handed out by [`Sequencer::step_events`].
    step_watchers: Vec<mpsc::UnboundedSender<StepView>>,
}

impl Inner {
    /// Abort all armed timers and start a new generation.
    fn invalidate(&mut self) {
        for timer in self.timers.drain(..) {
            timer.abort();
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Enter `step` and tell every live watcher.
    fn enter_step(&mut self, config: &SequencerConfig, step: usize) {
        self.state = SequencerState::RunningStep(step);
        let view = StepView {
            index: step,
            total: config.step_count(),
            label: config.label(step).to_owned(),
        };
        self.step_watchers
            .retain(|watcher| watcher.send(view.clone()).is_ok());
    }
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

/// Staged delay sequencer.
///
/// Must be driven from within a tokio runtime: setting a payload spawns one
/// sleeping task per step boundary plus one for resolution.
pub struct Sequencer {
    config: Arc<SequencerConfig>,
    inner: Arc<Mutex<Inner>>,
    on_complete: CompletionHook,
}

impl Sequencer {
    /// Create an idle sequencer.
    pub fn new<F>(config: SequencerConfig, on_complete: F) -> Self
    where
        F: Fn(Payload) + Send + Sync + 'static,
    {
        Self {
            config: Arc::new(config),
            inner: Arc::new(Mutex::new(Inner {
                generation: 0,
                state: SequencerState::Idle,
                payload: None,
                timers: Vec::new(),
                step_watchers: Vec::new(),
            })),
            on_complete: Arc::new(on_complete),
        }
    }

    /// The timing configuration.
    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SequencerState {
        self.inner.lock().state.clone()
    }

    /// Whether a payload is currently stepping towards resolution.
    pub fn is_running(&self) -> bool {
        self.inner.lock().state.is_running()
    }

    /// The payload instance the sequencer is currently tracking, if any.
    pub fn payload(&self) -> Option<Payload> {
        self.inner.lock().payload.clone()
    }

    /// Current generation counter.
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Number of timers still armed for the current generation.
    pub fn armed_timers(&self) -> usize {
        self.inner
            .lock()
            .timers
            .iter()
            .filter(|t| !t.is_finished())
            .count()
    }

    /// Current step with its label, or `None` unless running.
    pub fn current_step(&self) -> Option<StepView> {
        match self.inner.lock().state {
            SequencerState::RunningStep(index) => Some(StepView {
                index,
                total: self.config.step_count(),
                label: self.config.label(index).to_owned(),
            }),
            _ => None,
        }
    }

    /// Subscribe to step changes.
    ///
    /// Every step entered after this call is delivered, including the first
    /// step of each new payload.  Dropping the receiver unsubscribes.
    pub fn step_events(&self) -> mpsc::UnboundedReceiver<StepView> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().step_watchers.push(tx);
        rx
    }

    /// Hand the sequencer a new payload, or clear it.
    ///
    /// - Same instance as the one already tracked: no-op.
    /// - A different instance: the previous generation is cancelled, then the
    ///   sequence restarts at step 1.
    /// - `None`: the previous generation is cancelled and the sequencer
    ///   returns to [`SequencerState::Idle`].
    pub fn set_payload(&self, payload: Option<Payload>) {
        let mut inner = self.inner.lock();

        match (&inner.payload, &payload) {
            (Some(current), Some(next)) if current.id == next.id => return,
            (None, None) => return,
            _ => {}
        }

        let had_timers = !inner.timers.is_empty();
        inner.invalidate();

        match payload {
            None => {
                inner.payload = None;
                inner.state = SequencerState::Idle;
                tracing::debug!(
                    generation = inner.generation,
                    had_timers,
                    "sequence cleared"
                );
            }
            Some(payload) => {
                if had_timers {
                    tracing::debug!(
                        generation = inner.generation,
                        "superseding in-flight sequence"
                    );
                }
                inner.payload = Some(payload.clone());
                inner.enter_step(&self.config, 1);
                self.arm(&mut inner, payload);
            }
        }
    }

    /// Shorthand for `set_payload(None)`.
    pub fn cancel(&self) {
        self.set_payload(None);
    }

    // -- Private helpers ----------------------------------------------------

    /// Arm step-advance timers and the resolution timer for the current
    /// generation.  Caller holds the lock and has already invalidated the
    /// previous generation.
    fn arm(&self, inner: &mut Inner, payload: Payload) {
        let generation = inner.generation;
        let start = Instant::now();
        let steps = self.config.step_count();

        tracing::debug!(
            generation,
            payload_id = %payload.id,
            steps,
            total_ms = self.config.total_delay().as_millis() as u64,
            "sequence armed"
        );

        for step in 2..=steps {
            let at = start + self.config.step_start(step);
            let shared = Arc::clone(&self.inner);
            let config = Arc::clone(&self.config);
            inner.timers.push(tokio::spawn(async move {
                sleep_until(at).await;
                let mut guard = shared.lock();
                if guard.generation != generation {
                    tracing::trace!(generation, step, "stale step timer ignored");
                    return;
                }
                if let SequencerState::RunningStep(current) = guard.state
                    && current < step
                {
                    for next in current + 1..=step {
                        guard.enter_step(&config, next);
                    }
                    tracing::debug!(generation, step, "sequence advanced");
                }
            }));
        }

        let at = start + self.config.total_delay();
        let shared = Arc::clone(&self.inner);
        let config = Arc::clone(&self.config);
        let hook = Arc::clone(&self.on_complete);
        inner.timers.push(tokio::spawn(async move {
            sleep_until(at).await;
            {
                let mut guard = shared.lock();
                if guard.generation != generation {
                    tracing::trace!(generation, "stale resolve timer ignored");
                    return;
                }
                let SequencerState::RunningStep(current) = guard.state else {
                    return;
                };
                // A step due at the same instant may not have fired yet.
                for next in current + 1..=steps {
                    guard.enter_step(&config, next);
                }
                guard.state = SequencerState::Resolved(payload.clone());
                // Everything else in this generation has fired or is moot.
                // Dropping the handles detaches them, including this one.
                guard.timers.clear();
            }
            tracing::debug!(generation, payload_id = %payload.id, "sequence resolved");
            hook(payload);
        }));
    }
}

impl Drop for Sequencer {
    fn drop(&mut self) {
        self.inner.lock().invalidate();
    }
}

impl std::fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Sequencer")
            .field("config", &self.config)
            .field("generation", &inner.generation)
            .field("state", &inner.state)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config_abc() -> SequencerConfig {
        SequencerConfig::new(
            Duration::from_millis(9000),
            Duration::from_millis(2000),
            vec!["A".to_owned(), "B".to_owned(), "C".to_owned()],
        )
        .expect("valid config")
    }

    /// A sequencer whose completions are recorded in order.
    fn recording_sequencer(config: SequencerConfig) -> (Sequencer, Arc<Mutex<Vec<Payload>>>) {
        let completed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&completed);
        let seq = Sequencer::new(config, move |p| sink.lock().push(p));
        (seq, completed)
    }

    /// Move the paused clock forward and let woken timers run.
    async fn advance_ms(ms: u64) {
        tokio::time::advance(Duration::from_millis(ms)).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn starts_idle() {
        let (seq, completed) = recording_sequencer(config_abc());
        assert_eq!(seq.state(), SequencerState::Idle);
        assert!(seq.current_step().is_none());
        advance_ms(20_000).await;
        assert!(completed.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn steps_follow_schedule_and_resolve_once() {
        let (seq, completed) = recording_sequencer(config_abc());
        let payload = Payload::new("reply");
        seq.set_payload(Some(payload.clone()));

        assert_eq!(seq.state(), SequencerState::RunningStep(1));
        assert_eq!(seq.armed_timers(), 3);

        advance_ms(1999).await;
        assert_eq!(seq.state(), SequencerState::RunningStep(1));

        advance_ms(1).await; // t = 2000
        assert_eq!(seq.state(), SequencerState::RunningStep(2));

        advance_ms(2000).await; // t = 4000
        assert_eq!(seq.state(), SequencerState::RunningStep(3));

        advance_ms(4999).await; // t = 8999
        assert_eq!(seq.state(), SequencerState::RunningStep(3));
        assert!(completed.lock().is_empty());

        advance_ms(1).await; // t = 9000
        assert_eq!(seq.state(), SequencerState::Resolved(payload.clone()));
        assert_eq!(completed.lock().as_slice(), &[payload]);
        assert_eq!(seq.armed_timers(), 0);

        advance_ms(60_000).await;
        assert_eq!(completed.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn current_step_reports_label() {
        let (seq, _completed) = recording_sequencer(config_abc());
        seq.set_payload(Some(Payload::new("x")));
        advance_ms(2000).await;

        let view = seq.current_step().expect("running");
        assert_eq!(view.index, 2);
        assert_eq!(view.total, 3);
        assert_eq!(view.label, "B");
    }

    #[tokio::test(start_paused = true)]
    async fn replacement_mid_sequence_cancels_previous() {
        let (seq, completed) = recording_sequencer(config_abc());
        let first = Payload::new("first");
        let second = Payload::new("second");

        seq.set_payload(Some(first.clone()));
        advance_ms(3000).await;
        assert_eq!(seq.state(), SequencerState::RunningStep(2));
        let gen_before = seq.generation();

        seq.set_payload(Some(second.clone()));
        assert_eq!(seq.state(), SequencerState::RunningStep(1));
        assert!(seq.generation() > gen_before);

        // t = 5000: second's step 2.
        advance_ms(2000).await;
        assert_eq!(seq.state(), SequencerState::RunningStep(2));

        // t = 9000: first's resolution would have fired here.
        advance_ms(4000).await;
        assert!(completed.lock().is_empty());
        assert_eq!(seq.state(), SequencerState::RunningStep(3));

        // t = 12000: second resolves.
        advance_ms(3000).await;
        assert_eq!(completed.lock().as_slice(), &[second.clone()]);
        assert_eq!(seq.state(), SequencerState::Resolved(second));
    }

    #[tokio::test(start_paused = true)]
    async fn same_payload_again_is_a_no_op() {
        let (seq, completed) = recording_sequencer(config_abc());
        let payload = Payload::new("same");

        seq.set_payload(Some(payload.clone()));
        advance_ms(2500).await;
        let generation = seq.generation();

        seq.set_payload(Some(payload.clone()));
        assert_eq!(seq.generation(), generation);
        assert_eq!(seq.state(), SequencerState::RunningStep(2));

        advance_ms(6500).await; // t = 9000
        assert_eq!(completed.lock().len(), 1);

        // Re-render after resolution with the payload still set.
        seq.set_payload(Some(payload.clone()));
        advance_ms(20_000).await;
        assert_eq!(completed.lock().len(), 1);
        assert_eq!(seq.state(), SequencerState::Resolved(payload));
    }

    #[tokio::test(start_paused = true)]
    async fn equal_text_new_instance_restarts() {
        let (seq, completed) = recording_sequencer(config_abc());
        let first = Payload::new("dup");
        let second = Payload::new("dup");

        seq.set_payload(Some(first));
        advance_ms(5000).await;
        seq.set_payload(Some(second.clone()));
        assert_eq!(seq.state(), SequencerState::RunningStep(1));

        advance_ms(9000).await;
        let done = completed.lock();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, second.id);
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_payload_cancels_everything() {
        let (seq, completed) = recording_sequencer(config_abc());
        seq.set_payload(Some(Payload::new("gone")));
        advance_ms(2000).await;

        seq.set_payload(None);
        assert_eq!(seq.state(), SequencerState::Idle);
        assert_eq!(seq.armed_timers(), 0);

        advance_ms(20_000).await;
        assert_eq!(seq.state(), SequencerState::Idle);
        assert!(completed.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent() {
        let (seq, _completed) = recording_sequencer(config_abc());
        seq.cancel();
        let generation = seq.generation();
        seq.cancel();
        assert_eq!(seq.generation(), generation);
        assert_eq!(seq.state(), SequencerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn single_step_config_resolves_at_total() {
        let config = SequencerConfig::new(
            Duration::from_millis(500),
            Duration::from_millis(100),
            vec!["Working".to_owned()],
        )
        .unwrap();
        let (seq, completed) = recording_sequencer(config);
        seq.set_payload(Some(Payload::new("quick")));
        assert_eq!(seq.armed_timers(), 1);

        advance_ms(499).await;
        assert_eq!(seq.state(), SequencerState::RunningStep(1));
        advance_ms(1).await;
        assert!(seq.state().resolved().is_some());
        assert_eq!(completed.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn last_step_start_equal_to_total_still_resolves() {
        let config = SequencerConfig::new(
            Duration::from_millis(4000),
            Duration::from_millis(2000),
            vec!["A".to_owned(), "B".to_owned(), "C".to_owned()],
        )
        .unwrap();
        let (seq, completed) = recording_sequencer(config);
        seq.set_payload(Some(Payload::new("tight")));

        advance_ms(4000).await;
        assert!(seq.state().resolved().is_some());
        assert_eq!(completed.lock().len(), 1);
    }

    fn drain_labels(rx: &mut mpsc::UnboundedReceiver<StepView>) -> Vec<String> {
        let mut labels = Vec::new();
        while let Ok(view) = rx.try_recv() {
            labels.push(format!("[{}/{}] {}", view.index, view.total, view.label));
        }
        labels
    }

    #[tokio::test(start_paused = true)]
    async fn step_events_report_every_step_in_order() {
        let (seq, completed) = recording_sequencer(config_abc());
        let mut steps = seq.step_events();
        seq.set_payload(Some(Payload::new("reply")));

        assert_eq!(drain_labels(&mut steps), vec!["[1/3] A"]);
        advance_ms(2000).await;
        assert_eq!(drain_labels(&mut steps), vec!["[2/3] B"]);
        advance_ms(7000).await;
        assert_eq!(drain_labels(&mut steps), vec!["[3/3] C"]);
        assert_eq!(completed.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn short_steps_are_all_reported() {
        let config = SequencerConfig::new(
            Duration::from_millis(100),
            Duration::from_millis(10),
            vec!["A".to_owned(), "B".to_owned(), "C".to_owned()],
        )
        .unwrap();
        let (seq, completed) = recording_sequencer(config);
        let mut steps = seq.step_events();
        seq.set_payload(Some(Payload::new("fast")));

        // Jump straight past every boundary in one go.
        advance_ms(100).await;
        assert_eq!(
            drain_labels(&mut steps),
            vec!["[1/3] A", "[2/3] B", "[3/3] C"]
        );
        assert_eq!(completed.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn last_step_sharing_resolution_instant_is_reported() {
        let config = SequencerConfig::new(
            Duration::from_millis(4000),
            Duration::from_millis(2000),
            vec!["A".to_owned(), "B".to_owned(), "C".to_owned()],
        )
        .unwrap();
        let (seq, _completed) = recording_sequencer(config);
        let mut steps = seq.step_events();
        seq.set_payload(Some(Payload::new("tight")));

        advance_ms(4000).await;
        assert_eq!(
            drain_labels(&mut steps),
            vec!["[1/3] A", "[2/3] B", "[3/3] C"]
        );
        assert!(seq.state().resolved().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_step_receiver_is_forgotten() {
        let (seq, completed) = recording_sequencer(config_abc());
        drop(seq.step_events());
        seq.set_payload(Some(Payload::new("x")));
        advance_ms(9000).await;
        assert!(seq.inner.lock().step_watchers.is_empty());
        assert_eq!(completed.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_sequencer_aborts_timers() {
        let (seq, completed) = recording_sequencer(config_abc());
        let mut steps = seq.step_events();
        seq.set_payload(Some(Payload::new("orphan")));
        assert_eq!(drain_labels(&mut steps), vec!["[1/3] A"]);

        drop(seq);
        advance_ms(20_000).await;
        assert!(completed.lock().is_empty());
        assert!(drain_labels(&mut steps).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn timers_that_escape_abort_cannot_touch_newer_payload() {
        let (seq, completed) = recording_sequencer(config_abc());
        let first = Payload::new("first");
        seq.set_payload(Some(first));

        // Detach the first generation's timers without aborting them, as if
        // they had already been woken when the payload changed.
        let escaped = {
            let mut inner = seq.inner.lock();
            let timers = std::mem::take(&mut inner.timers);
            inner.generation = inner.generation.wrapping_add(1);
            timers
        };
        assert_eq!(escaped.len(), 3);

        advance_ms(1000).await;
        let second = Payload::new("second");
        seq.set_payload(Some(second.clone()));

        // t = 2000 and 4000: stale step timers fire while second is at step 1.
        advance_ms(1000).await;
        assert_eq!(seq.state(), SequencerState::RunningStep(1));
        advance_ms(2000).await;
        assert_eq!(seq.state(), SequencerState::RunningStep(2));

        // t = 9000: stale resolve timer fires; second is still running.
        advance_ms(5000).await;
        assert!(escaped.iter().all(|t| t.is_finished()));
        assert!(completed.lock().is_empty());
        assert_eq!(seq.state(), SequencerState::RunningStep(3));

        // t = 10000: second resolves, once.
        advance_ms(1000).await;
        assert_eq!(completed.lock().as_slice(), &[second]);
    }

    #[tokio::test(start_paused = true)]
    async fn hook_may_reenter_sequencer() {
        let seq_slot: Arc<Mutex<Option<Arc<Sequencer>>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seq_slot);
        let seq = Arc::new(Sequencer::new(config_abc(), move |_| {
            if let Some(seq) = slot.lock().as_ref() {
                seq.set_payload(None);
            }
        }));
        *seq_slot.lock() = Some(Arc::clone(&seq));

        seq.set_payload(Some(Payload::new("reentrant")));
        advance_ms(9000).await;
        assert_eq!(seq.state(), SequencerState::Idle);

        seq_slot.lock().take();
    }
}
