//! Main TUI application state and input handling.
//!
//! [`TuiApp`] owns the input buffer, the [`ConversationStore`] and the
//! [`Sequencer`].  Work that finishes off the UI loop (a produced reply, a
//! resolved sequence) comes back through a [`tokio::sync::mpsc`] channel that
//! is drained on every frame.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use stagechat_adapters::ReplyProducer;
use stagechat_sequencer::{Payload, Sequencer, SequencerConfig, StepView};
use stagechat_store::{ConversationStore, Message, ReplyTicket};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Events delivered to the UI loop from background tasks.
#[derive(Debug)]
pub enum AppEvent {
    /// The reply producer finished for `ticket`.
    ReplyProduced { ticket: ReplyTicket, text: String },
    /// The sequencer resolved `Payload` and it may now be shown.
    ReplyReady(Payload),
}

/// Actions the UI loop should take after processing a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    /// Continue the main loop.
    Continue,
    /// Exit the application.
    Quit,
}

// ---------------------------------------------------------------------------
// TuiApp
// ---------------------------------------------------------------------------

/// The main TUI application state.
pub struct TuiApp {
    /// Current text in the input field.
    input: String,
    /// Cursor position within the input field, as a byte offset on a char
    /// boundary.
    cursor_pos: usize,
    /// Messages and the reply in flight.
    store: ConversationStore,
    /// Drives the staged reveal of the pending reply.
    sequencer: Sequencer,
    /// Computes reply text for each submission.
    producer: Arc<dyn ReplyProducer>,
    /// Vertical scroll offset for the messages area (0 = pinned to bottom).
    scroll_offset: u16,
    /// Rows the messages area could scroll by at the last draw.
    max_scroll: u16,
    /// Frame counter used for the progress animation.
    tick: u64,
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl TuiApp {
    /// Create a new TUI application.
    pub fn new(producer: Arc<dyn ReplyProducer>, config: SequencerConfig) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let done_tx = event_tx.clone();
        let sequencer = Sequencer::new(config, move |payload| {
            // The receiver only goes away with the app itself.
            let _ = done_tx.send(AppEvent::ReplyReady(payload));
        });

        Self {
            input: String::new(),
            cursor_pos: 0,
            store: ConversationStore::new(),
            sequencer,
            producer,
            scroll_offset: 0,
            max_scroll: 0,
            tick: 0,
            event_rx,
            event_tx,
        }
    }

    // -- Accessors ----------------------------------------------------------

    /// Return the current input text.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Return the cursor position within the input.
    pub fn cursor_pos(&self) -> usize {
        self.cursor_pos
    }

    /// Return all chat messages.
    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// Return the current scroll offset.
    pub fn scroll_offset(&self) -> u16 {
        self.scroll_offset
    }

    /// Whether input is disabled because a reply is in flight.
    pub fn is_busy(&self) -> bool {
        self.store.is_busy()
    }

    /// Whether the submit action is currently available.
    pub fn can_submit(&self) -> bool {
        !self.is_busy() && !self.input.trim().is_empty()
    }

    /// The step currently shown by the progress indicator.
    pub fn current_step(&self) -> Option<StepView> {
        self.sequencer.current_step()
    }

    /// Name of the active reply producer.
    pub fn producer_name(&self) -> &str {
        self.producer.name()
    }

    /// Frame counter for animations.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    // -- Key handling -------------------------------------------------------

    /// Handle a key event and return the action the UI should take.
    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        // Ctrl+C or Escape always quits.
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return AppAction::Quit;
        }
        if key.code == KeyCode::Esc {
            return AppAction::Quit;
        }

        match key.code {
            KeyCode::Up => self.scroll_up(1),
            KeyCode::Down => self.scroll_down(1),
            KeyCode::PageUp => self.scroll_up(10),
            KeyCode::PageDown => self.scroll_down(10),
            // The input is disabled while a reply is in flight.
            _ if self.is_busy() => {}
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.insert_char('\n');
            }
            KeyCode::Enter => self.submit_input(),
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => {
                if let Some(prev) = self.prev_boundary() {
                    self.input.remove(prev);
                    self.cursor_pos = prev;
                }
            }
            KeyCode::Delete => {
                if self.cursor_pos < self.input.len() {
                    self.input.remove(self.cursor_pos);
                }
            }
            KeyCode::Left => {
                if let Some(prev) = self.prev_boundary() {
                    self.cursor_pos = prev;
                }
            }
            KeyCode::Right => {
                if let Some(next) = self.next_boundary() {
                    self.cursor_pos = next;
                }
            }
            KeyCode::Home => self.cursor_pos = 0,
            KeyCode::End => self.cursor_pos = self.input.len(),
            _ => {}
        }

        AppAction::Continue
    }

    fn insert_char(&mut self, c: char) {
        self.input.insert(self.cursor_pos, c);
        self.cursor_pos += c.len_utf8();
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.input[..self.cursor_pos]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.input[self.cursor_pos..]
            .chars()
            .next()
            .map(|c| self.cursor_pos + c.len_utf8())
    }

    // -- Scrolling ----------------------------------------------------------

    /// Scroll up by the given number of lines, stopping at the top of the
    /// conversation as last drawn.
    fn scroll_up(&mut self, lines: u16) {
        self.scroll_offset = self
            .scroll_offset
            .saturating_add(lines)
            .min(self.max_scroll);
    }

    /// Scroll down by the given number of lines.
    fn scroll_down(&mut self, lines: u16) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    /// Record how far the messages area can scroll, as measured in wrapped
    /// rows by the renderer.
    pub(crate) fn set_max_scroll(&mut self, max_scroll: u16) {
        self.max_scroll = max_scroll;
        self.scroll_offset = self.scroll_offset.min(max_scroll);
    }

    // -- Input submission ---------------------------------------------------

    /// Submit the current input and spawn the reply producer for it.
    fn submit_input(&mut self) {
        let Some(submission) = self.store.submit(&self.input) else {
            return;
        };

        self.input.clear();
        self.cursor_pos = 0;
        self.scroll_offset = 0;

        let producer = Arc::clone(&self.producer);
        let tx = self.event_tx.clone();
        tracing::debug!(producer = producer.name(), ticket = %submission.ticket, "requesting reply");

        tokio::spawn(async move {
            let text = producer.produce(&submission.text).await;
            let _ = tx.send(AppEvent::ReplyProduced {
                ticket: submission.ticket,
                text,
            });
        });
    }

    // -- Event polling ------------------------------------------------------

    /// Drain background events and bring the sequencer in line with the
    /// store.
    ///
    /// Should be called on every iteration of the main UI loop.
    pub fn process_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                AppEvent::ReplyProduced { ticket, text } => {
                    if self.store.reply_resolved(ticket, text).is_some() {
                        tracing::debug!(%ticket, "reply produced, starting sequence");
                    }
                }
                AppEvent::ReplyReady(payload) => {
                    if self.store.on_reply_ready(&payload) {
                        tracing::info!(payload_id = %payload.id, "reply revealed");
                        self.scroll_offset = 0;
                    }
                }
            }
        }
        self.sync_sequencer();
    }

    /// Hand the store's pending payload to the sequencer.  Repeating this with
    /// an unchanged payload is a no-op.
    fn sync_sequencer(&self) {
        self.sequencer.set_payload(self.store.pending().cloned());
    }

    /// Advance the animation clock by one frame.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
