//! Chat screen session: owns the terminal while stagechat is open.
//!
//! The frame loop redraws at a fixed cadence even without input, because
//! step labels and the progress dots change on their own.

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use stagechat_adapters::ReplyProducer;
use stagechat_sequencer::SequencerConfig;

use crate::app::{AppAction, TuiApp};
use crate::error::{Result, TuiError};
use crate::ui;

/// Longest wait for a key before the next frame is drawn.
const FRAME_INTERVAL: Duration = Duration::from_millis(50);

/// Raw mode plus the alternate screen, undone on drop so an early return
/// still hands the shell back intact.
struct ChatTerminal {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl ChatTerminal {
    fn open() -> Result<Self> {
        enable_raw_mode().map_err(TuiError::RawMode)?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for ChatTerminal {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Open the chat screen and run it until the user quits.
///
/// Replies come from `producer` and are revealed on the schedule in
/// `config`.  The caller's terminal content is restored on exit.
pub async fn run_tui(producer: Arc<dyn ReplyProducer>, config: SequencerConfig) -> Result<()> {
    let mut app = TuiApp::new(producer, config);
    let mut screen = ChatTerminal::open()?;
    tracing::info!(producer = app.producer_name(), "chat screen opened");

    let result = frame_loop(&mut screen.terminal, &mut app).await;

    drop(screen);
    tracing::info!(messages = app.messages().len(), "chat screen closed");
    result
}

async fn frame_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut TuiApp,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        if event::poll(FRAME_INTERVAL)? && dispatch(app, event::read()?) == AppAction::Quit {
            return Ok(());
        }

        app.process_events();
        app.tick();
        // Lets the producer and sequencer tasks run on a current-thread runtime.
        tokio::task::yield_now().await;
    }
}

/// Route one terminal event to the app.  Only key presses matter; resizes
/// are picked up by the next draw.
fn dispatch(app: &mut TuiApp, event: Event) -> AppAction {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
        _ => AppAction::Continue,
    }
}
