//! Rendering functions for the TUI layout.
//!
//! The layout consists of three vertically stacked areas:
//!
//! 1. **Header** (1 line) -- app name, reply producer, status, quit hint.
//! 2. **Messages** (fills remaining space) -- scrollable chat history with the
//!    step progress indicator underneath while a reply is being revealed.
//! 3. **Input** (bordered) -- text input field, disabled while busy.

use std::time::Duration;

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use stagechat_store::Sender;

use crate::app::TuiApp;

/// Most input lines shown before the input box stops growing.
const MAX_INPUT_LINES: u16 = 5;

/// Frames per animation step of the progress dots.
const FRAMES_PER_DOT: u64 = 6;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Draw the entire TUI frame.
///
/// Also tells `app` how far the messages area can scroll at this size, so
/// scrolling keys stop at the top of the conversation.
pub fn draw(frame: &mut Frame, app: &mut TuiApp) {
    let input_lines = (app.input().split('\n').count() as u16).clamp(1, MAX_INPUT_LINES);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),               // header
            Constraint::Min(1),                  // messages
            Constraint::Length(input_lines + 2), // input
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0]);
    let max_scroll = draw_messages(frame, app, chunks[1]);
    app.set_max_scroll(max_scroll);
    draw_input(frame, app, chunks[2]);
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

fn draw_header(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let status = if app.is_busy() {
        Span::styled(" Working... ", Style::default().fg(Color::Yellow))
    } else {
        Span::styled(" Ready ", Style::default().fg(Color::Green))
    };

    let header = Line::from(vec![
        Span::styled(
            concat!(" stagechat v", env!("CARGO_PKG_VERSION"), " "),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("| Replies: "),
        Span::styled(app.producer_name(), Style::default().fg(Color::White)),
        Span::raw(" | "),
        status,
        Span::raw("| Esc to quit "),
    ]);

    let header_widget = Paragraph::new(header).style(Style::default().bg(Color::DarkGray));

    frame.render_widget(header_widget, area);
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Draw the scrollable messages area and return how many rows it can scroll.
fn draw_messages(frame: &mut Frame, app: &TuiApp, area: Rect) -> u16 {
    let messages_block = Block::default()
        .borders(Borders::ALL)
        .title(" Chat with Delayed Response ")
        .border_style(Style::default().fg(Color::DarkGray));

    if app.messages().is_empty() && !app.is_busy() {
        let placeholder = empty_state_lines(app.sequencer().config().total_delay());
        let widget = Paragraph::new(placeholder)
            .block(messages_block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(widget, area);
        return 0;
    }

    let mut lines = message_lines(app);
    lines.extend(progress_lines(app));

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });

    // Long replies wrap, so measure rendered rows rather than lines.  The
    // bottom of the conversation is shown unless the user scrolled up.
    let inner = messages_block.inner(area);
    let rows = u16::try_from(paragraph.line_count(inner.width)).unwrap_or(u16::MAX);
    let max_scroll = rows.saturating_sub(inner.height);
    let effective_scroll = max_scroll.saturating_sub(app.scroll_offset());

    let messages_widget = paragraph
        .block(messages_block)
        .scroll((effective_scroll, 0));

    frame.render_widget(messages_widget, area);
    max_scroll
}

/// Placeholder shown before the first message.
fn empty_state_lines(total_delay: Duration) -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(Span::styled(
            "Start a conversation",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(
                "Send a message and receive a response after {}.",
                describe_delay(total_delay)
            ),
            Style::default().fg(Color::DarkGray),
        )),
    ]
}

/// One bubble per message: user on the right, system on the left, each with
/// its timestamp underneath.
fn message_lines(app: &TuiApp) -> Vec<Line<'_>> {
    let mut lines = Vec::new();

    for message in app.messages() {
        let (alignment, style) = match message.sender {
            Sender::User => (Alignment::Right, Style::default().fg(Color::Cyan)),
            Sender::System => (Alignment::Left, Style::default().fg(Color::Green)),
        };

        for content_line in message.content.split('\n') {
            lines.push(Line::styled(content_line, style).alignment(alignment));
        }
        lines.push(
            Line::styled(
                message.timestamp.as_str(),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::DIM),
            )
            .alignment(alignment),
        );
        lines.push(Line::from(""));
    }

    lines
}

/// Step label and animated dots while a reply is being revealed, or a short
/// note while the reply text is still being produced.
fn progress_lines(app: &TuiApp) -> Vec<Line<'static>> {
    let dots = ".".repeat(((app.tick_count() / FRAMES_PER_DOT) % 4) as usize);
    let style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    if let Some(step) = app.current_step() {
        return vec![
            Line::from(vec![
                Span::styled(format!("  [{}/{}] ", step.index, step.total), style),
                Span::styled(step.label, style),
            ]),
            Line::from(Span::styled(format!("  {dots}"), style)),
        ];
    }

    if app.store().is_awaiting_reply() {
        return vec![Line::from(Span::styled(format!("  Preparing reply{dots}"), style))];
    }

    Vec::new()
}

/// Human-readable delay such as `9 seconds` or `2.5 seconds`.
pub fn describe_delay(delay: Duration) -> String {
    let millis = delay.as_millis();
    if millis == 1000 {
        "1 second".to_owned()
    } else if millis % 1000 == 0 {
        format!("{} seconds", millis / 1000)
    } else {
        format!("{:.1} seconds", delay.as_secs_f64())
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Draw the text input area at the bottom.
fn draw_input(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let busy = app.is_busy();
    let title = if busy {
        " Input (waiting...) "
    } else if app.can_submit() {
        " Input (Enter to send, Shift+Enter for newline) "
    } else {
        " Input "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(if busy {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Cyan)
        });

    let (text, text_style) = if busy {
        ("", Style::default().fg(Color::DarkGray))
    } else if app.input().is_empty() {
        ("Type a message...", Style::default().fg(Color::DarkGray))
    } else {
        (app.input(), Style::default().fg(Color::White))
    };

    // Keep the cursor line visible when the input outgrows the box.
    let (cursor_col, cursor_row) = cursor_coords(app.input(), app.cursor_pos());
    let visible_rows = area.height.saturating_sub(2).max(1);
    let scroll = cursor_row.saturating_sub(visible_rows - 1);

    let input_widget = Paragraph::new(text)
        .block(input_block)
        .style(text_style)
        .scroll((scroll, 0));

    frame.render_widget(input_widget, area);

    if !busy {
        // +1 for the border offset on each axis.
        let cursor_x = area.x + 1 + cursor_col;
        let cursor_y = area.y + 1 + cursor_row - scroll;
        frame.set_cursor_position(Position::new(cursor_x, cursor_y));
    }
}

/// Column and row of the cursor inside `input`, in characters.
fn cursor_coords(input: &str, cursor_pos: usize) -> (u16, u16) {
    let before = &input[..cursor_pos.min(input.len())];
    let row = before.matches('\n').count();
    let col = before
        .rsplit('\n')
        .next()
        .map(|line| line.chars().count())
        .unwrap_or(0);
    (col as u16, row as u16)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
