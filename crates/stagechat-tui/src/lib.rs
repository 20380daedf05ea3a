//! Terminal UI for stagechat.
//!
//! A single-pane chat built on `ratatui`:
//!
//! - A scrolling message list with user messages on the right and system
//!   replies on the left.
//! - A step progress indicator while a reply is being revealed.
//! - A text input that is disabled while a reply is in flight.

pub mod app;
pub mod error;
pub mod run;
pub mod ui;

pub use app::{AppAction, AppEvent, TuiApp};
pub use error::{Result, TuiError};
pub use run::run_tui;
