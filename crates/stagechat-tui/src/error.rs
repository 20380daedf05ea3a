//! Errors raised while the chat screen owns the terminal.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TuiError {
    /// The terminal could not be switched into raw mode, so the chat screen
    /// never opened.
    #[error("could not take over the terminal: {0}")]
    RawMode(#[source] std::io::Error),

    /// Reading a key, drawing a frame, or restoring the terminal failed.
    #[error("terminal i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TuiError>;
