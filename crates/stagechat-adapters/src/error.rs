//! Adapter error types.
//!
//! Reply producers never hand errors to the chat flow; these variants exist
//! for construction-time validation and for the internal search call, whose
//! failures are logged and then turned into fallback text.

/// Unified error type for stagechat adapters.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// A required credential was not supplied at startup.
    #[error("missing credential: set `{env_var}` to use the {adapter} reply producer")]
    MissingCredential { adapter: String, env_var: String },

    /// Configuration error in adapter setup.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// The outbound request could not be completed (connect, timeout, ...).
    #[error("request to {endpoint} failed: {reason}")]
    RequestFailed { endpoint: String, reason: String },

    /// The remote service answered with a non-success status.
    #[error("{endpoint} returned status {status}")]
    HttpStatus { endpoint: String, status: u16 },

    /// The response body could not be decoded.
    #[error("invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

/// Convenience alias used throughout the adapters crate.
pub type Result<T> = std::result::Result<T, AdapterError>;
