//! Error types shared across the installer crates.

use thiserror::Error;

/// Result type alias using the installer core Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure modes common to every install flow.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An external command declared must-succeed exited non-zero.
    #[error("{description} failed (exit {code:?})")]
    CommandFailed {
        description: String,
        code: Option<i32>,
    },

    /// A create-then-poll provisioning loop ran out of attempts.
    #[error("{resource} was not ready after {attempts} attempts")]
    RetriesExhausted { resource: String, attempts: u32 },
}
