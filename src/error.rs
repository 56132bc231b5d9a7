//! Error types for RefVault

use thiserror::Error;
use std::io;

/// Result type alias for RefVault operations
pub type Result<T> = std::result::Result<T, RefVaultError>;

/// Session-fatal errors.
///
/// Lookup misses are not errors; they travel as [`crate::Response`] values.
/// Anything returned as `Err` from a session operation ends the session.
#[derive(Error, Debug)]
pub enum RefVaultError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Session is {0} and accepts no further operations")]
    SessionClosed(String),

    #[error("Rollback failed: {0}")]
    Rollback(String),

    /// A fault whose rollback also failed; the session can retry the abort
    #[error("{fault} (rollback incomplete: {cause})")]
    FaultRollback {
        fault: Box<RefVaultError>,
        #[source]
        cause: Box<RefVaultError>,
    },

    #[error("Shutdown error: {0}")]
    Shutdown(String),
}
