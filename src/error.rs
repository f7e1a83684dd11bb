//! Error types for ttydrive.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while spawning, driving or tearing down a shell session.
#[derive(Debug, Error)]
pub enum Error {
    /// The PTY or the shell process could not be created.
    #[error("failed to spawn shell: {0}")]
    Spawn(String),

    /// A write was attempted after the session was terminated or the shell exited.
    #[error("write attempted on a terminated session")]
    WriteAfterTermination,

    /// The completion sentinel did not show up in time.
    #[error("timeout waiting for sentinel '{sentinel}' after {timeout:?}")]
    SentinelTimeout { sentinel: String, timeout: Duration },

    /// The output stream closed before the completion sentinel appeared.
    #[error("shell output closed before sentinel '{sentinel}' appeared")]
    ShellExited { sentinel: String },

    /// An empty sentinel would match any output immediately.
    #[error("completion sentinel must not be empty")]
    EmptySentinel,

    #[error("PTY I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
