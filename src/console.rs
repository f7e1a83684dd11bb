//! Operator-facing output: the per-command log line and printed results.

use crate::SessionId;
use colored::Colorize;
use std::io::{self, Write};
use std::sync::Arc;

/// Sink for raw operator output.
pub type OutputHandler = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Where an engine writes what the operator sees.
///
/// Command log lines go to `diagnostics` (stderr by default) so that redirecting
/// stdout to a file captures only command output.
#[derive(Clone)]
pub struct Console {
    output: OutputHandler,
    diagnostics: OutputHandler,
}

impl Console {
    pub fn new(
        output: impl Fn(&[u8]) + Send + Sync + 'static,
        diagnostics: impl Fn(&[u8]) + Send + Sync + 'static,
    ) -> Self {
        Self {
            output: Arc::new(output),
            diagnostics: Arc::new(diagnostics),
        }
    }

    /// Console writing to the process' stdout and stderr.
    pub fn stdio() -> Self {
        Self::new(
            |data| {
                let mut stdout = io::stdout().lock();
                let _ = stdout.write_all(data);
                let _ = stdout.flush();
            },
            |data| {
                let mut stderr = io::stderr().lock();
                let _ = stderr.write_all(data);
                let _ = stderr.flush();
            },
        )
    }

    /// Console that discards everything.
    pub fn silent() -> Self {
        Self::new(|_| {}, |_| {})
    }

    /// Log `message` as `[Session N] message` on the diagnostics sink.
    pub(crate) fn announce(&self, session: SessionId, message: &str) {
        let line = format!("{}{}\n", format!("[Session {session}] ").magenta(), message);
        (self.diagnostics)(line.as_bytes());
    }

    /// Write a command's output followed by a newline.
    pub(crate) fn print(&self, text: &str) {
        let mut data = text.as_bytes().to_vec();
        data.push(b'\n');
        (self.output)(&data);
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::stdio()
    }
}

/// The log line used when a command has no override.
pub(crate) fn command_message(command: &str) -> String {
    format!("⏳ {}", command.trim().blue())
}

/// The log line used for secrets typed into the shell.
pub(crate) fn secret_message(redacted: &str) -> String {
    format!("🔑 {}", redacted.bright_black())
}
