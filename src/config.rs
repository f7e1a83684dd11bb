//! Option structs for sessions and individual commands.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default wait between writing a command and submitting it, long enough for
/// the shell's echo of the typed text to drain.
pub const DEFAULT_ROUND_TRIP_DELAY: Duration = Duration::from_millis(200);

/// Default upper bound on how long a command may take to emit its sentinel.
pub const DEFAULT_SENTINEL_TIMEOUT: Duration = Duration::from_secs(30);

/// What happens to a command's output once its sentinel has been seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Write the output to the operator's stdout and resolve with nothing.
    #[default]
    Print,
    /// Hand the output back to the caller without displaying it.
    Capture,
}

/// Rewrites a command before it is echoed to the operator log.
pub type LogOverride = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Per-command options for [`Engine::execute`](crate::Engine::execute).
///
/// Every field defaults to "unset", which defers to the engine's
/// [`EngineConfig`].
#[derive(Clone, Default)]
pub struct ExecOptions {
    /// Text the shell prints once the command is done. When unset the engine
    /// appends `; echo <random sentinel>` to the command.
    pub sentinel: Option<String>,
    /// Output disposition; `None` uses [`EngineConfig::default_output_mode`].
    pub output: Option<OutputMode>,
    /// Replaces the command text in the operator log, e.g. to hide secrets.
    pub log_override: Option<LogOverride>,
    /// Overrides [`EngineConfig::sentinel_timeout`] for this command.
    pub timeout: Option<Duration>,
}

impl ExecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = Some(sentinel.into());
        self
    }

    pub fn output(mut self, mode: impl Into<Option<OutputMode>>) -> Self {
        self.output = mode.into();
        self
    }

    pub fn capture(self) -> Self {
        self.output(OutputMode::Capture)
    }

    pub fn print(self) -> Self {
        self.output(OutputMode::Print)
    }

    pub fn log_with(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.log_override = Some(Arc::new(f));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for ExecOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecOptions")
            .field("sentinel", &self.sentinel)
            .field("output", &self.output)
            .field("log_override", &self.log_override.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Settings shared by every command an [`Engine`](crate::Engine) runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Suppress the `[Session N] <command>` line on stderr.
    pub echo_off: bool,
    /// Wait between writing a command and the newline that submits it.
    pub round_trip_delay: Duration,
    /// Output mode for commands that do not pick one.
    pub default_output_mode: OutputMode,
    /// How long a command may run before failing with
    /// [`Error::SentinelTimeout`](crate::Error::SentinelTimeout).
    pub sentinel_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            echo_off: false,
            round_trip_delay: DEFAULT_ROUND_TRIP_DELAY,
            default_output_mode: OutputMode::Print,
            sentinel_timeout: DEFAULT_SENTINEL_TIMEOUT,
        }
    }
}

/// Options for one [`Launcher::run`](crate::Launcher::run) call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Pause before spawning the shell, to stagger many parallel sessions.
    pub start_delay: Duration,
    pub engine: EngineConfig,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    pub fn echo_off(mut self, echo_off: bool) -> Self {
        self.engine.echo_off = echo_off;
        self
    }

    pub fn round_trip_delay(mut self, delay: Duration) -> Self {
        self.engine.round_trip_delay = delay;
        self
    }

    pub fn default_output_mode(mut self, mode: OutputMode) -> Self {
        self.engine.default_output_mode = mode;
        self
    }

    pub fn sentinel_timeout(mut self, timeout: Duration) -> Self {
        self.engine.sentinel_timeout = timeout;
        self
    }
}
