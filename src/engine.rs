use crate::action::{ShellAction, Step};
use crate::actions::{Exit, Login, ReadFile};
use crate::broadcast::Broadcaster;
use crate::config::{EngineConfig, ExecOptions, OutputMode};
use crate::console::{self, Console};
use crate::error::{Error, Result};
use crate::pending::PendingCommand;
use crate::pty::Terminal;
use crate::SessionId;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Drives one shell session: writes commands and detects when each finishes.
///
/// Completion is detected through a sentinel string the shell prints once the
/// command is done. Unless the caller names one, the engine appends
/// `; echo <sentinel>` with a random sentinel to every command. Commands run
/// strictly one after another; [`execute`](Self::execute) takes `&mut self`.
///
/// A sentinel that happens to appear in ordinary output ends the command
/// early with truncated output. Random sentinels make this unlikely, but it
/// is not detected.
pub struct Engine {
    id: SessionId,
    created_at: DateTime<Utc>,
    terminal: Box<dyn Terminal>,
    output: Broadcaster,
    config: EngineConfig,
    console: Console,
}

impl Engine {
    /// Build an engine over an already running terminal whose output is
    /// published into `output`.
    pub fn attach(
        id: SessionId,
        terminal: Box<dyn Terminal>,
        output: Broadcaster,
        config: EngineConfig,
        console: Console,
    ) -> Self {
        Engine {
            id,
            created_at: Utc::now(),
            terminal,
            output,
            config,
            console,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_terminated(&self) -> bool {
        self.terminal.is_terminated()
    }

    /// Run `command` in the shell and wait for it to finish.
    ///
    /// Resolves with the command's output in capture mode and with `None` in
    /// print mode, where the output goes to the console instead. Fails with
    /// [`Error::SentinelTimeout`] when the sentinel does not show up in time
    /// and with [`Error::ShellExited`] when the shell goes away first.
    pub async fn execute(&mut self, command: &str, options: ExecOptions) -> Result<Option<String>> {
        let mode = options.output.unwrap_or(self.config.default_output_mode);
        let wait = options.timeout.unwrap_or(self.config.sentinel_timeout);

        let (line, sentinel) = match options.sentinel {
            Some(sentinel) if sentinel.is_empty() => return Err(Error::EmptySentinel),
            Some(sentinel) => (command.to_string(), sentinel),
            None => {
                let sentinel = generate_sentinel();
                (format!("{command}; echo {sentinel}"), sentinel)
            }
        };

        if !self.config.echo_off {
            let message = match &options.log_override {
                Some(rewrite) => rewrite(command),
                None => console::command_message(command),
            };
            self.console.announce(self.id, &message);
        }

        let output = self.dispatch(&line, &sentinel, wait).await?;

        match mode {
            OutputMode::Capture => Ok(Some(output)),
            OutputMode::Print => {
                self.console.print(&output);
                Ok(None)
            }
        }
    }

    /// Run `command` and write its output to the console.
    pub async fn print(&mut self, command: &str) -> Result<()> {
        self.execute(command, ExecOptions::new().print()).await?;
        Ok(())
    }

    /// Run `command` and return its output.
    pub async fn capture(&mut self, command: &str) -> Result<String> {
        let output = self.execute(command, ExecOptions::new().capture()).await?;
        Ok(output.unwrap_or_default())
    }

    /// Write `line`, let its echo drain, submit it and wait for `sentinel`.
    async fn dispatch(&mut self, line: &str, sentinel: &str, wait: Duration) -> Result<String> {
        debug!(session = self.id, sentinel, "dispatching command");
        self.terminal.write(line.as_bytes())?;

        // Output seen before this point is the shell echoing the typed line,
        // which contains the sentinel text itself.
        sleep(self.config.round_trip_delay).await;

        let (pending, result) = PendingCommand::new(sentinel);
        let mut subscription = self.output.subscribe(move |chunk| pending.feed(chunk));
        self.terminal.write(b"\n")?;

        let outcome = timeout(wait, result).await;
        subscription.unsubscribe();

        match outcome {
            Ok(Ok(output)) => {
                debug!(session = self.id, bytes = output.len(), "sentinel matched");
                Ok(output)
            }
            Ok(Err(_)) => {
                warn!(session = self.id, sentinel, "shell output closed before sentinel");
                Err(Error::ShellExited {
                    sentinel: sentinel.to_string(),
                })
            }
            Err(_) => {
                warn!(session = self.id, sentinel, timeout = ?wait, "timed out waiting for sentinel");
                Err(Error::SentinelTimeout {
                    sentinel: sentinel.to_string(),
                    timeout: wait,
                })
            }
        }
    }

    /// Run `action` in the engine's default output mode.
    pub async fn perform(&mut self, action: &dyn ShellAction) -> Result<Option<String>> {
        action.run(self, None).await
    }

    /// Run `action` in capture mode and return its output.
    pub async fn perform_captured(&mut self, action: &dyn ShellAction) -> Result<String> {
        let output = action.run(self, Some(OutputMode::Capture)).await?;
        Ok(output.unwrap_or_default())
    }

    /// Run `action` in print mode.
    pub async fn perform_printed(&mut self, action: &dyn ShellAction) -> Result<()> {
        action.run(self, Some(OutputMode::Print)).await?;
        Ok(())
    }

    /// Log in to another host over SSH. See [`Login`].
    pub async fn login(&mut self, login: &Login) -> Result<Option<String>> {
        self.perform(login).await
    }

    /// Show a file, or only its last `last` lines. See [`ReadFile`].
    pub async fn read_file(&mut self, path: &str, last: Option<usize>) -> Result<Option<String>> {
        let action = ReadFile {
            path: path.to_string(),
            last,
        };
        self.perform(&action).await
    }

    /// Leave the current (remote) shell. See [`Exit`].
    pub async fn exit(&mut self) -> Result<Option<String>> {
        self.perform(&Exit::default()).await
    }

    /// Terminate the shell process. Safe to call more than once.
    pub fn destroy(&mut self) {
        if !self.terminal.is_terminated() {
            debug!(session = self.id, "destroying session");
        }
        self.terminal.terminate();
        self.output.close();
    }

    /// Run parsed script steps in order, collecting captured output.
    pub async fn run_steps(&mut self, steps: &[Step]) -> Result<Vec<String>> {
        let mut captured = Vec::new();
        for step in steps {
            if let Some(output) = step.action.run(self, step.mode).await? {
                captured.push(output);
            }
        }
        Ok(captured)
    }
}

/// A fresh sentinel with 64 random bits, unlikely to occur in real output.
pub(crate) fn generate_sentinel() -> String {
    format!("ttydrive_done_{:016x}", rand::random::<u64>())
}
