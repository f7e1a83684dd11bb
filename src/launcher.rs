use crate::broadcast::Broadcaster;
use crate::config::RunOptions;
use crate::console::Console;
use crate::engine::Engine;
use crate::error::Result;
use crate::pty::{PtySession, Terminal};
use crate::pty_reader::spawn_reader;
use futures::future::LocalBoxFuture;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::sleep;
use tracing::debug;

/// Index of a session within one [`Launcher`], used to tag log lines.
pub type SessionId = u64;

/// Hands out increasing session ids, starting at 0.
#[derive(Debug, Default)]
pub struct SessionIds(AtomicU64);

impl SessionIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> SessionId {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// Creates the terminal for a new session along with the broadcaster its
/// output is published into.
pub type Spawner =
    Arc<dyn Fn(SessionId) -> Result<(Box<dyn Terminal>, Broadcaster)> + Send + Sync>;

/// Spawns sessions, runs routines against them and always tears them down.
///
/// ```no_run
/// use ttydrive::{Launcher, RunOptions};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> anyhow::Result<()> {
///     let launcher = Launcher::new();
///     let kernel = launcher
///         .run(&RunOptions::new(), |sh| Box::pin(async move { sh.capture("uname -r").await }))
///         .await?;
///     println!("{kernel}");
///     Ok(())
/// }
/// ```
pub struct Launcher {
    ids: SessionIds,
    spawner: Spawner,
    console: Console,
}

impl Launcher {
    /// Launcher spawning the user's default shell.
    pub fn new() -> Self {
        Self::with_spawner(pty_spawner(None))
    }

    /// Launcher spawning `program` instead of the default shell.
    pub fn with_shell(program: impl Into<String>) -> Self {
        Self::with_spawner(pty_spawner(Some(program.into())))
    }

    /// Launcher using a custom terminal factory, e.g. a fake shell in tests.
    pub fn with_spawner(
        spawner: impl Fn(SessionId) -> Result<(Box<dyn Terminal>, Broadcaster)> + Send + Sync + 'static,
    ) -> Self {
        Self {
            ids: SessionIds::new(),
            spawner: Arc::new(spawner),
            console: Console::stdio(),
        }
    }

    /// Replace the console sessions write their operator output to.
    pub fn console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// Spawn a session, run `routine` against its engine and tear it down.
    ///
    /// The session is terminated whether the routine succeeds or fails; if
    /// the routine panics, dropping the engine terminates it during unwinding.
    /// Many `run` futures may be driven at once (e.g. with
    /// [`futures::future::join_all`]); each gets its own shell.
    ///
    /// The routine returns a boxed future borrowing the engine, so data it
    /// needs must be moved in.
    pub async fn run<T, E, F>(&self, options: &RunOptions, routine: F) -> std::result::Result<T, E>
    where
        F: for<'a> FnOnce(&'a mut Engine) -> LocalBoxFuture<'a, std::result::Result<T, E>>,
        E: From<crate::Error>,
    {
        if !options.start_delay.is_zero() {
            sleep(options.start_delay).await;
        }

        let id = self.ids.next();
        let (terminal, output) = (self.spawner)(id)?;
        let mut engine = Engine::attach(
            id,
            terminal,
            output,
            options.engine.clone(),
            self.console.clone(),
        );
        debug!(session = id, "session started");

        let outcome = routine(&mut engine).await;
        engine.destroy();
        debug!(session = id, ok = outcome.is_ok(), "session finished");
        outcome
    }
}

impl Default for Launcher {
    fn default() -> Self {
        Self::new()
    }
}

fn pty_spawner(
    program: Option<String>,
) -> impl Fn(SessionId) -> Result<(Box<dyn Terminal>, Broadcaster)> + Send + Sync + 'static {
    move |id| {
        let (session, reader) = PtySession::spawn(program.as_deref())?;
        let output = Broadcaster::new();
        spawn_reader(reader, output.clone());
        debug!(session = id, "PTY reader started");
        Ok((Box::new(session) as Box<dyn Terminal>, output))
    }
}
