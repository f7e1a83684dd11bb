//! # ttydrive
//!
//! Drive interactive shells through a PTY and know when each command is done.
//!
//! Interactive shells give no structured "command finished" signal. ttydrive
//! writes a command, waits for the shell's echo of the typed text to drain,
//! submits it, and watches the output for a sentinel string. Unless told
//! otherwise it appends `; echo <random sentinel>` so any command announces
//! its own completion. This is enough to automate SSH logins, read remote
//! files and run scripted administration where no non-interactive interface
//! exists.
//!
//! ## Quick start
//!
//! ```no_run
//! use ttydrive::{Launcher, RunOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let launcher = Launcher::new();
//!     let tail = launcher
//!         .run(&RunOptions::new(), |sh| {
//!             Box::pin(async move {
//!                 sh.print("uptime").await?;
//!                 sh.capture("tail -3 /var/log/syslog").await
//!             })
//!         })
//!         .await?;
//!     println!("{tail}");
//!     Ok(())
//! }
//! ```
//!
//! ## Output modes
//!
//! Every command runs in one of two [`OutputMode`]s sharing the same
//! completion detection: `Print` writes the output to stdout and resolves with
//! nothing, `Capture` hands it back to the caller. Each command logs
//! `[Session N] <command>` to stderr unless `echo_off` is set, so
//! `ttydrive ... > out.log` only captures command output.
//!
//! ## Actions
//!
//! [`Login`], [`ReadFile`], [`Exit`] and [`Destroy`] are [`ShellAction`]s
//! composed from [`Engine::execute`]. Run them with [`Engine::perform`],
//! [`Engine::perform_captured`] or [`Engine::perform_printed`]:
//!
//! ```no_run
//! use ttydrive::{Launcher, Login, ReadFile, RunOptions};
//!
//! # async fn demo() -> Result<(), ttydrive::Error> {
//! let log = Launcher::new()
//!     .run(&RunOptions::new(), |sh| {
//!         Box::pin(async move {
//!             sh.perform_captured(&Login::new("10.0.0.5").username("root").password("123456"))
//!                 .await?;
//!             sh.perform_captured(&ReadFile::new("app.log").last(100)).await
//!         })
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Scripts
//!
//! [`parse_str`] and [`parse_file`] turn a line-oriented script into
//! [`Step`]s for [`Engine::run_steps`]:
//!
//! | Step | Description |
//! |------|-------------|
//! | `run "cmd"` | Run a command; `until "text"` and `within 10s` are optional |
//! | `login "host"` | SSH login; `user`, `password`, `port`, `until` are optional |
//! | `read "path"` | `cat` a file, or `tail` it with `last N` |
//! | `exit` | Leave the shell, waiting for `closed` (or `until "text"`) |
//! | `destroy` | Kill the shell |
//! | `wait 500ms` | Pause (`ms` or `s` units, floats allowed) |
//! | `capture …` / `print …` | Force the output mode of one step |
//! | `# comment` | Full-line or inline comment |
//!
//! ## Limitations
//!
//! The round-trip delay is a heuristic: if the shell echoes typed input later
//! than [`EngineConfig::round_trip_delay`], the echoed sentinel can end the
//! command early. Likewise output that happens to contain the sentinel ends
//! the command early with truncated output; neither case is detected.

pub mod action;
pub mod actions;
pub mod broadcast;
pub mod config;
pub mod console;
pub mod engine;
pub mod error;
pub mod launcher;
pub mod parser;
pub(crate) mod pending;
pub mod pty;
pub(crate) mod pty_reader;
pub mod redact;

pub use action::{ShellAction, Step};
pub use actions::{Destroy, Exit, Login, ReadFile, RunCommand, Wait};
pub use broadcast::{Broadcaster, Subscription};
pub use config::{EngineConfig, ExecOptions, OutputMode, RunOptions};
pub use console::Console;
pub use engine::Engine;
pub use error::{Error, Result};
pub use launcher::{Launcher, SessionId, SessionIds};
pub use parser::{parse_file, parse_str};
pub use pty::{PtySession, Terminal};
pub use redact::redact_secret;
