use crate::error::{Error, Result};
use portable_pty::{Child, CommandBuilder, MasterPty, PtySize};
use std::io::{Read, Write};
use tracing::debug;

/// Input side of a running shell.
///
/// [`PtySession`] is the real implementation; tests substitute fakes that
/// publish scripted output into a [`Broadcaster`](crate::Broadcaster).
pub trait Terminal: Send {
    /// Write raw bytes to the shell's stdin.
    ///
    /// Fails with [`Error::WriteAfterTermination`] once the session has been
    /// terminated or the shell has exited.
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Ask the shell to exit and release the input handle. Idempotent.
    fn terminate(&mut self);

    fn is_terminated(&self) -> bool;
}

/// An interactive shell running inside a PTY
pub struct PtySession {
    #[allow(dead_code)]
    master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send + Sync>,
    writer: Option<Box<dyn Write + Send>>,
}

impl PtySession {
    /// Spawn a shell in a PTY, returning the session and its output reader separately.
    ///
    /// With `program` unset the user's default interactive shell is used (the
    /// command shell on Windows). The shell starts in the home directory and
    /// inherits the current environment.
    pub fn spawn(program: Option<&str>) -> Result<(Self, Box<dyn Read + Send>)> {
        let pty_system = portable_pty::native_pty_system();

        let pty_size = PtySize {
            rows: 24,
            cols: 80,
            pixel_width: 0,
            pixel_height: 0,
        };

        let pair = pty_system
            .openpty(pty_size)
            .map_err(|e| Error::Spawn(format!("failed to open PTY: {e}")))?;

        let mut cmd = match program {
            Some(program) => CommandBuilder::new(program),
            None => CommandBuilder::new_default_prog(),
        };
        if let Some(home) = dirs::home_dir() {
            cmd.cwd(home);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| Error::Spawn(format!("failed to spawn shell: {e}")))?;

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| Error::Spawn(format!("failed to get PTY writer: {e}")))?;

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| Error::Spawn(format!("failed to get PTY reader: {e}")))?;

        debug!(program = program.unwrap_or("<default shell>"), pid = ?child.process_id(), "spawned shell");

        let session = PtySession {
            master: pair.master,
            child,
            writer: Some(writer),
        };

        Ok((session, reader))
    }

    /// Check if the shell process is still running
    pub fn is_running(&mut self) -> bool {
        self.child.try_wait().ok().flatten().is_none()
    }
}

impl Terminal for PtySession {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        if !self.is_running() {
            self.writer = None;
        }
        let writer = self.writer.as_mut().ok_or(Error::WriteAfterTermination)?;
        writer.write_all(data)?;
        writer.flush()?;
        Ok(())
    }

    fn terminate(&mut self) {
        if self.writer.take().is_none() && !self.is_running() {
            return;
        }
        if self.is_running() {
            if let Err(e) = self.child.kill() {
                debug!(error = %e, "failed to kill shell");
            }
            // Reap the child so it does not linger as a zombie.
            let _ = self.child.try_wait();
        }
        debug!(pid = ?self.child.process_id(), "terminated shell");
    }

    fn is_terminated(&self) -> bool {
        self.writer.is_none()
    }
}

impl Drop for PtySession {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_terminate_is_idempotent() {
        let (mut session, _reader) = PtySession::spawn(Some("/bin/sh")).unwrap();
        assert!(!session.is_terminated());
        session.terminate();
        session.terminate();
        assert!(session.is_terminated());
    }

    #[test]
    fn test_write_after_terminate_fails() {
        let (mut session, _reader) = PtySession::spawn(Some("/bin/sh")).unwrap();
        session.write(b"true\n").unwrap();
        session.terminate();
        let err = session.write(b"echo nope\n").unwrap_err();
        assert!(matches!(err, Error::WriteAfterTermination));
    }

    #[test]
    fn test_spawn_missing_program_fails() {
        let result = PtySession::spawn(Some("/definitely/not/a/shell"));
        assert!(matches!(result, Err(Error::Spawn(_))));
    }
}
