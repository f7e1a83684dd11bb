//! [`RunCommand`] action: executes an arbitrary shell command.
//!
//! Script syntax:
//! - `run "uptime"`: random sentinel appended automatically
//! - `run "sudo -i" until "assword"`: wait for a prompt instead
//! - `run "make" within 600s`: custom sentinel timeout

use crate::action::ShellAction;
use crate::config::{ExecOptions, OutputMode};
use crate::engine::Engine;
use crate::error::Result;
use crate::parser::{ArgList, parse_duration};
use anyhow::bail;
use async_trait::async_trait;
use std::time::Duration;

/// Runs `command` and waits for it to finish.
pub struct RunCommand {
    pub command: String,
    /// Text to wait for instead of an appended `echo` sentinel.
    pub sentinel: Option<String>,
    pub timeout: Option<Duration>,
}

impl RunCommand {
    pub const NAME: &'static str = "run";

    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            sentinel: None,
            timeout: None,
        }
    }

    pub fn until(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = Some(sentinel.into());
        self
    }

    pub fn within(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait(?Send)]
impl ShellAction for RunCommand {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> anyhow::Result<Self> {
        let mut args = ArgList::parse(args)?;
        let mut cmd = Self::new(args.quoted("command")?);
        for (key, value) in args.options()? {
            match key.as_str() {
                "until" => cmd.sentinel = Some(value.into_string()),
                "within" => cmd.timeout = Some(parse_duration(value.as_str())?),
                other => bail!("Unknown option for '{}': {other}", Self::NAME),
            }
        }
        Ok(cmd)
    }

    async fn run(&self, engine: &mut Engine, mode: Option<OutputMode>) -> Result<Option<String>> {
        let mut options = ExecOptions::new().output(mode);
        options.sentinel = self.sentinel.clone();
        options.timeout = self.timeout;
        engine.execute(&self.command, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let cmd = RunCommand::parse(r#""uptime""#).unwrap();
        assert_eq!(cmd.command, "uptime");
        assert!(cmd.sentinel.is_none());
        assert!(cmd.timeout.is_none());
    }

    #[test]
    fn test_parse_options() {
        let cmd = RunCommand::parse(r#""sudo -i" until "assword" within 5s"#).unwrap();
        assert_eq!(cmd.command, "sudo -i");
        assert_eq!(cmd.sentinel.as_deref(), Some("assword"));
        assert_eq!(cmd.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_parse_unknown_option() {
        assert!(RunCommand::parse(r#""ls" after "x""#).is_err());
    }

    #[test]
    fn test_parse_missing_quote() {
        assert!(RunCommand::parse("ls").is_err());
    }
}
