//! [`ReadFile`] action: shows a file with `cat`, or its tail with `tail`.
//!
//! Script syntax: `read "app.log"` or `read "app.log" last 100`

use crate::action::ShellAction;
use crate::config::{ExecOptions, OutputMode};
use crate::engine::Engine;
use crate::error::Result;
use crate::parser::ArgList;
use anyhow::{Context as _, bail};
use async_trait::async_trait;

/// Prints `path`, or only its last `last` lines.
pub struct ReadFile {
    pub path: String,
    pub last: Option<usize>,
}

impl ReadFile {
    pub const NAME: &'static str = "read";

    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            last: None,
        }
    }

    pub fn last(mut self, lines: usize) -> Self {
        self.last = Some(lines);
        self
    }

    pub fn command_line(&self) -> String {
        match self.last {
            Some(lines) => format!("tail -{lines} {}", self.path),
            None => format!("cat {}", self.path),
        }
    }
}

#[async_trait(?Send)]
impl ShellAction for ReadFile {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> anyhow::Result<Self> {
        let mut args = ArgList::parse(args)?;
        let mut read = Self::new(args.quoted("path")?);
        for (key, value) in args.options()? {
            match key.as_str() {
                "last" => {
                    let lines = value
                        .as_str()
                        .parse()
                        .with_context(|| format!("Invalid line count: {}", value.as_str()))?;
                    read.last = Some(lines);
                }
                other => bail!("Unknown option for '{}': {other}", Self::NAME),
            }
        }
        Ok(read)
    }

    async fn run(&self, engine: &mut Engine, mode: Option<OutputMode>) -> Result<Option<String>> {
        engine
            .execute(&self.command_line(), ExecOptions::new().output(mode))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        assert_eq!(ReadFile::new("test.log").command_line(), "cat test.log");
        assert_eq!(
            ReadFile::new("test.log").last(1000).command_line(),
            "tail -1000 test.log"
        );
    }

    #[test]
    fn test_parse() {
        let read = ReadFile::parse(r#""/var/log/syslog" last 20"#).unwrap();
        assert_eq!(read.path, "/var/log/syslog");
        assert_eq!(read.last, Some(20));
    }

    #[test]
    fn test_parse_bad_count() {
        assert!(ReadFile::parse(r#""x.log" last many"#).is_err());
    }
}
