//! [`Exit`] action: leaves the current shell.
//!
//! Script syntax: `exit` or `exit until "logout"`

use crate::action::ShellAction;
use crate::config::{ExecOptions, OutputMode};
use crate::engine::Engine;
use crate::error::Result;
use crate::parser::ArgList;
use anyhow::bail;
use async_trait::async_trait;

/// Sends `exit` and waits for the session-closed message.
///
/// The default sentinel `closed` matches SSH's "Connection to host closed."
pub struct Exit {
    pub sentinel: String,
}

impl Exit {
    pub const NAME: &'static str = "exit";

    pub const DEFAULT_SENTINEL: &'static str = "closed";

    pub fn until(sentinel: impl Into<String>) -> Self {
        Self {
            sentinel: sentinel.into(),
        }
    }
}

impl Default for Exit {
    fn default() -> Self {
        Self::until(Self::DEFAULT_SENTINEL)
    }
}

#[async_trait(?Send)]
impl ShellAction for Exit {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> anyhow::Result<Self> {
        let mut exit = Self::default();
        for (key, value) in ArgList::parse(args)?.options()? {
            match key.as_str() {
                "until" => exit.sentinel = value.into_string(),
                other => bail!("Unknown option for '{}': {other}", Self::NAME),
            }
        }
        Ok(exit)
    }

    async fn run(&self, engine: &mut Engine, mode: Option<OutputMode>) -> Result<Option<String>> {
        engine
            .execute(
                "exit",
                ExecOptions::new().sentinel(self.sentinel.as_str()).output(mode),
            )
            .await
    }
}
