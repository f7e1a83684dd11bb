//! [`Wait`] action: pauses the script for a fixed duration.
//!
//! Script syntax: `wait 500ms` or `wait 1.5s`

use crate::action::ShellAction;
use crate::config::OutputMode;
use crate::engine::Engine;
use crate::error::Result;
use crate::parser::parse_duration;
use async_trait::async_trait;
use std::time::Duration;

/// Pauses before the next step, e.g. to let a slow login banner settle.
pub struct Wait {
    pub duration: Duration,
}

impl Wait {
    pub const NAME: &'static str = "wait";
}

#[async_trait(?Send)]
impl ShellAction for Wait {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> anyhow::Result<Self> {
        Ok(Self {
            duration: parse_duration(args)?,
        })
    }

    async fn run(&self, _engine: &mut Engine, _mode: Option<OutputMode>) -> Result<Option<String>> {
        tokio::time::sleep(self.duration).await;
        Ok(None)
    }
}
