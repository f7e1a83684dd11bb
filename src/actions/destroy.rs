//! [`Destroy`] action: terminates the shell process.
//!
//! Script syntax: `destroy`

use crate::action::ShellAction;
use crate::config::OutputMode;
use crate::engine::Engine;
use crate::error::Result;
use anyhow::bail;
use async_trait::async_trait;

/// Kills the shell without going through the command engine.
///
/// Any later step that writes to the shell fails with
/// [`Error::WriteAfterTermination`](crate::Error::WriteAfterTermination).
pub struct Destroy;

impl Destroy {
    pub const NAME: &'static str = "destroy";
}

#[async_trait(?Send)]
impl ShellAction for Destroy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> anyhow::Result<Self> {
        if !args.trim().is_empty() {
            bail!("'{}' takes no arguments", Self::NAME);
        }
        Ok(Self)
    }

    async fn run(&self, engine: &mut Engine, _mode: Option<OutputMode>) -> Result<Option<String>> {
        engine.destroy();
        Ok(None)
    }
}
