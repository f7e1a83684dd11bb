//! The [`ShellAction`] trait and the [`Step`] type scripts are made of.

use crate::config::OutputMode;
use crate::engine::Engine;
use crate::error::Result;
use async_trait::async_trait;

/// A named, reusable unit of shell work built on [`Engine::execute`].
///
/// To add an action to the script language:
///
/// 1. Define `pub const NAME: &'static str` on your struct, the script
///    keyword (e.g. `"login"`, `"read"`) used by the parser.
/// 2. Re-export the struct from `src/actions/mod.rs`.
/// 3. Add one entry to the `REGISTRY` in [`crate::parser`]:
///    `(MyAction::NAME, MyAction::parse_boxed)`.
#[async_trait(?Send)]
pub trait ShellAction: 'static {
    /// The action name, accessible at runtime through a trait object.
    ///
    /// Implementations should return their `NAME` constant:
    /// `fn name(&self) -> &'static str { Self::NAME }`.
    fn name(&self) -> &'static str;

    /// Parse this action from the argument string (everything after the
    /// keyword on the script line).
    fn parse(args: &str) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Parse and box this action; the function-pointer type stored in the
    /// parser registry.
    fn parse_boxed(args: &str) -> anyhow::Result<Box<dyn ShellAction>>
    where
        Self: Sized,
    {
        Ok(Box::new(Self::parse(args)?))
    }

    /// Run the action. `mode` forces print or capture for every command the
    /// action issues; `None` uses the engine default.
    ///
    /// Returns the captured output of the action's final command in capture
    /// mode, `None` otherwise.
    async fn run(&self, engine: &mut Engine, mode: Option<OutputMode>) -> Result<Option<String>>;
}

/// One parsed script line: an action plus an optional forced output mode.
pub struct Step {
    pub action: Box<dyn ShellAction>,
    pub mode: Option<OutputMode>,
}

impl Step {
    pub fn new(action: impl ShellAction) -> Self {
        Self {
            action: Box::new(action),
            mode: None,
        }
    }

    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn name(&self) -> &'static str {
        self.action.name()
    }
}
