//! [`Login`] action: opens an SSH session to another host.
//!
//! Script syntax:
//! - `login "db01"`
//! - `login "10.0.0.5" user "root" password "s3cret" port 2022`
//! - `login "db01" until "$ "`: wait for a prompt instead of `ogin`

use crate::action::ShellAction;
use crate::config::{ExecOptions, OutputMode};
use crate::console;
use crate::engine::Engine;
use crate::error::Result;
use crate::parser::ArgList;
use crate::redact::redact_secret;
use anyhow::{Context as _, bail};
use async_trait::async_trait;

/// Runs `ssh [user@]host [-p port]`, answering the password prompt when a
/// password is given.
///
/// Completion is detected on `ogin`, which matches the "Last login" banner
/// most hosts print. With a password, the SSH invocation first waits for
/// `assword` (the password prompt), then the password is typed and the
/// final sentinel awaited. The password only ever reaches the operator log in
/// redacted form.
pub struct Login {
    pub host: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub port: Option<u16>,
    pub sentinel: String,
}

impl Login {
    pub const NAME: &'static str = "login";

    pub const DEFAULT_SENTINEL: &'static str = "ogin";

    pub const PASSWORD_PROMPT: &'static str = "assword";

    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: None,
            password: None,
            port: None,
            sentinel: Self::DEFAULT_SENTINEL.to_string(),
        }
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn until(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    /// The `ssh` invocation for this login.
    pub fn command_line(&self) -> String {
        let mut cmd = String::from("ssh ");
        if let Some(username) = &self.username {
            cmd.push_str(username);
            cmd.push('@');
        }
        cmd.push_str(&self.host);
        if let Some(port) = self.port {
            cmd.push_str(&format!(" -p {port}"));
        }
        cmd
    }
}

#[async_trait(?Send)]
impl ShellAction for Login {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> anyhow::Result<Self> {
        let mut args = ArgList::parse(args)?;
        let mut login = Self::new(args.quoted("host")?);
        for (key, value) in args.options()? {
            match key.as_str() {
                "user" => login.username = Some(value.into_string()),
                "password" => login.password = Some(value.into_string()),
                "port" => {
                    let port = value
                        .as_str()
                        .parse()
                        .with_context(|| format!("Invalid port: {}", value.as_str()))?;
                    login.port = Some(port);
                }
                "until" => login.sentinel = value.into_string(),
                other => bail!("Unknown option for '{}': {other}", Self::NAME),
            }
        }
        Ok(login)
    }

    async fn run(&self, engine: &mut Engine, mode: Option<OutputMode>) -> Result<Option<String>> {
        let cmd = self.command_line();
        match &self.password {
            Some(password) => {
                engine
                    .execute(
                        &cmd,
                        ExecOptions::new()
                            .sentinel(Self::PASSWORD_PROMPT)
                            .output(mode),
                    )
                    .await?;
                engine
                    .execute(
                        password,
                        ExecOptions::new()
                            .sentinel(self.sentinel.as_str())
                            .output(mode)
                            .log_with(|secret| console::secret_message(&redact_secret(secret))),
                    )
                    .await
            }
            None => {
                engine
                    .execute(
                        &cmd,
                        ExecOptions::new().sentinel(self.sentinel.as_str()).output(mode),
                    )
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        assert_eq!(Login::new("db01").command_line(), "ssh db01");
        assert_eq!(
            Login::new("10.0.0.5").username("root").port(2022).command_line(),
            "ssh root@10.0.0.5 -p 2022"
        );
    }

    #[test]
    fn test_parse() {
        let login =
            Login::parse(r#""10.0.0.5" user "root" password "123456" port 2022"#).unwrap();
        assert_eq!(login.host, "10.0.0.5");
        assert_eq!(login.username.as_deref(), Some("root"));
        assert_eq!(login.password.as_deref(), Some("123456"));
        assert_eq!(login.port, Some(2022));
        assert_eq!(login.sentinel, "ogin");
    }

    #[test]
    fn test_parse_custom_sentinel() {
        let login = Login::parse(r#""db01" until "$ ""#).unwrap();
        assert_eq!(login.sentinel, "$ ");
    }

    #[test]
    fn test_parse_bad_port() {
        assert!(Login::parse(r#""db01" port http"#).is_err());
    }
}
