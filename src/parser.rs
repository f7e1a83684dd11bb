//! Parser for ttydrive scripts.
//!
//! The top-level entry points are [`parse_str`] and [`parse_file`].

use crate::action::{ShellAction, Step};
use crate::actions::{Destroy, Exit, Login, ReadFile, RunCommand, Wait};
use crate::config::OutputMode;
use anyhow::{Context as _, Result, anyhow, bail};
use std::path::Path;
use std::time::Duration;

/// Parse a ttydrive script from a string slice and return the resulting steps.
///
/// Lines that are empty or start with `#` are ignored. Inline comments (` # …`)
/// are stripped while preserving `#` characters inside quoted strings. A line
/// may start with `capture` or `print` to force that step's output mode.
///
/// # Errors
///
/// Returns an error if any line contains an unknown action, a malformed
/// argument, or an unclosed quoted string.
///
/// # Example
///
/// ```
/// use ttydrive::parse_str;
///
/// let steps = parse_str("run \"uptime\"\ncapture read \"app.log\" last 20\n").unwrap();
/// assert_eq!(steps.len(), 2);
/// ```
pub fn parse_str(content: &str) -> Result<Vec<Step>> {
    let mut steps = Vec::new();
    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = strip_inline_comment(line);
        let step = parse_line(line)
            .with_context(|| format!("Failed to parse line {}: {}", line_num + 1, line))?;
        steps.push(step);
    }
    Ok(steps)
}

/// Parse a ttydrive script from a file and return the resulting steps.
///
/// # Errors
///
/// Returns an error if the file cannot be read or if the script is malformed.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Vec<Step>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script file: {}", path.display()))?;
    parse_str(&content)
}

type ParseFn = fn(&str) -> Result<Box<dyn ShellAction>>;

static REGISTRY: &[(&str, ParseFn)] = &[
    (RunCommand::NAME, RunCommand::parse_boxed),
    (Login::NAME, Login::parse_boxed),
    (ReadFile::NAME, ReadFile::parse_boxed),
    (Exit::NAME, Exit::parse_boxed),
    (Destroy::NAME, Destroy::parse_boxed),
    (Wait::NAME, Wait::parse_boxed),
];

/// Dispatch a single non-empty, non-comment line to the matching action's parser.
fn parse_line(line: &str) -> Result<Step> {
    let (mode, rest) = match split_word(line) {
        ("capture", rest) => (Some(OutputMode::Capture), rest),
        ("print", rest) => (Some(OutputMode::Print), rest),
        _ => (None, line),
    };
    let (name, args) = split_word(rest);
    let action = REGISTRY
        .iter()
        .find(|(action_name, _)| *action_name == name)
        .map(|(_, parse)| parse(args))
        .unwrap_or_else(|| Err(anyhow!("Unknown action: {}", line)))?;
    Ok(Step { action, mode })
}

fn split_word(line: &str) -> (&str, &str) {
    let line = line.trim_start();
    line.split_once(char::is_whitespace)
        .map(|(word, rest)| (word, rest.trim_start()))
        .unwrap_or((line, ""))
}

/// Strip inline comments from a line, preserving `#` inside quoted strings.
fn strip_inline_comment(line: &str) -> &str {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }
        if ch == '#' && !in_quotes {
            return line[..i].trim();
        }
    }
    line
}

/// Parse a duration string: `1s`, `500ms`, `1.5s`.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if let Some(ms_str) = s.strip_suffix("ms") {
        let ms: u64 = ms_str
            .trim()
            .parse()
            .context("Invalid milliseconds value")?;
        Ok(Duration::from_millis(ms))
    } else if let Some(s_str) = s.strip_suffix('s') {
        let secs: f64 = s_str.trim().parse().context("Invalid seconds value")?;
        Duration::try_from_secs_f64(secs)
            .with_context(|| format!("Seconds value out of range: {}", s_str.trim()))
    } else {
        Err(anyhow!("Duration must end with 's' or 'ms', got: {}", s))
    }
}

/// Parse a double-quoted string, processing `\n`, `\t`, `\"`, and `\\`.
pub(crate) fn parse_quoted_string(s: &str) -> Result<String> {
    let s = s.trim();
    if !s.starts_with('"') {
        return Err(anyhow!("Expected string to start with '\"'"));
    }
    if s.len() < 2 || !s.ends_with('"') {
        return Err(anyhow!("Expected string to end with '\"'"));
    }
    let mut out = String::with_capacity(s.len() - 2);
    let mut chars = s[1..s.len() - 1].chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Ok(out)
}

/// A single argument: a quoted string or a bare word.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Quoted(String),
    Word(String),
}

impl Token {
    pub(crate) fn as_str(&self) -> &str {
        match self {
            Token::Quoted(s) | Token::Word(s) => s,
        }
    }

    pub(crate) fn into_string(self) -> String {
        match self {
            Token::Quoted(s) | Token::Word(s) => s,
        }
    }
}

/// The arguments after an action keyword, consumed front to back.
///
/// Actions take an optional leading quoted operand followed by
/// `keyword value` option pairs, e.g. `"db01" user "root" port 2222`.
pub(crate) struct ArgList {
    tokens: std::vec::IntoIter<Token>,
}

impl ArgList {
    pub(crate) fn parse(args: &str) -> Result<Self> {
        Ok(Self {
            tokens: tokenize(args)?.into_iter(),
        })
    }

    /// Take the next argument, which must be a quoted string.
    pub(crate) fn quoted(&mut self, what: &str) -> Result<String> {
        match self.tokens.next() {
            Some(Token::Quoted(s)) => Ok(s),
            Some(Token::Word(w)) => bail!("Expected quoted {what}, got: {w}"),
            None => bail!("Missing quoted {what}"),
        }
    }

    /// Consume the remaining arguments as `keyword value` pairs.
    pub(crate) fn options(self) -> Result<Vec<(String, Token)>> {
        let mut pairs = Vec::new();
        let mut tokens = self.tokens;
        while let Some(key) = tokens.next() {
            let Token::Word(key) = key else {
                bail!("Expected option name, got: \"{}\"", key.as_str());
            };
            let value = tokens
                .next()
                .ok_or_else(|| anyhow!("Missing value for option '{key}'"))?;
            pairs.push((key, value));
        }
        Ok(pairs)
    }
}

fn tokenize(args: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = args.trim_start();
    while !rest.is_empty() {
        if rest.starts_with('"') {
            // Locate the closing quote, respecting backslash escapes.
            let mut escaped = false;
            let mut end_idx = None;
            for (i, ch) in rest.char_indices().skip(1) {
                if escaped {
                    escaped = false;
                    continue;
                }
                if ch == '\\' {
                    escaped = true;
                    continue;
                }
                if ch == '"' {
                    end_idx = Some(i);
                    break;
                }
            }
            let end_idx = end_idx.ok_or_else(|| anyhow!("Unclosed quote in: {}", args.trim()))?;
            tokens.push(Token::Quoted(parse_quoted_string(&rest[..=end_idx])?));
            rest = rest[end_idx + 1..].trim_start();
        } else {
            let (word, tail) = split_word(rest);
            tokens.push(Token::Word(word.to_string()));
            rest = tail;
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1s").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(
            parse_duration("1.5s").unwrap(),
            Duration::from_secs_f64(1.5)
        );
        assert!(parse_duration("5minutes").is_err());
    }

    #[test]
    fn test_parse_quoted_string() {
        assert_eq!(parse_quoted_string("\"hello\"").unwrap(), "hello");
        assert_eq!(
            parse_quoted_string("\"hello\\nworld\"").unwrap(),
            "hello\nworld"
        );
        assert!(parse_quoted_string("\"").is_err());
    }

    #[test]
    fn test_parse_quoted_string_escapes_decode_in_order() {
        assert_eq!(parse_quoted_string(r#""a\\nb""#).unwrap(), r"a\nb");
        assert_eq!(parse_quoted_string(r#""say \"hi\"\tnow""#).unwrap(), "say \"hi\"\tnow");
        assert_eq!(parse_quoted_string(r#""C:\\dir\\""#).unwrap(), r"C:\dir\");
        assert_eq!(parse_quoted_string(r#""keep \x""#).unwrap(), r"keep \x");
    }

    #[test]
    fn test_parse_duration_rejects_out_of_range_seconds() {
        assert!(parse_duration("-1s").is_err());
        assert!(parse_duration("nans").is_err());
        assert!(parse_duration("infs").is_err());
        assert!(parse_duration("1e30s").is_err());
    }

    #[test]
    fn test_bad_durations_in_scripts_are_parse_errors() {
        assert!(parse_str("wait -1s\n").is_err());
        assert!(parse_str("run \"ls\" within nans\n").is_err());
    }

    #[test]
    fn test_tokenize() {
        let tokens = tokenize(r#""db01" user "root" port 2222"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Quoted("db01".into()),
                Token::Word("user".into()),
                Token::Quoted("root".into()),
                Token::Word("port".into()),
                Token::Word("2222".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_escaped_quote() {
        let tokens = tokenize(r#""echo \"hi\"" until "hi""#).unwrap();
        assert_eq!(tokens[0], Token::Quoted(r#"echo "hi""#.into()));
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_tokenize_unclosed_quote() {
        assert!(tokenize(r#""unclosed"#).is_err());
    }

    #[test]
    fn test_options_missing_value() {
        let mut args = ArgList::parse(r#""host" port"#).unwrap();
        args.quoted("host").unwrap();
        assert!(args.options().is_err());
    }

    #[test]
    fn test_parse_all_actions() {
        let steps = parse_str(
            "run \"uptime\"\nlogin \"db01\" user \"root\"\nread \"app.log\" last 10\nexit\nwait 100ms\ndestroy\n",
        )
        .unwrap();
        let names: Vec<_> = steps.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["run", "login", "read", "exit", "wait", "destroy"]);
        assert!(steps.iter().all(|s| s.mode.is_none()));
    }

    #[test]
    fn test_parse_mode_prefix() {
        let steps = parse_str("capture read \"x.log\"\nprint run \"ls\"\n").unwrap();
        assert_eq!(steps[0].name(), "read");
        assert_eq!(steps[0].mode, Some(OutputMode::Capture));
        assert_eq!(steps[1].name(), "run");
        assert_eq!(steps[1].mode, Some(OutputMode::Print));
    }

    #[test]
    fn test_parse_comments_and_blank_lines() {
        let steps = parse_str("# setup\n\nrun \"ls\" # list\n\n# done\n").unwrap();
        assert_eq!(steps.len(), 1);
    }

    #[test]
    fn test_parse_unknown_action() {
        let err = format!("{:#}", parse_str("reboot \"now\"").err().unwrap());
        assert!(err.contains("Unknown action"), "got: {err}");
    }

    #[test]
    fn test_strip_inline_comments() {
        assert_eq!(strip_inline_comment("wait 1s # comment"), "wait 1s");
        assert_eq!(
            strip_inline_comment("run \"echo #tag\" # inline"),
            "run \"echo #tag\""
        );
    }
}
