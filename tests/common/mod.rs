#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use ttydrive::{Broadcaster, Console, Engine, EngineConfig, Error, Terminal};

type Responder = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// A scripted stand-in for a shell behind a PTY.
///
/// Typed bytes are echoed back after `echo_delay`, like a terminal in
/// cooked mode. When a newline arrives the line typed so far is handed to the
/// responder, whose answer is published after `respond_delay`.
pub struct FakeShell {
    output: Broadcaster,
    respond: Responder,
    echo: bool,
    echo_delay: Duration,
    respond_delay: Duration,
    line: String,
    pub input: Arc<Mutex<Vec<u8>>>,
    pub terminated: Arc<AtomicBool>,
}

impl FakeShell {
    pub fn new(
        output: Broadcaster,
        respond: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            output,
            respond: Arc::new(respond),
            echo: true,
            echo_delay: Duration::from_millis(5),
            respond_delay: Duration::from_millis(20),
            line: String::new(),
            input: Arc::new(Mutex::new(Vec::new())),
            terminated: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn without_echo(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn echo_delay(mut self, delay: Duration) -> Self {
        self.echo_delay = delay;
        self
    }

    pub fn respond_delay(mut self, delay: Duration) -> Self {
        self.respond_delay = delay;
        self
    }

    fn publish_later(&self, data: Vec<u8>, delay: Duration) {
        let output = self.output.clone();
        thread::spawn(move || {
            thread::sleep(delay);
            output.publish(&data);
        });
    }
}

impl Terminal for FakeShell {
    fn write(&mut self, data: &[u8]) -> ttydrive::Result<()> {
        if self.terminated.load(Ordering::SeqCst) {
            return Err(Error::WriteAfterTermination);
        }
        self.input.lock().unwrap().extend_from_slice(data);

        for &byte in data {
            if byte == b'\n' {
                let line = std::mem::take(&mut self.line);
                if let Some(reply) = (self.respond)(&line) {
                    self.publish_later(reply.into_bytes(), self.respond_delay);
                }
            } else {
                self.line.push(byte as char);
            }
        }

        if self.echo && data != b"\n" {
            self.publish_later(data.to_vec(), self.echo_delay);
        }
        Ok(())
    }

    fn terminate(&mut self) {
        self.terminated.store(true, Ordering::SeqCst);
    }

    fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

/// Console that records stdout and stderr separately.
#[derive(Clone, Default)]
pub struct Recorded {
    pub stdout: Arc<Mutex<Vec<u8>>>,
    pub stderr: Arc<Mutex<Vec<u8>>>,
}

impl Recorded {
    pub fn console(&self) -> Console {
        let (out, err) = (self.stdout.clone(), self.stderr.clone());
        Console::new(
            move |d| out.lock().unwrap().extend_from_slice(d),
            move |d| err.lock().unwrap().extend_from_slice(d),
        )
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.stdout.lock().unwrap()).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.stderr.lock().unwrap()).into_owned()
    }
}

/// Engine config with a short round trip so tests stay fast.
pub fn fast_config() -> EngineConfig {
    EngineConfig {
        round_trip_delay: Duration::from_millis(60),
        sentinel_timeout: Duration::from_secs(5),
        ..EngineConfig::default()
    }
}

/// Responder that answers `<cmd>; echo <sentinel>` with `reply` followed by
/// the sentinel, the way a real shell would.
pub fn echo_sentinel(reply: &'static str) -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
    move |line: &str| {
        let (_, sentinel) = line.rsplit_once("; echo ")?;
        Some(format!("{reply}{sentinel}\r\nprompt$ "))
    }
}

/// An engine wired to a [`FakeShell`], with handles to inspect the shell.
pub struct FakeSession {
    pub engine: Engine,
    pub output: Broadcaster,
    pub input: Arc<Mutex<Vec<u8>>>,
    pub terminated: Arc<AtomicBool>,
}

impl FakeSession {
    pub fn new(
        id: u64,
        shell: impl FnOnce(Broadcaster) -> FakeShell,
        config: EngineConfig,
        console: Console,
    ) -> Self {
        let output = Broadcaster::new();
        let fake = shell(output.clone());
        let input = fake.input.clone();
        let terminated = fake.terminated.clone();
        let engine = Engine::attach(id, Box::new(fake), output.clone(), config, console);
        Self {
            engine,
            output,
            input,
            terminated,
        }
    }

    pub fn input(&self) -> String {
        String::from_utf8_lossy(&self.input.lock().unwrap()).into_owned()
    }
}
