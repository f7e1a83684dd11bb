use anyhow::{Context, Result};
use clap::Parser;
use futures::future::join_all;
use std::time::Duration;
use ttydrive::parser::parse_duration;
use ttydrive::{Launcher, OutputMode, RunOptions, parse_str};

#[derive(Parser, Debug)]
#[command(
    name = "ttydrive",
    about = "Run a ttydrive script against interactive shells, one session per target",
    version
)]
struct Args {
    /// Path to the script file
    #[arg(short, long)]
    script: String,

    /// Targets to fan out over; `{target}` in the script is replaced by each one
    targets: Vec<String>,

    /// Capture command output and print it per target instead of streaming it
    #[arg(long)]
    capture: bool,

    /// Do not log each command to stderr
    #[arg(long)]
    echo_off: bool,

    /// Wait between typing a command and submitting it
    #[arg(long, env = "TTYDRIVE_RTT", default_value = "200ms", value_parser = duration)]
    rtt: Duration,

    /// How long a command may take to finish
    #[arg(long, env = "TTYDRIVE_TIMEOUT", default_value = "30s", value_parser = duration)]
    timeout: Duration,

    /// Delay between starting consecutive target sessions
    #[arg(long, default_value = "0ms", value_parser = duration)]
    stagger: Duration,

    /// Shell program to spawn instead of the default shell
    #[arg(long, env = "TTYDRIVE_SHELL")]
    shell: Option<String>,
}

fn duration(s: &str) -> Result<Duration, String> {
    parse_duration(s).map_err(|e| e.to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttydrive=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let script = std::fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read script file: {}", args.script))?;
    // Fail fast on syntax errors before any shell is spawned.
    parse_str(&script)
        .with_context(|| format!("Failed to parse script file: {}", args.script))?;

    let launcher = match &args.shell {
        Some(shell) => Launcher::with_shell(shell),
        None => Launcher::new(),
    };
    let mode = if args.capture {
        OutputMode::Capture
    } else {
        OutputMode::Print
    };

    let targets: Vec<Option<String>> = if args.targets.is_empty() {
        vec![None]
    } else {
        args.targets.iter().cloned().map(Some).collect()
    };

    let runs = targets.iter().enumerate().map(|(index, target)| {
        let options = RunOptions::new()
            .start_delay(args.stagger * index as u32)
            .echo_off(args.echo_off)
            .round_trip_delay(args.rtt)
            .sentinel_timeout(args.timeout)
            .default_output_mode(mode);
        let source = match target {
            Some(target) => script.replace("{target}", target),
            None => script.clone(),
        };
        let launcher = &launcher;
        async move {
            let steps = parse_str(&source)?;
            launcher
                .run(&options, move |sh| {
                    Box::pin(async move { Ok::<_, anyhow::Error>(sh.run_steps(&steps).await?) })
                })
                .await
        }
    });
    let results = join_all(runs).await;

    let mut failed = false;
    for (target, result) in targets.iter().zip(results) {
        let label = target.as_deref().unwrap_or("local");
        match result {
            Ok(captured) if args.targets.is_empty() => {
                for output in captured {
                    println!("{output}");
                }
            }
            Ok(captured) => {
                println!(">>>>> {label}\n{}\n<<<<<\n", captured.join("\n"));
            }
            Err(e) => {
                failed = true;
                eprintln!("Error [{label}]: {e:#}");
            }
        }
    }

    if failed {
        anyhow::bail!("one or more sessions failed");
    }
    Ok(())
}
