//! # Micro-Application Shell
//!
//! Console host for the shell runtime.
//!
//! ## Startup Sequence
//!
//! 1. Parse arguments, initialize telemetry
//! 2. Load configuration (file, then `SHELL_*` overrides) and validate it
//! 3. Wire the components and boot (handlers, sandbox setup, first navigation)
//! 4. Read commands from stdin until `quit`, EOF or Ctrl+C
//! 5. Shut down (unsubscribe handlers, dispose sandboxes)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use shell_runtime::{Command, NavigationOutcome, ShellConfig, ShellRuntime};
use shell_telemetry::{gather_metrics, init_telemetry, TelemetryConfig};

/// Micro-application shell host
#[derive(Parser, Debug)]
#[command(name = "shell-runtime")]
#[command(about = "Console host for the micro-application shell")]
struct Args {
    /// JSON configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter, overrides SHELL_LOG_LEVEL / RUST_LOG
    #[arg(short, long)]
    log_level: Option<String>,
}

fn load_config(path: Option<&PathBuf>) -> Result<ShellConfig> {
    let config = match path {
        Some(path) => ShellConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ShellConfig::default(),
    }
    .with_env_overrides();
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn print_outcome(outcome: &NavigationOutcome) {
    let active = outcome
        .activation
        .as_ref()
        .map(|a| format!(" sub_app={} relative={}", a.sub_app, a.relative_path))
        .unwrap_or_default();
    println!(
        "at {} ({:?}, {} redirect(s)){active}",
        outcome.location,
        outcome.kind,
        outcome.redirects
    );
    if let Some(error) = &outcome.error {
        println!("  sub-application unavailable: {error}");
    }
}

/// Run one command. Returns `false` to stop.
async fn execute(shell: &ShellRuntime, command: Command) -> bool {
    match command {
        Command::Navigate(path) => match shell.navigate(&path).await {
            Ok(outcome) => print_outcome(&outcome),
            Err(e) => println!("navigation failed: {e}"),
        },
        Command::Login { username, password } => match shell.login(&username, &password).await {
            Ok(outcome) => print_outcome(&outcome),
            Err(e) => println!("login failed: {e}"),
        },
        Command::Logout => println!("at {}", shell.logout()),
        Command::Status => println!("{}", shell.status()),
        Command::Metrics => match gather_metrics() {
            Ok(text) => print!("{text}"),
            Err(e) => println!("metrics unavailable: {e}"),
        },
        Command::Help => println!("{}", Command::HELP),
        Command::Quit => return false,
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let telemetry = TelemetryConfig::from_env().with_log_level(args.log_level.clone());
    let _telemetry = init_telemetry(telemetry).context("initializing telemetry")?;

    let config = load_config(args.config.as_ref())?;
    let shell = ShellRuntime::new(config).context("wiring shell components")?;
    let outcome = shell.boot().await.context("booting shell")?;
    print_outcome(&outcome);
    println!("{}", Command::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line.context("reading stdin")? {
                    Some(line) => line,
                    None => break,
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(command) => {
                        if !execute(&shell, command).await {
                            break;
                        }
                    }
                    Err(e) => println!("{e}"),
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "Ctrl+C handler failed");
                }
                info!("Interrupted");
                break;
            }
        }
    }

    shell.shutdown();
    Ok(())
}
