use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use rabbit_top::source::{ManagementClient, SnapshotSource};
use rabbit_top::ui::restore_terminal;
use rabbit_top::{App, Screen, Settings};

#[derive(Parser, Debug)]
#[command(name = "rabbit-top")]
#[command(about = "Terminal dashboard for monitoring a RabbitMQ cluster")]
struct Args {
    /// Broker host running the management plugin
    host: String,

    /// Only show queues of this vhost (default: all vhosts)
    #[arg(short, long)]
    vhost: Option<String>,

    /// Management API user
    #[arg(short, long, default_value = "guest")]
    user: String,

    /// Management API password
    #[arg(long, default_value = "guest")]
    password: String,

    /// Management API port
    #[arg(short, long, default_value = "15672")]
    port: u16,

    /// Use https for the management API
    #[arg(long)]
    https: bool,

    /// Refresh interval in seconds
    #[arg(short, long)]
    refresh: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Append logs to this file (nothing is logged otherwise)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log filter used when RABBIT_TOP_LOG and RUST_LOG are unset (e.g. "debug")
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    /// Apply explicit CLI flags over loaded settings.
    fn apply(&self, settings: &mut Settings) {
        if let Some(refresh) = self.refresh {
            settings.refresh_secs = refresh;
        }
        if let Some(timeout) = self.timeout {
            settings.request_timeout_secs = timeout;
        }
        if let Some(ref path) = self.log_file {
            settings.log_file = Some(path.clone());
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The screen may still hold the terminal if the loop failed.
            let _ = restore_terminal();
            error!(error = %e, "exiting");
            eprintln!("rabbit-top: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut settings = Settings::load(args.config.as_deref())?;
    args.apply(&mut settings);
    settings.validate()?;

    rabbit_top::logging::init(settings.log_file.as_deref(), args.log_level.as_deref())?;

    let mut source = ManagementClient::builder()
        .host(args.host.as_str())
        .port(args.port)
        .https(args.https)
        .credentials(args.user.as_str(), args.password.as_str())
        .vhost(args.vhost.clone())
        .timeout(settings.request_timeout())
        .build()?;

    // Probe before taking the terminal so connection errors land on a
    // normal screen.
    let first = source
        .fetch()
        .with_context(|| format!("cannot reach broker at {}", source.description()))?;
    info!(
        source = source.description(),
        nodes = first.nodes.len(),
        queues = first.queues.len(),
        "startup probe succeeded"
    );

    let refresh: Duration = settings.refresh_interval();
    let mut screen = Screen::acquire(refresh).context("cannot acquire terminal")?;
    let mut app = App::new(Box::new(source), settings.thresholds.clone())
        .with_initial_snapshot(first);

    let result = app.run(&mut screen);
    screen.release().context("failed to restore terminal")?;
    result
}
