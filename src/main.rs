//! History Watcher - incremental browser history monitoring.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use history_watcher::config::{
    load_keywords, resolve_history_path, ConfigError, ConfigLoader, WatcherConfig,
};
use history_watcher::delivery::{DeliveryError, HttpSink};
use history_watcher::display;
use history_watcher::identity::Identity;
use history_watcher::store;
use history_watcher::watcher::Watcher;

#[derive(Parser)]
#[command(
    name = "history-watcher",
    about = "Watch browser history for keywords and report matches",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (defaults to ./.history-watcher.toml, then the user config dir).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the history store until interrupted.
    Watch(Overrides),
    /// Run a single polling cycle and print its report.
    Once(Overrides),
    /// List candidate history store locations.
    Paths,
}

#[derive(Args)]
struct Overrides {
    /// History file to watch instead of the discovered one.
    #[arg(long)]
    history: Option<PathBuf>,
    /// Keyword file, one term per line.
    #[arg(short, long)]
    keywords: Option<PathBuf>,
    /// Collector host.
    #[arg(long)]
    host: Option<String>,
    /// Collector port.
    #[arg(long)]
    port: Option<u16>,
    /// Seconds between polling cycles.
    #[arg(long)]
    interval: Option<u64>,
    /// Days of history searched by the first cycle.
    #[arg(long)]
    lookback_days: Option<u32>,
}

impl Overrides {
    fn apply(self, config: &mut WatcherConfig) {
        if let Some(history) = self.history {
            config.history_path = Some(history);
        }
        if let Some(keywords) = self.keywords {
            config.keywords_file = keywords;
        }
        if let Some(host) = self.host {
            config.sink.host = host;
        }
        if let Some(port) = self.port {
            config.sink.port = port;
        }
        if let Some(interval) = self.interval {
            config.poll_interval_secs = interval;
        }
        if let Some(days) = self.lookback_days {
            config.lookback_days = days;
        }
    }
}

/// Startup failures; all of them end the process with a non-zero status.
#[derive(thiserror::Error, Debug)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
    #[error("Failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Cancel `token` on SIGINT or SIGTERM.
///
/// Handlers are registered before returning, so a signal that arrives
/// once the banner is printed always takes the graceful path.
#[cfg(unix)]
fn spawn_signal_listener(token: CancellationToken) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    tokio::spawn(async move {
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
        tracing::info!("Termination signal received");
        token.cancel();
    });
    Ok(())
}

/// Cancel `token` on Ctrl-C.
#[cfg(not(unix))]
fn spawn_signal_listener(token: CancellationToken) -> std::io::Result<()> {
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Termination signal received");
        token.cancel();
    });
    Ok(())
}

fn build_watcher(
    config: &WatcherConfig,
    cancel: &CancellationToken,
) -> Result<Watcher<HttpSink>, StartupError> {
    let history = resolve_history_path(config)?;
    let keywords = load_keywords(&config.keywords_file)?;
    let sink = HttpSink::new(
        &config.sink.host,
        config.sink.port,
        config.sink.timeout(),
        config.sink.retry_policy(),
    )?
    .with_cancellation(cancel.clone());
    let identity = Identity::resolve(
        config.identity.username.as_deref(),
        config.identity.source_ip.as_deref(),
    );

    display::print_watch_start(&history, keywords.terms(), sink.endpoint());
    tracing::info!(
        username = %identity.username,
        source_ip = %identity.source_ip,
        history = %history.display(),
        "Watcher configured"
    );

    Ok(Watcher::from_config(config, history, keywords, sink, identity)
        .with_cancellation(cancel.clone()))
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let loader = cli.config.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let mut config = loader.load()?;

    match cli.command {
        Commands::Paths => {
            for path in store::candidate_history_paths() {
                let marker = if path.is_file() { "found" } else { "missing" };
                println!("{marker:>7}  {}", path.display());
            }
        }
        Commands::Once(overrides) => {
            overrides.apply(&mut config);
            let cancel = CancellationToken::new();
            let mut watcher = build_watcher(&config, &cancel)?;
            if let Some(report) = watcher.tick().await {
                display::print_cycle_report(&report);
            }
            watcher.release().await;
        }
        Commands::Watch(overrides) => {
            overrides.apply(&mut config);
            let cancel = CancellationToken::new();
            spawn_signal_listener(cancel.clone()).map_err(StartupError::Signal)?;
            let mut watcher = build_watcher(&config, &cancel)?;
            let stats = watcher.run().await;
            display::print_stopped(&stats);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            eprintln!("history-watcher: {e}");
            ExitCode::FAILURE
        }
    }
}
