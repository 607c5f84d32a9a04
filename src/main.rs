//! Atlas Status Dashboard Binary

use atlas_status::render::render_text;
use atlas_status::{
    Cli, Config, DashboardError, DashboardState, Poller, Result, StatusClient, StatusSource, tui,
};
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = cli.apply(Config::from_env());

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation failed: {}", e);
        std::process::exit(2);
    }

    if let Err(e) = initialize_tracing(&config, cli.once) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(2);
    }

    info!(
        "Starting atlas-status v{} against {}",
        env!("CARGO_PKG_VERSION"),
        config.status_url
    );

    let outcome = if cli.once {
        run_once(&cli, &config).await
    } else {
        run_interactive(&cli, &config).await
    };

    if let Err(e) = outcome {
        error!("atlas-status failed: {}", e);
        std::process::exit(1);
    }
}

/// Fetch a single snapshot and print it.
async fn run_once(cli: &Cli, config: &Config) -> Result<()> {
    let client = StatusClient::new(config.status_url.clone(), config.http_timeout)?;
    let mut state = DashboardState::new(config.page_size, config.history_depth);

    let result = client.fetch_snapshot().await;
    let failure = match result {
        Ok(snapshot) => {
            state.apply_snapshot(snapshot);
            None
        }
        Err(e) => {
            state.apply_failure();
            Some(e)
        }
    };

    state.set_query(cli.query.clone());
    state.set_page(cli.page);
    print!("{}", render_text(&state.view(), config.poll_interval));

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn run_interactive(cli: &Cli, config: &Config) -> Result<()> {
    let client = StatusClient::new(config.status_url.clone(), config.http_timeout)?;
    let poller = Poller::spawn(Arc::new(client), config.poll_interval);

    let mut state = DashboardState::new(config.page_size, config.history_depth);
    state.set_query(cli.query.clone());
    state.set_page(cli.page);

    let poll_interval = config.poll_interval;
    tokio::task::spawn_blocking(move || tui::run(state, poller, poll_interval))
        .await
        .map_err(|e| DashboardError::Terminal(format!("dashboard task failed: {}", e)))?
}

/// Initialize structured logging.
///
/// Interactive mode owns the terminal, so logs go to the configured file or
/// nowhere; `--once` logs to stderr.
fn initialize_tracing(config: &Config, once: bool) -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
        .map_err(|e| DashboardError::Config(format!("invalid log filter: {}", e)))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(false)
        .json();

    let registry = tracing_subscriber::registry().with(filter_layer);

    if once {
        registry.with(fmt_layer.with_writer(std::io::stderr)).init();
    } else if let Some(path) = &config.log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        registry.with(fmt_layer.with_writer(Mutex::new(file))).init();
    } else {
        registry.with(fmt_layer.with_writer(std::io::sink)).init();
    }

    Ok(())
}
