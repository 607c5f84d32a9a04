//! Configuration management for the status dashboard

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_STATUS_URL: &str = "https://www.cloudflarestatus.com/api/v2/summary.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Status page summary endpoint
    pub status_url: String,

    /// Time between polls
    pub poll_interval: Duration,

    /// Services shown per page
    pub page_size: usize,

    /// Number of status changes remembered per service
    pub history_depth: usize,

    /// HTTP timeout for status requests
    pub http_timeout: Duration,

    /// Where interactive mode writes its logs
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            status_url: DEFAULT_STATUS_URL.to_string(),
            poll_interval: Duration::from_secs(60),
            page_size: 10,
            history_depth: 5,
            http_timeout: Duration::from_secs(10),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(url) = env::var("STATUS_URL") {
            config.status_url = url;
        }

        if let Ok(interval) = env::var("POLL_INTERVAL_SECONDS") {
            if let Ok(seconds) = interval.parse::<u64>() {
                config.poll_interval = Duration::from_secs(seconds);
            }
        }

        if let Ok(page_size) = env::var("PAGE_SIZE") {
            if let Ok(size) = page_size.parse() {
                config.page_size = size;
            }
        }

        if let Ok(depth) = env::var("HISTORY_DEPTH") {
            if let Ok(depth) = depth.parse() {
                config.history_depth = depth;
            }
        }

        if let Ok(timeout) = env::var("HTTP_TIMEOUT_SECONDS") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.http_timeout = Duration::from_secs(seconds);
            }
        }

        if let Ok(path) = env::var("LOG_FILE") {
            if !path.trim().is_empty() {
                config.log_file = Some(PathBuf::from(path));
            }
        }

        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.status_url.trim().is_empty() {
            return Err("status_url cannot be empty".to_string());
        }

        if !self.status_url.starts_with("http://") && !self.status_url.starts_with("https://") {
            return Err(format!(
                "status_url must be an http(s) URL, got {}",
                self.status_url
            ));
        }

        if self.poll_interval.is_zero() {
            return Err("poll_interval must be greater than 0".to_string());
        }

        if self.http_timeout.is_zero() {
            return Err("http_timeout must be greater than 0".to_string());
        }

        if self.page_size == 0 {
            return Err("page_size must be greater than 0".to_string());
        }

        if self.history_depth == 0 {
            return Err("history_depth must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Command line arguments; anything given here wins over the environment.
#[derive(Debug, Parser)]
#[command(name = "atlas-status", version, about = "Live status dashboard for a Statuspage-style API")]
pub struct Cli {
    /// Status page summary endpoint
    #[arg(long)]
    pub url: Option<String>,

    /// Seconds between polls
    #[arg(long)]
    pub interval_secs: Option<u64>,

    /// Services shown per page
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Status changes remembered per service
    #[arg(long)]
    pub history_depth: Option<usize>,

    /// HTTP timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Write interactive-mode logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Fetch once, print a plain-text report and exit
    #[arg(long)]
    pub once: bool,

    /// Initial search query
    #[arg(long, default_value = "")]
    pub query: String,

    /// Initial page (1-based)
    #[arg(long, default_value_t = 1)]
    pub page: usize,
}

impl Cli {
    /// Overlay the command line on top of `base`.
    pub fn apply(&self, mut base: Config) -> Config {
        if let Some(url) = &self.url {
            base.status_url = url.clone();
        }
        if let Some(seconds) = self.interval_secs {
            base.poll_interval = Duration::from_secs(seconds);
        }
        if let Some(size) = self.page_size {
            base.page_size = size;
        }
        if let Some(depth) = self.history_depth {
            base.history_depth = depth;
        }
        if let Some(seconds) = self.timeout_secs {
            base.http_timeout = Duration::from_secs(seconds);
        }
        if let Some(path) = &self.log_file {
            base.log_file = Some(path.clone());
        }
        base
    }
}
