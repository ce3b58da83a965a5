// crates/observability/src/lib.rs
//! Tracing setup shared by the datadesk binaries.
//!
//! Events go to stderr, filtered by `RUST_LOG` (default
//! [`DEFAULT_DIRECTIVES`]). With a log directory configured, a second,
//! uncolored copy is written to a daily-rolling file through a non-blocking
//! writer; keep the returned [`LogGuard`] alive until exit or buffered lines
//! are lost.

use std::path::PathBuf;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_DIRECTIVES: &str = "warn,datadesk=info";
pub const VERBOSE_DIRECTIVES: &str = "warn,datadesk=debug";

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Raise datadesk crates to debug, ignoring `RUST_LOG`.
    pub verbose: bool,
    /// Directory for the rolling log file. `None` logs to stderr only.
    pub log_dir: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_dir: None,
            file_prefix: "datadesk.log".to_string(),
        }
    }
}

/// Flushes the file writer on drop.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Filter directives for `config`, given the value of `RUST_LOG`.
pub fn directives(config: &LogConfig, rust_log: Option<&str>) -> String {
    if config.verbose {
        return VERBOSE_DIRECTIVES.to_string();
    }
    match rust_log.map(str::trim) {
        Some(env) if !env.is_empty() => env.to_string(),
        _ => DEFAULT_DIRECTIVES.to_string(),
    }
}

fn env_filter(config: &LogConfig) -> EnvFilter {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let wanted = directives(config, rust_log.as_deref());
    EnvFilter::try_new(&wanted).unwrap_or_else(|err| {
        eprintln!("ignoring invalid log filter {wanted:?}: {err}");
        EnvFilter::new(DEFAULT_DIRECTIVES)
    })
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: &LogConfig) -> anyhow::Result<LogGuard> {
    let (file_layer, file_guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    if let Some(dir) = &config.log_dir {
        tracing::debug!(log_dir = %dir.display(), "file logging enabled");
    }
    Ok(LogGuard { _file: file_guard })
}
