//! Logging and tracing initialization.
//!
//! Console logging goes to stderr so it never interleaves with report
//! output on stdout. When a log directory is configured, a JSONL file
//! layer is added via a non-blocking appender; the returned guard must be
//! held for the life of the process so buffered events flush on exit.

use anyhow::Context;
use camino::Utf8Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Build the log filter from CLI flags and configured level.
///
/// `RUST_LOG` always wins when set. Otherwise: `--quiet` drops to errors
/// only, each `-v` raises verbosity (`-v` debug, `-vv` trace), and the
/// config file's level is the baseline.
pub fn env_filter(quiet: bool, verbose: u8, config_level: &str) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => config_level,
            1 => "debug",
            _ => "trace",
        }
    };
    EnvFilter::new(level)
}

/// Initialize the global subscriber.
///
/// Returns the appender guard when file logging is active.
pub fn init_observability(
    log_dir: Option<&Utf8Path>,
    env_filter: EnvFilter,
) -> anyhow::Result<Option<WorkerGuard>> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter);

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir.as_std_path())
                .with_context(|| format!("failed to create log directory {dir}"))?;
            let appender = tracing_appender::rolling::daily(dir.as_std_path(), "slashlint.jsonl");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = fmt::layer().json().with_writer(writer);
            tracing_subscriber::registry()
                .with(console_layer)
                .with(file_layer)
                .try_init()
                .context("failed to set global tracing subscriber")?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(console_layer)
                .try_init()
                .context("failed to set global tracing subscriber")?;
            Ok(None)
        }
    }
}
