//! Logging initialization.
//!
//! Logs go to stderr so they never mix with command output, or to a file
//! when one is configured.

use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// The non-blocking writer flushes only while its guard is alive
static LOG_GUARD: Mutex<Option<tracing_appender::non_blocking::WorkerGuard>> = Mutex::new(None);

/// Filter directive for the CLI: `RUST_LOG` wins, then `--verbose`, then the config.
pub fn filter_directive(config_level: &str, verbose: bool) -> String {
    match std::env::var("RUST_LOG") {
        Ok(env) if !env.trim().is_empty() => env,
        _ if verbose => "debug".to_string(),
        _ => config_level.to_string(),
    }
}

/// Initialize logging to stderr.
pub fn init_telemetry(log_level: &str, json_format: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(log_level)?;

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init()?;
    }

    Ok(())
}

/// Initialize logging with file output.
pub fn init_telemetry_with_file(
    log_level: &str,
    json_format: bool,
    log_file: &std::path::Path,
) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(log_level)?;

    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(non_blocking))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .try_init()?;
    }

    if let Ok(mut g) = LOG_GUARD.lock() {
        *g = Some(guard);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_directive_rejected() {
        assert!(EnvFilter::try_new("chainvault=loud").is_err());
    }

    #[test]
    fn test_verbose_overrides_config() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        assert_eq!(filter_directive("warn", true), "debug");
        assert_eq!(filter_directive("info", false), "info");
    }
}
