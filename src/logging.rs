//! Structured logging setup.
//!
//! Everything in the crate logs through `tracing` with structured fields. This
//! module installs the subscriber: an `EnvFilter`, then a JSON (production) or
//! pretty (development) formatter, optionally behind a non-blocking writer.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `FRONTGATE_LOG_LEVEL` | `info` | trace/debug/info/warn/error |
//! | `FRONTGATE_LOG_FORMAT` | `json` | `json` or `pretty` |
//! | `FRONTGATE_LOG_ASYNC` | `true` | buffer output on a background thread |
//! | `FRONTGATE_LOG_TARGET_FILTER` | unset | extra comma-separated directives |
//! | `FRONTGATE_LOG_INCLUDE_LOCATION` | `false` | add file and line to events |
//!
//! `RUST_LOG`, when set, replaces the level-derived filter.

use anyhow::{Context, Result};
use std::env;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub format: LogFormat,
    /// Write through a non-blocking background worker
    pub async_logging: bool,
    /// Extra filter directives (comma-separated)
    pub target_filter: Option<String>,
    pub include_location: bool,
}

impl LogConfig {
    /// Read the `FRONTGATE_LOG_*` variables, falling back to production defaults
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default_prod();
        Self {
            log_level: env::var("FRONTGATE_LOG_LEVEL").unwrap_or(defaults.log_level),
            format: env::var("FRONTGATE_LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or(defaults.format),
            async_logging: env::var("FRONTGATE_LOG_ASYNC")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.async_logging),
            target_filter: env::var("FRONTGATE_LOG_TARGET_FILTER").ok(),
            include_location: env::var("FRONTGATE_LOG_INCLUDE_LOCATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.include_location),
        }
    }

    #[must_use]
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            async_logging: false,
            target_filter: None,
            include_location: true,
        }
    }

    #[must_use]
    pub fn default_prod() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            async_logging: true,
            target_filter: None,
            include_location: false,
        }
    }

    /// Level named by `log_level`; unknown names mean `info`
    #[must_use]
    pub fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// Filter built from the level, the transport cap and `target_filter`.
    ///
    /// # Errors
    ///
    /// Fails when a built-in directive cannot be parsed. Invalid user
    /// directives are skipped with a warning on stderr.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level().as_str()));

        // may_minihttp reports every client disconnect; keep warn and above only
        filter = filter.add_directive(
            "may_minihttp=warn"
                .parse()
                .context("invalid may_minihttp directive")?,
        );

        if let Some(target_filter) = &self.target_filter {
            for directive in target_filter.split(',').map(str::trim).filter(|d| !d.is_empty()) {
                match directive.parse() {
                    Ok(d) => filter = filter.add_directive(d),
                    Err(_) => eprintln!("Warning: Invalid log filter directive: {directive}"),
                }
            }
        }
        Ok(filter)
    }
}

fn fmt_layer<S, W>(config: &LogConfig, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
    }
}

/// Install the global subscriber.
///
/// With async logging the returned guard owns the background writer; keep it
/// alive until exit so buffered lines are flushed.
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
pub fn init_logging_with_config(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = config.env_filter()?;
    if config.async_logging {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer(config, writer))
            .try_init()
            .context("Failed to initialize async logging")?;
        Ok(Some(guard))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer(config, std::io::stdout))
            .try_init()
            .context("Failed to initialize sync logging")?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("PRETTY"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("anything"), LogFormat::Json);
    }

    #[test]
    fn test_defaults() {
        let dev = LogConfig::default_dev();
        assert_eq!(dev.level(), Level::DEBUG);
        assert_eq!(dev.format, LogFormat::Pretty);
        assert!(!dev.async_logging);

        let prod = LogConfig::default_prod();
        assert_eq!(prod.level(), Level::INFO);
        assert_eq!(prod.format, LogFormat::Json);
        assert!(prod.async_logging);
    }

    #[test]
    fn test_unknown_level_is_info() {
        let mut config = LogConfig::default_prod();
        config.log_level = "loud".to_string();
        assert_eq!(config.level(), Level::INFO);
    }

    #[test]
    fn test_env_filter_skips_bad_directives() {
        let mut config = LogConfig::default_dev();
        config.target_filter = Some("frontgate=trace, ,[bad".to_string());
        assert!(config.env_filter().is_ok());
    }
}
