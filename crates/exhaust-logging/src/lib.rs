// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Logging setup shared by the heap exhaustion fixture and the OOM harness.
//!
//! Every binary logs to stderr through `tracing-subscriber`. `RUST_LOG`
//! overrides the default filter when set.

pub mod logging_config;

use serde::{Deserialize, Serialize};
use std::io;
use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// Re-export Level for convenience
pub use tracing::Level;

/// Output format for log messages
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable plaintext format
    #[default]
    Plaintext,
    /// Structured JSON format
    Json,
}

/// CLI log level enum for clap integration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CliLogLevel {
    /// Only error conditions
    Error,
    /// Errors and warnings
    Warn,
    /// Errors, warnings, and informational messages
    #[default]
    Info,
    /// All above plus debug information
    Debug,
    /// All above plus detailed tracing
    Trace,
}

impl From<CliLogLevel> for Level {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

/// Standardized CLI logging arguments for clap integration
///
/// Use with `#[command(flatten)]` so every harness binary exposes the same flags.
#[derive(Clone, Debug, Default, clap::Args, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CliLoggingArgs {
    /// Log verbosity level
    #[arg(long, value_enum, help = "Log verbosity level (default: info)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<CliLogLevel>,

    /// Log output format
    #[arg(long, value_enum, help = "Log output format (default: plaintext)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_format: Option<LogFormat>,
}

impl CliLoggingArgs {
    /// Initialize stderr logging from the parsed arguments, falling back to
    /// `default_level` when no `--log-level` was given.
    pub fn init(self, component: &str, default_level: CliLogLevel) -> anyhow::Result<()> {
        let level = self.log_level.unwrap_or(default_level).into();
        init_stderr(component, level, self.log_format.unwrap_or_default())
    }
}

/// Builds the default `EnvFilter` directive for a component.
///
/// Component names use dashes while tracing targets use module paths, so the
/// component target is normalized to underscores.
pub fn filter_directive(component: &str, level: Level) -> String {
    format!("{},{}={}", level, component.replace('-', "_"), level)
}

/// Initialize logging to stderr with the given component, default level and format
pub fn init_stderr(component: &str, default_level: Level, format: LogFormat) -> anyhow::Result<()> {
    init_with_writer(component, default_level, format, io::stderr)
}

/// Initialize logging with a custom writer
pub fn init_with_writer<W>(
    component: &str,
    default_level: Level,
    format: LogFormat,
    writer: W,
) -> anyhow::Result<()>
where
    W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(component, default_level)));

    match format {
        LogFormat::Json => {
            let layer = tracing_subscriber::fmt::layer().with_writer(writer).json();
            #[cfg(debug_assertions)]
            let layer = layer.with_file(true).with_line_number(true);

            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
        LogFormat::Plaintext => {
            let layer = tracing_subscriber::fmt::layer().with_writer(writer);
            #[cfg(debug_assertions)]
            let layer = layer.with_file(true).with_line_number(true);

            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
    }

    Ok(())
}

/// Initialize quiet logging for fixture binaries.
///
/// Fixtures take no arguments, so the level defaults to `warn` and only
/// `RUST_LOG` can raise it. Below `warn` no event is formatted, which keeps
/// logging from allocating once the heap is exhausted. Repeated calls and
/// an already installed subscriber are ignored.
pub fn init_fixture(component: &str) {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = init_stderr(component, Level::WARN, LogFormat::Plaintext);
    });
}
