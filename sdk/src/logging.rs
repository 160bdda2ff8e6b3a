//! # Structured Logging
//!
//! The SDK itself only emits `tracing` events; it never installs a
//! subscriber behind the application's back. Applications that have no
//! subscriber of their own can call [`init_logging`] once at startup.
//!
//! Output goes to stderr. `RUST_LOG` overrides the default level, e.g.
//! `RUST_LOG=ledger_sdk=debug` to see every attempt the execution engine
//! makes.

use std::str::FromStr;

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output for local development.
    #[default]
    Pretty,
    /// JSON lines for log aggregation.
    Json,
}

impl LogFormat {
    /// Parses "json" or "pretty", case-insensitively. Anything else is
    /// `Pretty`.
    pub fn from_str_lossy(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl FromStr for LogFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => Err(crate::Error::Parse {
                kind: "log format",
                input: s.to_string(),
            }),
        }
    }
}

/// Installs a global `tracing` subscriber.
///
/// `default_level` applies when `RUST_LOG` is unset; typical values are
/// `"info"` or `"ledger_sdk=debug"`. Fails if a global subscriber is
/// already installed.
pub fn init_logging(default_level: &str, format: LogFormat) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr).with_target(true))
            .try_init()?,
    }

    tracing::debug!(?format, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formats_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::from_str_lossy("xml"), LogFormat::Pretty);
    }

    #[test]
    fn second_init_is_an_error_not_a_panic() {
        let _ = init_logging("warn", LogFormat::Pretty);
        assert!(init_logging("warn", LogFormat::Json).is_err());
    }
}
