//! Diagnostic logging through `tracing`.
//!
//! Log events are written to stderr, so they never mix with the status line
//! printed on stdout. The filter is read from `RUST_LOG` (default `warn`), and
//! the output format from `MEMGPIO_LOG_FORMAT` (`compact`, `pretty` or `json`,
//! default `compact`).

use std::env;
use std::io;
use std::str::FromStr;

use thiserror::Error;
use tracing::warn;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the [`LogFormat`].
pub const ENV_LOG_FORMAT: &str = "MEMGPIO_LOG_FORMAT";

const DEFAULT_FILTER: &str = "warn";

/// Errors that can occur while installing the log subscriber.
#[derive(Debug, Error)]
pub enum Error {
    /// Unknown value for `MEMGPIO_LOG_FORMAT`.
    #[error("unknown log format {0:?}, expected compact, pretty or json")]
    UnknownFormat(String),
    /// A global subscriber was already installed.
    #[error("failed to install log subscriber")]
    Init(#[from] TryInitError),
}

/// Log output formats.
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub enum LogFormat {
    /// Single-line, human-readable events.
    #[default]
    Compact,
    /// Multi-line, human-readable events including source locations.
    Pretty,
    /// Newline-delimited JSON.
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<LogFormat, Error> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(Error::UnknownFormat(s.to_string())),
        }
    }
}

/// Installs the global log subscriber using the `RUST_LOG` and
/// `MEMGPIO_LOG_FORMAT` environment variables.
///
/// An unknown `MEMGPIO_LOG_FORMAT` falls back to [`LogFormat::Compact`] and is
/// reported as a warning once the subscriber is installed.
pub fn init() -> Result<(), Error> {
    let (format, unknown) = select_format(env::var(ENV_LOG_FORMAT).ok().as_deref());

    init_with_format(format)?;

    if let Some(err) = unknown {
        warn!("{}, using {:?}", err, format);
    }

    Ok(())
}

fn select_format(value: Option<&str>) -> (LogFormat, Option<Error>) {
    match value.map(str::parse::<LogFormat>) {
        Some(Ok(format)) => (format, None),
        Some(Err(err)) => (LogFormat::default(), Some(err)),
        None => (LogFormat::default(), None),
    }
}

/// Installs the global log subscriber with an explicit output format.
///
/// `RUST_LOG` still controls the filter. Invalid filter directives fall back to
/// the default `warn` level.
pub fn init_with_format(format: LogFormat) -> Result<(), Error> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match format {
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(io::stderr)
                .with_filter(filter);
            Registry::default().with(layer).try_init()?;
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_file(true)
                .with_line_number(true)
                .with_writer(io::stderr)
                .with_filter(filter);
            Registry::default().with(layer).try_init()?;
        }
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(io::stderr)
                .with_filter(filter);
            Registry::default().with(layer).try_init()?;
        }
    }

    Ok(())
}
