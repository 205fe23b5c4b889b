//! Subscriber setup for hosts.
//!
//! The engine itself only emits `trace` and `debug` events (dispatch steps,
//! bindings, graph sealing, converter matches). Hosts that want to see them
//! install a subscriber once at startup:
//!
//! ```ignore
//! use cmdgraph::tracing_support::{init_subscriber_with_config, TracingConfig, TracingFormat};
//!
//! init_subscriber_with_config(TracingConfig {
//!     filter: Some("cmdgraph=debug".into()),
//!     format: TracingFormat::Json,
//!     ..Default::default()
//! })?;
//! ```
//!
//! Without an explicit filter `RUST_LOG` is used, falling back to `warn`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::Subscriber;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "warn";

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Multi-line, human readable.
    Pretty,
    /// One line per event.
    #[default]
    Compact,
    Json,
}

impl fmt::Display for TracingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TracingFormat::Pretty => "pretty",
            TracingFormat::Compact => "compact",
            TracingFormat::Json => "json",
        })
    }
}

impl FromStr for TracingFormat {
    type Err = TracingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(TracingFormat::Pretty),
            "compact" => Ok(TracingFormat::Compact),
            "json" => Ok(TracingFormat::Json),
            _ => Err(TracingError::UnknownFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// `EnvFilter` directives, e.g. `cmdgraph=trace`. `None` reads `RUST_LOG`.
    pub filter: Option<String>,
    pub format: TracingFormat,
    pub timestamps: bool,
    /// Include the module path of each event.
    pub target: bool,
    pub thread_ids: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            format: TracingFormat::default(),
            timestamps: true,
            target: true,
            thread_ids: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum TracingError {
    #[error("Unknown log format '{0}' (expected pretty, compact or json)")]
    UnknownFormat(String),

    #[error("Invalid log filter: {0}")]
    InvalidFilter(#[from] ParseError),

    #[error("A global subscriber is already installed: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Install a compact subscriber writing to stderr, filtered by `RUST_LOG`.
pub fn init_subscriber() -> Result<(), TracingError> {
    init_subscriber_with_config(TracingConfig::default())
}

pub fn init_subscriber_with_config(config: TracingConfig) -> Result<(), TracingError> {
    let filter = build_filter(config.filter.as_deref())?;
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer(&config))
        .try_init()?;
    Ok(())
}

fn build_filter(directives: Option<&str>) -> Result<EnvFilter, ParseError> {
    match directives {
        Some(directives) => EnvFilter::try_new(directives),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

fn fmt_layer<S>(config: &TracingConfig) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.target)
        .with_thread_ids(config.thread_ids);

    match (config.format, config.timestamps) {
        (TracingFormat::Pretty, true) => layer.pretty().boxed(),
        (TracingFormat::Pretty, false) => layer.pretty().without_time().boxed(),
        (TracingFormat::Compact, true) => layer.compact().boxed(),
        (TracingFormat::Compact, false) => layer.compact().without_time().boxed(),
        (TracingFormat::Json, true) => layer.json().boxed(),
        (TracingFormat::Json, false) => layer.json().without_time().boxed(),
    }
}
