//! Subscriber setup for the benchmark binary.

use fba_highs::highs_version;
use serde::Serialize;
use std::env;
use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Errors raised while configuring logging.
#[derive(Debug)]
pub enum LoggingError {
    InvalidFilter(String),
    InvalidFormat(String),
    LogFile(io::Error),
    Init(String),
}

impl LoggingError {
    pub fn code(&self) -> &'static str {
        match self {
            LoggingError::InvalidFilter(_) => "LOGGING_INVALID_FILTER",
            LoggingError::InvalidFormat(_) => "LOGGING_INVALID_FORMAT",
            LoggingError::LogFile(_) => "LOGGING_LOG_FILE",
            LoggingError::Init(_) => "LOGGING_INIT",
        }
    }
}

impl std::fmt::Display for LoggingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoggingError::InvalidFilter(err) => {
                write!(f, "[{}] Invalid log filter: {}", self.code(), err)
            }
            LoggingError::InvalidFormat(value) => write!(
                f,
                "[{}] Invalid FBA_LOG_FORMAT '{}' (expected 'json' or 'pretty')",
                self.code(),
                value
            ),
            LoggingError::LogFile(err) => {
                write!(f, "[{}] Failed to open log file: {}", self.code(), err)
            }
            LoggingError::Init(err) => {
                write!(f, "[{}] Failed to initialize logging: {}", self.code(), err)
            }
        }
    }
}

impl std::error::Error for LoggingError {}

/// Output encoding shared by the stderr and file sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_env() -> Result<Self, LoggingError> {
        match env::var("FBA_LOG_FORMAT") {
            Err(_) => Ok(LogFormat::Pretty),
            Ok(value) if value.eq_ignore_ascii_case("pretty") => Ok(LogFormat::Pretty),
            Ok(value) if value.eq_ignore_ascii_case("json") => Ok(LogFormat::Json),
            Ok(value) => Err(LoggingError::InvalidFormat(value)),
        }
    }
}

fn fmt_layer<S, W>(format: LogFormat, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi);
    match format {
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}

fn build_filter(level: Option<&str>) -> Result<EnvFilter, LoggingError> {
    let directive = level
        .map(str::to_string)
        .or_else(|| env::var("FBA_TRACE").ok())
        .unwrap_or_else(|| "off".to_string());
    if directive.eq_ignore_ascii_case("off") {
        return Ok(EnvFilter::default().add_directive(LevelFilter::OFF.into()));
    }
    EnvFilter::try_new(&directive).map_err(|err| LoggingError::InvalidFilter(err.to_string()))
}

/// Install the global subscriber.
///
/// `level` overrides `FBA_TRACE`; with neither set logging stays off.
/// `FBA_LOG_FORMAT` picks `pretty` (default) or `json` on stderr, and
/// `FBA_LOG_FILE` appends the same format to a file. Returns false when a
/// subscriber was already installed.
pub fn init_logging(level: Option<&str>) -> Result<bool, LoggingError> {
    if tracing::dispatcher::has_been_set() {
        return Ok(false);
    }

    let filter = build_filter(level)?;
    let format = LogFormat::from_env()?;
    let file = match env::var("FBA_LOG_FILE") {
        Ok(path) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(LoggingError::LogFile)?,
        ),
        Err(_) => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer(format, io::stderr, true))
        .with(file.map(|file| fmt_layer(format, Mutex::new(file), false)))
        .try_init()
        .map_err(|err| LoggingError::Init(err.to_string()))?;

    Ok(true)
}

/// Solver metadata for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct SolverInfo {
    pub backend: &'static str,
    pub version: Option<String>,
}

/// Describe every compiled-in backend.
pub fn solver_info() -> Vec<SolverInfo> {
    vec![
        SolverInfo {
            backend: "highs",
            version: highs_version(),
        },
        SolverInfo {
            backend: "microlp",
            version: None,
        },
    ]
}
