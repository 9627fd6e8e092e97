use config::shared::{LogFormat, TelemetryConfig};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer};

/// Guard that flushes buffered log lines when dropped.
///
/// Hold it in `main` for as long as the process logs.
pub type LogFlusher = WorkerGuard;

/// Errors returned while installing the tracing subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("invalid log filter `{directive}`: {source}")]
    InvalidFilter {
        directive: String,
        #[source]
        source: ParseError,
    },
    #[error("failed to install the global tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Parses a filter directive such as `info` or `biztime=debug,postgres=info`.
pub fn parse_filter(directive: &str) -> Result<EnvFilter, TracingError> {
    EnvFilter::try_new(directive).map_err(|source| TracingError::InvalidFilter {
        directive: directive.to_string(),
        source,
    })
}

/// Builds the log filter. `RUST_LOG` takes precedence over the configured level.
pub fn build_env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TracingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => parse_filter(&config.log_level),
    }
}

/// Installs the global tracing subscriber and returns the [`LogFlusher`].
///
/// Logs are written to stdout through a non-blocking writer, formatted according to
/// [`TelemetryConfig::format`]. Also routes `log` records into tracing.
pub fn init_tracing(app_name: &str, config: &TelemetryConfig) -> Result<LogFlusher, TracingError> {
    let filter = build_env_filter(config)?;
    let (writer, log_flusher) = tracing_appender::non_blocking(std::io::stdout());

    let fmt_layer = match config.format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()?;

    ::tracing::info!(app = app_name, format = ?config.format, "tracing initialized");

    Ok(log_flusher)
}
