use config::LoadConfigError;
use config::shared::ValidationError;
use postgres::PgConnectError;
use telemetry::tracing::TracingError;
use thiserror::Error;

/// Result type for BizTime startup.
pub type BiztimeResult<T> = Result<T, BiztimeError>;

/// Errors that can stop BizTime from starting.
#[derive(Debug, Error)]
pub enum BiztimeError {
    #[error("failed to load configuration: {0}")]
    LoadConfig(#[from] LoadConfigError),
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),
    #[error("failed to initialize tracing: {0}")]
    Tracing(#[from] TracingError),
    #[error("failed to open the biztime database connection: {0}")]
    Connect(#[from] PgConnectError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
