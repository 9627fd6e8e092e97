//! Connection initializer for the BizTime database.
//!
//! The connection target is always [`BIZTIME_DATABASE_URL`]. Settings only affect the
//! transport (TLS and TCP keepalives), never which server or database is used.

use config::shared::{
    BIZTIME_CONNECTION_OPTIONS, BIZTIME_DATABASE_URL, DatabaseConfig, PgConnectionConfig,
    ValidationError,
};
use postgres::PgClient;
use tracing::info;

use crate::error::BiztimeResult;

/// Builds the connection config for the BizTime database from [`BIZTIME_DATABASE_URL`] and the
/// transport settings in `database_config`.
pub fn connection_config(
    database_config: &DatabaseConfig,
) -> Result<PgConnectionConfig, ValidationError> {
    let pg_connection_config = PgConnectionConfig {
        tls: database_config.tls.clone(),
        keepalive: database_config.keepalive.clone(),
        ..PgConnectionConfig::from_url(BIZTIME_DATABASE_URL)?
    };
    pg_connection_config.validate()?;

    Ok(pg_connection_config)
}

/// Opens the BizTime database connection.
///
/// Call this once during startup and share clones of the returned [`PgClient`]. The call waits
/// for the handshake to finish and does not retry; any failure is returned to the caller.
pub async fn initialize(database_config: &DatabaseConfig) -> BiztimeResult<PgClient> {
    let pg_connection_config = connection_config(database_config)?;

    initialize_with(&pg_connection_config).await
}

/// Opens a connection with an explicit config, using the BizTime session options.
pub async fn initialize_with(pg_connection_config: &PgConnectionConfig) -> BiztimeResult<PgClient> {
    info!(
        host = %pg_connection_config.host,
        port = pg_connection_config.port,
        database = %pg_connection_config.name,
        username = %pg_connection_config.username,
        tls = pg_connection_config.tls.enabled,
        "connecting to the biztime database"
    );

    let client = postgres::connect(pg_connection_config, Some(&BIZTIME_CONNECTION_OPTIONS)).await?;

    Ok(client)
}
