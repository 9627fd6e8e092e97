use std::fmt;
use std::io::BufReader;
use std::num::NonZeroI32;
use std::ops::Deref;
use std::sync::Arc;

use config::shared::{IntoConnectOptions, PgConnectionConfig, PgConnectionOptions};
use rustls::ClientConfig;
use tokio_postgres::tls::MakeTlsConnect;
use tokio_postgres::{Client, Config, Connection, NoTls, Socket};
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{Instrument, error, info};

use crate::error::PgConnectError;
use crate::version::extract_server_version;

/// Spawns a background task that drives a Postgres connection until it terminates.
fn spawn_postgres_connection<T>(connection: Connection<Socket, T::Stream>)
where
    T: MakeTlsConnect<Socket>,
    T::Stream: Send + 'static,
{
    let span = tracing::Span::current();
    let task = async move {
        let result = connection.await;

        match result {
            Err(err) => error!("an error occurred during the postgres connection: {}", err),
            Ok(()) => info!("postgres connection terminated successfully"),
        }
    }
    .instrument(span);

    // The `JoinHandle` is not tracked: dropping the last `Client` terminates the connection,
    // which ends the task.
    tokio::spawn(task);
}

/// Handle to an open Postgres session.
///
/// Clones share the same underlying [`Client`]. The handle dereferences to the raw
/// [`Client`], so every query method of `tokio_postgres` is available on it unchanged.
#[derive(Clone)]
pub struct PgClient {
    client: Arc<Client>,
    server_version: Option<NonZeroI32>,
}

impl PgClient {
    /// Returns the shared [`Client`].
    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    /// Returns the server version in `server_version_num` layout, if the server reported one.
    pub fn server_version(&self) -> Option<NonZeroI32> {
        self.server_version
    }

    /// Returns `true` if both handles share the same underlying session.
    pub fn ptr_eq(this: &PgClient, other: &PgClient) -> bool {
        Arc::ptr_eq(&this.client, &other.client)
    }
}

impl Deref for PgClient {
    type Target = Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

impl fmt::Debug for PgClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgClient")
            .field("server_version", &self.server_version)
            .field("closed", &self.client.is_closed())
            .finish_non_exhaustive()
    }
}

/// Establishes a connection to Postgres. The connection uses TLS if enabled in the supplied
/// [`PgConnectionConfig`].
///
/// The future resolves once the startup handshake has completed, so the returned client is
/// ready for queries. There is no timeout and no retry.
pub async fn connect(
    pg_connection_config: &PgConnectionConfig,
    options: Option<&PgConnectionOptions>,
) -> Result<PgClient, PgConnectError> {
    match pg_connection_config.tls.enabled {
        true => connect_tls(pg_connection_config, options).await,
        false => connect_no_tls(pg_connection_config, options).await,
    }
}

/// Establishes a connection to Postgres without TLS encryption.
async fn connect_no_tls(
    pg_connection_config: &PgConnectionConfig,
    options: Option<&PgConnectionOptions>,
) -> Result<PgClient, PgConnectError> {
    let config: Config = pg_connection_config.with_db(options);

    let (client, connection) = config.connect(NoTls).await?;

    let server_version = connection
        .parameter("server_version")
        .and_then(extract_server_version);

    spawn_postgres_connection::<NoTls>(connection);

    info!(
        host = %pg_connection_config.host,
        port = pg_connection_config.port,
        database = %pg_connection_config.name,
        server_version = server_version.map(NonZeroI32::get),
        "successfully connected to postgres without tls"
    );

    Ok(PgClient {
        client: Arc::new(client),
        server_version,
    })
}

/// Establishes a TLS-encrypted connection to Postgres, trusting only the configured root
/// certificates.
async fn connect_tls(
    pg_connection_config: &PgConnectionConfig,
    options: Option<&PgConnectionOptions>,
) -> Result<PgClient, PgConnectError> {
    let config: Config = pg_connection_config.with_db(options);

    let mut root_store = rustls::RootCertStore::empty();
    let mut root_certs_reader =
        BufReader::new(pg_connection_config.tls.trusted_root_certs.as_bytes());
    for cert in rustls_pemfile::certs(&mut root_certs_reader) {
        let cert = cert.map_err(PgConnectError::TlsCertificates)?;
        root_store.add(cert).map_err(PgConnectError::Tls)?;
    }

    if root_store.is_empty() {
        return Err(PgConnectError::NoTrustedRootCerts);
    }

    let tls_config =
        ClientConfig::builder_with_provider(Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
            .with_safe_default_protocol_versions()
            .map_err(PgConnectError::Tls)?
            .with_root_certificates(root_store)
            .with_no_client_auth();

    let (client, connection) = config.connect(MakeRustlsConnect::new(tls_config)).await?;

    let server_version = connection
        .parameter("server_version")
        .and_then(extract_server_version);

    spawn_postgres_connection::<MakeRustlsConnect>(connection);

    info!(
        host = %pg_connection_config.host,
        port = pg_connection_config.port,
        database = %pg_connection_config.name,
        server_version = server_version.map(NonZeroI32::get),
        "successfully connected to postgres with tls"
    );

    Ok(PgClient {
        client: Arc::new(client),
        server_version,
    })
}
