use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The connection string could not be parsed.
    #[error("invalid connection string: {0}")]
    InvalidConnectionString(#[source] tokio_postgres::Error),
    /// More than one host was given, which a single connection cannot use.
    #[error("connection string lists {0} hosts, only a single host is supported")]
    MultipleHosts(usize),
    /// The password embedded in the connection string is not valid UTF-8.
    #[error("the password in the connection string is not valid UTF-8")]
    NonUtf8Password,
    /// TLS is enabled but no trusted root certificates are provided.
    #[error("Invalid TLS config: `trusted_root_certs` must be set when `enabled` is true")]
    MissingTrustedRootCerts,
    /// Invalid keepalive configuration.
    #[error("Invalid keepalive config: {0}")]
    KeepaliveConfig(String),
}
