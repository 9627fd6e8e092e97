use std::error::Error as _;
use std::fmt;
use std::io;

use thiserror::Error;
use tokio_postgres::error::SqlState;

const AUTHENTICATION_ERROR_PREFIX: &str = "authentication error";
const PASSWORD_MISSING: &str = "password missing";

/// Category of a failed connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectErrorKind {
    /// The server could not be reached: unknown host, refused connection, broken socket.
    Unreachable,
    /// The server rejected the credentials.
    Authentication,
    /// The requested database does not exist.
    DatabaseMissing,
    /// The server was reached but is not accepting connections right now.
    ServerUnavailable,
    /// Any other failure. The wrapped driver error carries the details.
    Unknown,
}

impl ConnectErrorKind {
    /// Maps a SQLSTATE code reported during the handshake to a [`ConnectErrorKind`].
    pub fn from_sqlstate(sqlstate: &SqlState) -> Self {
        match *sqlstate {
            // Authentication errors (28xxx)
            SqlState::INVALID_AUTHORIZATION_SPECIFICATION | SqlState::INVALID_PASSWORD => {
                ConnectErrorKind::Authentication
            }

            // Unknown database (3D000)
            SqlState::INVALID_CATALOG_NAME => ConnectErrorKind::DatabaseMissing,

            // Connection errors (08xxx), resource limits and startup/shutdown (53xxx, 57Pxx)
            SqlState::CONNECTION_EXCEPTION
            | SqlState::CONNECTION_DOES_NOT_EXIST
            | SqlState::CONNECTION_FAILURE
            | SqlState::SQLCLIENT_UNABLE_TO_ESTABLISH_SQLCONNECTION
            | SqlState::SQLSERVER_REJECTED_ESTABLISHMENT_OF_SQLCONNECTION
            | SqlState::TOO_MANY_CONNECTIONS
            | SqlState::CANNOT_CONNECT_NOW
            | SqlState::ADMIN_SHUTDOWN
            | SqlState::CRASH_SHUTDOWN => ConnectErrorKind::ServerUnavailable,

            _ => ConnectErrorKind::Unknown,
        }
    }

    /// Classifies a [`tokio_postgres::Error`] returned while connecting.
    pub fn classify(err: &tokio_postgres::Error) -> Self {
        if let Some(sqlstate) = err.code() {
            return ConnectErrorKind::from_sqlstate(sqlstate);
        }

        match err.source() {
            Some(source) if source.is::<io::Error>() => ConnectErrorKind::Unreachable,
            _ => ConnectErrorKind::from_driver_message(&err.to_string()),
        }
    }

    /// Maps the message of a driver error that carries no SQLSTATE to a [`ConnectErrorKind`].
    ///
    /// tokio-postgres raises client side authentication failures, such as a password requested
    /// by the server but absent from the config, as plain errors without a code.
    pub fn from_driver_message(message: &str) -> Self {
        if message.starts_with(AUTHENTICATION_ERROR_PREFIX) || message.contains(PASSWORD_MISSING) {
            return ConnectErrorKind::Authentication;
        }

        ConnectErrorKind::Unknown
    }
}

impl fmt::Display for ConnectErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            ConnectErrorKind::Unreachable => "server unreachable",
            ConnectErrorKind::Authentication => "authentication failed",
            ConnectErrorKind::DatabaseMissing => "database does not exist",
            ConnectErrorKind::ServerUnavailable => "server unavailable",
            ConnectErrorKind::Unknown => "unknown failure",
        };

        f.write_str(description)
    }
}

/// Errors returned by [`connect`](crate::connect).
#[derive(Debug, Error)]
pub enum PgConnectError {
    /// The connection could not be established.
    #[error("failed to connect to postgres ({kind}): {source}")]
    Connect {
        kind: ConnectErrorKind,
        #[source]
        source: tokio_postgres::Error,
    },
    /// The trusted root certificates are not valid PEM.
    #[error("failed to read trusted root certificates: {0}")]
    TlsCertificates(#[source] io::Error),
    /// The trusted root certificates contained no certificate.
    #[error("tls is enabled but no trusted root certificate was found")]
    NoTrustedRootCerts,
    /// rustls rejected a certificate or the protocol configuration.
    #[error("failed to configure tls: {0}")]
    Tls(#[source] rustls::Error),
}

impl PgConnectError {
    /// Returns the [`ConnectErrorKind`] if the failure happened while connecting.
    pub fn kind(&self) -> Option<ConnectErrorKind> {
        match self {
            PgConnectError::Connect { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<tokio_postgres::Error> for PgConnectError {
    fn from(err: tokio_postgres::Error) -> Self {
        PgConnectError::Connect {
            kind: ConnectErrorKind::classify(&err),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_sqlstates() {
        assert_eq!(
            ConnectErrorKind::from_sqlstate(&SqlState::INVALID_PASSWORD),
            ConnectErrorKind::Authentication
        );
        assert_eq!(
            ConnectErrorKind::from_sqlstate(&SqlState::INVALID_AUTHORIZATION_SPECIFICATION),
            ConnectErrorKind::Authentication
        );
    }

    #[test]
    fn test_missing_database_sqlstate() {
        assert_eq!(
            ConnectErrorKind::from_sqlstate(&SqlState::from_code("3D000")),
            ConnectErrorKind::DatabaseMissing
        );
    }

    #[test]
    fn test_unavailable_sqlstates() {
        for sqlstate in [
            SqlState::CANNOT_CONNECT_NOW,
            SqlState::TOO_MANY_CONNECTIONS,
            SqlState::ADMIN_SHUTDOWN,
            SqlState::CONNECTION_FAILURE,
        ] {
            assert_eq!(
                ConnectErrorKind::from_sqlstate(&sqlstate),
                ConnectErrorKind::ServerUnavailable
            );
        }
    }

    #[test]
    fn test_unrelated_sqlstate_is_unknown() {
        assert_eq!(
            ConnectErrorKind::from_sqlstate(&SqlState::UNIQUE_VIOLATION),
            ConnectErrorKind::Unknown
        );
    }

    #[test]
    fn test_client_side_authentication_failures() {
        assert_eq!(
            ConnectErrorKind::from_driver_message("invalid configuration: password missing"),
            ConnectErrorKind::Authentication
        );
        assert_eq!(
            ConnectErrorKind::from_driver_message(
                "authentication error: unsupported authentication method"
            ),
            ConnectErrorKind::Authentication
        );
        assert_eq!(
            ConnectErrorKind::from_driver_message("unexpected message from server"),
            ConnectErrorKind::Unknown
        );
    }

    #[test]
    fn test_config_errors_without_password_context_are_unknown() {
        let err = "port=notaport"
            .parse::<tokio_postgres::Config>()
            .unwrap_err();

        assert_eq!(ConnectErrorKind::classify(&err), ConnectErrorKind::Unknown);
    }

    #[test]
    fn test_kind_is_only_set_for_connect_errors() {
        assert_eq!(PgConnectError::NoTrustedRootCerts.kind(), None);
    }
}
