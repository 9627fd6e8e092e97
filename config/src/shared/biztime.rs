use serde::{Deserialize, Serialize};

use crate::shared::{TcpKeepaliveConfig, TelemetryConfig, TlsConfig, ValidationError};

/// Transport settings for the BizTime database connection.
///
/// The connection target is not part of the settings, it is always
/// [`BIZTIME_DATABASE_URL`](crate::shared::BIZTIME_DATABASE_URL).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(default)]
    pub keepalive: Option<TcpKeepaliveConfig>,
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.tls.validate()?;

        if let Some(keepalive) = &self.keepalive {
            keepalive.validate()?;
        }

        Ok(())
    }
}

/// Top level settings of the `biztime` binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BiztimeConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl BiztimeConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()
    }
}
