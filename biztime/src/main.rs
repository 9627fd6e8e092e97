//! BizTime database bootstrap binary.
//!
//! Loads settings, initializes tracing and opens the BizTime database connection once. A failed
//! connection is logged and the process exits with a failure status.

use std::process::ExitCode;

use biztime::db;
use biztime::error::BiztimeResult;
use biztime::settings::load_biztime_config;
use config::shared::BiztimeConfig;
use telemetry::tracing::init_tracing;
use tracing::{error, info};

fn main() -> BiztimeResult<ExitCode> {
    let biztime_config = load_biztime_config()?;

    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"), &biztime_config.telemetry)?;

    let exit_code = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(biztime_config));

    Ok(exit_code)
}

/// Opens the connection, reporting a failure through the log only.
async fn async_main(biztime_config: BiztimeConfig) -> ExitCode {
    let client = match db::initialize(&biztime_config.database).await {
        Ok(client) => client,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        server_version = client.server_version().map(|version| version.get()),
        "biztime database connection ready"
    );

    ExitCode::SUCCESS
}
