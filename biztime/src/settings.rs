use std::path::Path;

use config::shared::BiztimeConfig;
use config::{load_config, load_config_from};

use crate::error::BiztimeResult;

/// Loads and validates the settings from `configuration/` in the working directory.
pub fn load_biztime_config() -> BiztimeResult<BiztimeConfig> {
    let config = load_config::<BiztimeConfig>()?;
    config.validate()?;

    Ok(config)
}

/// Loads and validates the settings from `directory`.
pub fn load_biztime_config_from(directory: &Path) -> BiztimeResult<BiztimeConfig> {
    let config = load_config_from::<BiztimeConfig>(directory)?;
    config.validate()?;

    Ok(config)
}
