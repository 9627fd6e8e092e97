use std::{
    io,
    path::{Path, PathBuf},
};

use rust_cli_config::builder::{ConfigBuilder, DefaultState};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Directory containing configuration files relative to the working directory.
const CONFIGURATION_DIR: &str = "configuration";

/// Stem of the configuration file.
const BASE_FILE_STEM: &str = "base";

/// Supported extensions for the configuration file.
const CONFIG_FILE_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Prefix for environment variable configuration overrides.
const ENV_PREFIX: &str = "APP";

/// Separator between environment variable prefix and key segments.
const ENV_PREFIX_SEPARATOR: &str = "_";

/// Separator for nested configuration keys in environment variables.
const ENV_SEPARATOR: &str = "__";

/// Errors that can occur while loading configuration files and overrides.
#[derive(Debug, Error)]
pub enum LoadConfigError {
    /// Failed to determine the current working directory.
    #[error("failed to determine the current directory: {0}")]
    CurrentDir(#[source] io::Error),

    /// The `configuration` directory does not exist.
    #[error("configuration directory `{0}` does not exist")]
    MissingConfigurationDirectory(PathBuf),

    /// Could not locate the configuration file.
    #[error("could not locate the base configuration in `{directory}`; attempted: {attempted}")]
    ConfigurationFileMissing {
        directory: PathBuf,
        attempted: String,
    },

    /// The configuration file existed but could not be parsed.
    #[error("failed to load the base configuration from `{path}`: {source}")]
    ConfigurationFileLoad {
        path: PathBuf,
        source: rust_cli_config::ConfigError,
    },

    /// Environment variable overrides failed to merge into the configuration.
    #[error("failed to load configuration from environment variables: {0}")]
    EnvironmentVariables(#[source] rust_cli_config::ConfigError),

    /// The configuration was parsed but deserialization failed.
    #[error("failed to deserialize configuration: {0}")]
    Deserialization(#[source] rust_cli_config::ConfigError),
}

/// Loads configuration from `configuration/base.(yaml|yml|json)` in the working directory.
///
/// See [`load_config_from`] for the override rules.
pub fn load_config<T>() -> Result<T, LoadConfigError>
where
    T: DeserializeOwned,
{
    let base_path = std::env::current_dir().map_err(LoadConfigError::CurrentDir)?;

    load_config_from(&base_path.join(CONFIGURATION_DIR))
}

/// Loads configuration from the base file in `directory` and applies overrides from
/// `APP_`-prefixed environment variables.
///
/// Nested keys use double underscores (`APP_TELEMETRY__FORMAT`).
pub fn load_config_from<T>(directory: &Path) -> Result<T, LoadConfigError>
where
    T: DeserializeOwned,
{
    load_config_with_env(directory, None)
}

/// Loads the configuration, reading overrides from `env_vars` instead of the process
/// environment when it is given.
fn load_config_with_env<T>(
    directory: &Path,
    env_vars: Option<rust_cli_config::Map<String, String>>,
) -> Result<T, LoadConfigError>
where
    T: DeserializeOwned,
{
    if !directory.is_dir() {
        return Err(LoadConfigError::MissingConfigurationDirectory(
            directory.to_path_buf(),
        ));
    }

    let base_file = find_configuration_file(directory)?;

    let environment_source = rust_cli_config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .source(env_vars);

    let builder =
        rust_cli_config::Config::builder().add_source(rust_cli_config::File::from(base_file.clone()));
    validate_configuration_source(&builder, &base_file)?;

    let settings = builder
        .add_source(environment_source)
        .build()
        .map_err(LoadConfigError::EnvironmentVariables)?;

    settings
        .try_deserialize::<T>()
        .map_err(LoadConfigError::Deserialization)
}

/// Finds the base configuration file with one of the supported extensions.
fn find_configuration_file(directory: &Path) -> Result<PathBuf, LoadConfigError> {
    let mut attempted_paths = Vec::with_capacity(CONFIG_FILE_EXTENSIONS.len());

    for extension in CONFIG_FILE_EXTENSIONS {
        let path = directory.join(format!("{BASE_FILE_STEM}.{extension}"));
        attempted_paths.push(path.clone());

        if path.is_file() {
            return Ok(path);
        }
    }

    let attempted = attempted_paths
        .iter()
        .map(|path| format!("`{}`", path.display()))
        .collect::<Vec<_>>()
        .join(", ");

    Err(LoadConfigError::ConfigurationFileMissing {
        directory: directory.to_path_buf(),
        attempted,
    })
}

fn validate_configuration_source(
    builder: &ConfigBuilder<DefaultState>,
    path: &Path,
) -> Result<(), LoadConfigError> {
    builder
        .clone()
        .build()
        .map_err(|source| LoadConfigError::ConfigurationFileLoad {
            path: path.to_path_buf(),
            source,
        })
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::shared::{BiztimeConfig, LogFormat};

    fn write_base(dir: &Path, file_name: &str, contents: &str) {
        fs::write(dir.join(file_name), contents).unwrap();
    }

    #[test]
    fn test_load_yaml_configuration() {
        let dir = tempfile::tempdir().unwrap();
        write_base(
            dir.path(),
            "base.yaml",
            "database:\n  tls:\n    enabled: false\n    trusted_root_certs: \"\"\n  keepalive:\n    idle_secs: 10\n    interval_secs: 5\n    retries: 2\ntelemetry:\n  log_level: debug\n  format: json\n",
        );

        let config: BiztimeConfig = load_config_with_env(dir.path(), Some(Default::default())).unwrap();

        assert!(!config.database.tls.enabled);
        let keepalive = config.database.keepalive.unwrap();
        assert_eq!(keepalive.idle_secs, 10);
        assert_eq!(keepalive.interval_secs, 5);
        assert_eq!(keepalive.retries, 2);
        assert_eq!(config.telemetry.log_level, "debug");
        assert_eq!(config.telemetry.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write_base(dir.path(), "base.json", "{}");

        let config: BiztimeConfig = load_config_with_env(dir.path(), Some(Default::default())).unwrap();

        assert!(!config.database.tls.enabled);
        assert!(config.database.keepalive.is_none());
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.format, LogFormat::Pretty);
    }

    #[test]
    fn test_environment_variables_override_file() {
        let dir = tempfile::tempdir().unwrap();
        write_base(dir.path(), "base.yml", "telemetry:\n  format: pretty\n");

        let mut env_vars = rust_cli_config::Map::new();
        env_vars.insert("APP_TELEMETRY__FORMAT".to_string(), "json".to_string());
        env_vars.insert("APP_TELEMETRY__LOG_LEVEL".to_string(), "warn".to_string());

        let config: BiztimeConfig = load_config_with_env(dir.path(), Some(env_vars)).unwrap();

        assert_eq!(config.telemetry.format, LogFormat::Json);
        assert_eq!(config.telemetry.log_level, "warn");
    }

    #[test]
    fn test_missing_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let result = load_config_from::<BiztimeConfig>(&missing);

        assert!(matches!(
            result,
            Err(LoadConfigError::MissingConfigurationDirectory(path)) if path == missing
        ));
    }

    #[test]
    fn test_missing_file_lists_attempted_paths() {
        let dir = tempfile::tempdir().unwrap();

        let err = load_config_from::<BiztimeConfig>(dir.path()).unwrap_err();

        match err {
            LoadConfigError::ConfigurationFileMissing { attempted, .. } => {
                assert!(attempted.contains("base.yaml"));
                assert!(attempted.contains("base.yml"));
                assert!(attempted.contains("base.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        write_base(dir.path(), "base.yaml", "telemetry: [unclosed\n");

        let result = load_config_with_env::<BiztimeConfig>(dir.path(), Some(Default::default()));

        assert!(matches!(
            result,
            Err(LoadConfigError::ConfigurationFileLoad { .. })
        ));
    }

    #[test]
    fn test_unknown_log_format_fails_deserialization() {
        let dir = tempfile::tempdir().unwrap();
        write_base(dir.path(), "base.yaml", "telemetry:\n  format: xml\n");

        let result = load_config_with_env::<BiztimeConfig>(dir.path(), Some(Default::default()));

        assert!(matches!(result, Err(LoadConfigError::Deserialization(_))));
    }
}
