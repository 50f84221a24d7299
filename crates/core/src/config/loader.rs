use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment variable overrides
const ENV_PREFIX: &str = "SCADSRV_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    with_env(defaults().merge(Toml::file(path)))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from defaults and environment variables only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    with_env(defaults())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn defaults() -> Figment {
    Figment::from(Serialized::defaults(Config::default()))
}

/// Nested keys use a double underscore (`SCADSRV_OPENSCAD__TIMEOUT_SECS`).
/// `SCADSRV_PORT` is kept as a shortcut for `server.port`.
fn with_env(figment: Figment) -> Figment {
    figment
        .merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(&["config", "port"])
                .split("__"),
        )
        .merge(
            Env::prefixed(ENV_PREFIX)
                .only(&["port"])
                .map(|_| "server.port".into()),
        )
}
