use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - OpenSCAD timeout is not 0
/// - OpenSCAD binary path is not empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.openscad.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "openscad.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.openscad.binary.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "openscad.binary cannot be empty".to_string(),
        ));
    }

    Ok(())
}
