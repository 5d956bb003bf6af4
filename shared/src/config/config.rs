use std::fs;
use tracing::{debug, error, info};

use crate::types::client_config::{ClientConfig, ConfigError};

pub fn load_config(path: &str) -> Result<ClientConfig, ConfigError> {
    info!("Loading configuration from: {}", path);

    let contents = fs::read_to_string(path)?;
    debug!("Processing file: {}", path);

    parse_config(&contents)
}

/// Parse and validate configuration text.
pub fn parse_config(contents: &str) -> Result<ClientConfig, ConfigError> {
    if contents.trim().is_empty() {
        error!("Configuration file is empty");
        return Err(ConfigError::InvalidConfig("empty file".into()));
    }

    let config: ClientConfig = toml::from_str(contents)?;

    info!("Configuration loaded successfully");
    debug!("Config: {:?}", config);

    validate_config(&config)?;

    info!("Config validated");

    Ok(config)
}

fn validate_config(config: &ClientConfig) -> Result<(), ConfigError> {
    let base_url = config.api.resolved_base_url();
    if base_url.is_empty() {
        return Err(ConfigError::InvalidConfig("api.base_url cannot be empty".into()));
    }

    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::InvalidConfig(format!(
            "api.base_url must start with http:// or https:// (got {})",
            base_url
        )));
    }

    if config.api.timeout_secs == 0 {
        return Err(ConfigError::InvalidConfig(
            "timeout_secs must be greater than 0".into(),
        ));
    }

    if config.api.presearch_page_size == 0 {
        return Err(ConfigError::InvalidConfig(
            "presearch_page_size must be greater than 0".into(),
        ));
    }

    if let Some(dir) = &config.storage.dir {
        if dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidConfig("storage.dir cannot be empty".into()));
        }
    }

    Ok(())
}
