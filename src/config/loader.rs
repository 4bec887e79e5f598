//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable {var} has invalid value '{value}'")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load the optional TOML file, apply process environment overrides, then
/// validate.
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    load_with(path, |var| std::env::var(var).ok())
}

fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply environment overrides using `lookup` to resolve variables.
///
/// Empty values are treated as unset.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

    if let Some(address) = get("BIND_ADDRESS") {
        config.listener.bind_address = address;
    }
    if let Some(port) = get("PORT") {
        let port: u16 = port.trim().parse().map_err(|_| ConfigError::Env {
            var: "PORT",
            value: port.clone(),
        })?;
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{host}:{port}");
    }

    if let Some(environment) = get("APP_ENV").or_else(|| get("NODE_ENV")) {
        config.environment = environment;
    }

    if let Some(limit) = get("RATE_LIMIT") {
        config.rate_limit.max_requests = limit.trim().parse().map_err(|_| ConfigError::Env {
            var: "RATE_LIMIT",
            value: limit.clone(),
        })?;
    }

    if let Some(origins) = get("FRONTEND_URL") {
        config.cors.allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(|origin| origin.trim_end_matches('/').to_string())
            .collect();
    }

    let sheets = &mut config.sheets;
    if let Some(id) = get("GOOGLE_SHEET_ID") {
        sheets.spreadsheet_id = Some(id);
    }
    if let Some(name) = get("GOOGLE_SHEET_NAME") {
        sheets.sheet_name = name;
    }
    if let Some(project) = get("GOOGLE_PROJECT_ID") {
        sheets.project_id = Some(project);
    }
    if let Some(email) = get("GOOGLE_SERVICE_ACCOUNT_EMAIL") {
        sheets.service_account_email = Some(email);
    }
    if let Some(key) = get("GOOGLE_PRIVATE_KEY") {
        sheets.private_key = Some(key);
    }
    if let Some(token) = get("GOOGLE_ACCESS_TOKEN") {
        sheets.access_token = Some(token);
    }

    if let Some(level) = get("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(address) = get("METRICS_ADDRESS") {
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = address;
    }

    Ok(())
}
