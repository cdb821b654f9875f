use std::{fs, path::Path};
use crate::config::proc_initiateor::initiate_default_values;
use crate::config::sources::AppConfig;
use crate::observability::metrics::get_metrics;
use anyhow::{anyhow, Result};
use regex::Regex;
use tracing::{debug, error};
use crate::config::proc_validator;

/// Load and validate config from YAML file
pub async fn file_to_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config {}: {}", path.display(), e))?;

    let expanded = expand_env_vars(&content)?;
    parse_config(expanded).await
}

pub async fn parse_config(content: String) -> Result<AppConfig> {
    let metrics = get_metrics().await;
    let mut app_config: AppConfig = serde_yaml::from_str(&content)
        .inspect_err(|e| {
            error!("parse config error: {}", e);
            metrics.config_validation_errors.inc();
        })?;

    app_config = initiate_default_values(app_config);
    debug!("validation config ...");
    proc_validator::validate_app_config(&app_config)
        .map_err(|errors| {
            metrics.config_validation_errors.inc_by(errors.len() as u64);
            anyhow!("config is not valid:\n  - {}", errors.join("\n  - "))
        })?;

    Ok(app_config)
}

/// Replace `${VAR}` and `${VAR:default}` with the environment value.
pub fn expand_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]*))?\}")?;
    Ok(re
        .replace_all(input, |caps: &regex::Captures| {
            let var = &caps[1];
            let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var).unwrap_or_else(|_| default.to_string())
        })
        .to_string())
}
