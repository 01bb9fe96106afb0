use std::collections::HashSet;

use super::{AppConfig, ConfigError};

/// Validate the full application config, returning an error if any rule is violated.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] when any configuration invariant is violated.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_server_config(config)?;
    validate_upstream(config)?;
    validate_features(config)?;
    validate_log_level(config)?;
    validate_models(config)?;
    validate_prompts(config)?;
    Ok(())
}

fn validation_err(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}

fn validate_server_config(config: &AppConfig) -> Result<(), ConfigError> {
    let server = &config.server;
    if server.timeout == 0 {
        return Err(validation_err("server.timeout must be greater than 0"));
    }
    if server.http_pool_max_idle_per_host == 0 {
        return Err(validation_err(
            "server.http_pool_max_idle_per_host must be greater than 0",
        ));
    }
    if server.max_body_bytes == 0 {
        return Err(validation_err("server.max_body_bytes must be greater than 0"));
    }
    if let Some(worker_threads) = server.runtime_worker_threads {
        if worker_threads == 0 {
            return Err(validation_err(
                "server.runtime_worker_threads must be greater than 0 when set",
            ));
        }
    }
    Ok(())
}

fn validate_upstream(config: &AppConfig) -> Result<(), ConfigError> {
    let upstream = &config.upstream;
    if !upstream.base_url.starts_with("http://") && !upstream.base_url.starts_with("https://") {
        return Err(validation_err(
            "upstream.base_url must start with http:// or https://",
        ));
    }
    if url::Url::parse(&upstream.base_url).is_err() {
        return Err(validation_err(format!(
            "upstream.base_url '{}' is not a valid URL",
            upstream.base_url
        )));
    }
    if upstream.probe_unknown_models && upstream.probe_timeout_secs == 0 {
        return Err(validation_err(
            "upstream.probe_timeout_secs must be greater than 0 when probing is enabled",
        ));
    }
    if let Some(proxy) = upstream.proxy.as_deref() {
        let valid_scheme = ["http://", "https://", "socks5://", "socks5h://"]
            .iter()
            .any(|scheme| proxy.starts_with(scheme));
        if !valid_scheme {
            return Err(validation_err(format!(
                "upstream.proxy '{proxy}' must start with http://, https://, socks5:// or socks5h://"
            )));
        }
    }
    Ok(())
}

fn validate_features(config: &AppConfig) -> Result<(), ConfigError> {
    let features = &config.features;
    if !(0.0..=2.0).contains(&features.default_temperature) {
        return Err(validation_err(
            "features.default_temperature must be between 0 and 2",
        ));
    }
    if features.default_max_tokens == 0 {
        return Err(validation_err(
            "features.default_max_tokens must be greater than 0",
        ));
    }
    Ok(())
}

const VALID_LOG_LEVELS: &[&str] = &[
    "DEBUG", "INFO", "WARNING", "WARN", "ERROR", "CRITICAL", "TRACE", "DISABLED",
];

fn validate_log_level(config: &AppConfig) -> Result<(), ConfigError> {
    let level = config.features.log_level.to_uppercase();
    if !VALID_LOG_LEVELS.contains(&level.as_str()) {
        return Err(validation_err(format!(
            "features.log_level '{}' is not one of: {}",
            config.features.log_level,
            VALID_LOG_LEVELS.join(", ")
        )));
    }
    Ok(())
}

fn validate_models(config: &AppConfig) -> Result<(), ConfigError> {
    let models = &config.models;
    if models.default_model.trim().is_empty() {
        return Err(validation_err("models.default_model cannot be empty"));
    }

    let mut seen = HashSet::new();
    for alias in &models.aliases {
        if alias.name.trim().is_empty() || alias.upstream.trim().is_empty() {
            return Err(validation_err(
                "models.aliases entries need a non-empty name and upstream",
            ));
        }
        if !seen.insert(alias.name.as_str()) {
            return Err(validation_err(format!(
                "models.aliases contains duplicate name '{}'",
                alias.name
            )));
        }
    }

    for (idx, tier) in models.fallback_tiers.iter().enumerate() {
        if tier.model.trim().is_empty() {
            return Err(validation_err(format!(
                "models.fallback_tiers[{idx}].model cannot be empty"
            )));
        }
        if tier.keywords.is_empty() || tier.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(validation_err(format!(
                "models.fallback_tiers[{idx}].keywords must be a non-empty list of non-empty strings"
            )));
        }
    }
    Ok(())
}

fn validate_prompts(config: &AppConfig) -> Result<(), ConfigError> {
    let Some(prompts) = config.prompts.as_deref() else {
        return Ok(());
    };

    let mut seen = HashSet::new();
    for entry in prompts {
        if entry.key.trim().is_empty() {
            return Err(validation_err("prompts entries need a non-empty key"));
        }
        if entry.modifier_text.trim().is_empty() {
            return Err(validation_err(format!(
                "prompt '{}' has an empty modifier_text",
                entry.key
            )));
        }
        if !seen.insert(entry.key.as_str()) {
            return Err(validation_err(format!(
                "prompts contains duplicate key '{}'",
                entry.key
            )));
        }
    }
    Ok(())
}
