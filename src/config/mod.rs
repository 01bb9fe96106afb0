pub mod validation;

use serde::{Deserialize, Serialize};

use crate::catalog::PromptEntry;

use self::validation::validate_config;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
pub const CONFIG_PATH_ENV: &str = "NIMGATE_CONFIG";

/// Error type for configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    /// Upstream request timeout in seconds. Long prompts on large models
    /// routinely take minutes.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_http_pool_max_idle_per_host")]
    pub http_pool_max_idle_per_host: usize,
    #[serde(default = "default_http_pool_idle_timeout_secs")]
    pub http_pool_idle_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_worker_threads: Option<usize>,
    #[serde(default)]
    pub base_path: String,
    #[serde(default)]
    pub http_use_env_proxy: bool,
    /// Largest accepted request body. Long chat histories get big.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    3000
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_timeout() -> u64 {
    600
}
fn default_http_pool_max_idle_per_host() -> usize {
    16
}
fn default_http_pool_idle_timeout_secs() -> u64 {
    15
}
fn default_max_body_bytes() -> usize {
    50 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            timeout: default_timeout(),
            http_pool_max_idle_per_host: default_http_pool_max_idle_per_host(),
            http_pool_idle_timeout_secs: default_http_pool_idle_timeout_secs(),
            runtime_worker_threads: None,
            base_path: String::new(),
            http_use_env_proxy: false,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// The single upstream NIM endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub proxy: Option<String>,
    /// Probe unknown model names against the upstream before falling back
    /// to keyword tiers.
    #[serde(default = "default_true")]
    pub probe_unknown_models: bool,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://integrate.api.nvidia.com/v1".to_string()
}
fn default_probe_timeout_secs() -> u64 {
    10
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            proxy: None,
            probe_unknown_models: true,
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

/// Feature flags and request defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    /// Splice `reasoning_content` into `content` between `<think>` markers.
    /// When off, reasoning is dropped from every response.
    #[serde(default)]
    pub show_reasoning: bool,
    /// Ask the upstream to think via `chat_template_kwargs`.
    #[serde(default)]
    pub enable_thinking_mode: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_temperature")]
    pub default_temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u64,
}

fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "INFO".to_string()
}
fn default_temperature() -> f64 {
    0.6
}
fn default_max_tokens() -> u64 {
    9024
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            show_reasoning: false,
            enable_thinking_mode: false,
            log_level: default_log_level(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
        }
    }
}

/// Caller-facing model name mapped to an upstream model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelAlias {
    pub name: String,
    pub upstream: String,
}

/// Keyword tier used when neither the alias table nor the probe resolves a
/// model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FallbackTier {
    pub keywords: Vec<String>,
    pub model: String,
}

/// Model resolution tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_aliases")]
    pub aliases: Vec<ModelAlias>,
    #[serde(default = "default_fallback_tiers")]
    pub fallback_tiers: Vec<FallbackTier>,
    #[serde(default = "default_model")]
    pub default_model: String,
}

fn alias(name: &str, upstream: &str) -> ModelAlias {
    ModelAlias {
        name: name.to_string(),
        upstream: upstream.to_string(),
    }
}

fn default_aliases() -> Vec<ModelAlias> {
    vec![
        alias("gpt-3.5-turbo", "nvidia/llama-3.1-nemotron-ultra-253b-v1"),
        alias("gpt-4", "qwen/qwen3-coder-480b-a35b-instruct"),
        alias("gpt-4-turbo", "moonshotai/kimi-k2-instruct-0905"),
        alias("gpt-4o", "deepseek-ai/deepseek-v3.1"),
        alias("claude-3-opus", "openai/gpt-oss-120b"),
        alias("claude-3-sonnet", "openai/gpt-oss-20b"),
        alias("gemini-pro", "qwen/qwen3-next-80b-a3b-thinking"),
    ]
}

fn tier(keywords: &[&str], model: &str) -> FallbackTier {
    FallbackTier {
        keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        model: model.to_string(),
    }
}

fn default_fallback_tiers() -> Vec<FallbackTier> {
    vec![
        tier(
            &["gpt-4", "claude-opus", "405b"],
            "meta/llama-3.1-405b-instruct",
        ),
        tier(&["claude", "gemini", "70b"], "meta/llama-3.1-70b-instruct"),
    ]
}

fn default_model() -> String {
    "meta/llama-3.1-8b-instruct".to_string()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            aliases: default_aliases(),
            fallback_tiers: default_fallback_tiers(),
            default_model: default_model(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    /// Replaces the built-in prompt catalog when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<Vec<PromptEntry>>,
}

/// Load configuration from a YAML file and validate it.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when reading the file fails, [`ConfigError::Yaml`]
/// when parsing fails, or [`ConfigError::Validation`] when semantic validation fails.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_yaml::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load the process configuration: the YAML file when it exists, defaults
/// otherwise, then `NIM_API_BASE` / `NIM_API_KEY` / `PORT` overrides.
///
/// # Errors
///
/// Returns [`ConfigError`] when an existing file cannot be read or parsed,
/// or when the final configuration fails validation.
pub fn load_runtime_config(path: &str) -> Result<AppConfig, ConfigError> {
    let mut config = match std::fs::read_to_string(path) {
        Ok(contents) => serde_yaml::from_str(&contents)?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
        Err(err) => return Err(err.into()),
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config)?;
    Ok(config)
}

/// Apply environment overrides using `lookup` as the variable source.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] when `PORT` is not a valid port number.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(base_url) = lookup("NIM_API_BASE").filter(|v| !v.trim().is_empty()) {
        config.upstream.base_url = base_url;
    }
    if let Some(api_key) = lookup("NIM_API_KEY").filter(|v| !v.trim().is_empty()) {
        config.upstream.api_key = api_key;
    }
    if let Some(port) = lookup("PORT").filter(|v| !v.trim().is_empty()) {
        config.server.port = port
            .trim()
            .parse()
            .map_err(|_| ConfigError::Validation(format!("PORT must be a port number, got '{port}'")))?;
    }
    Ok(())
}
