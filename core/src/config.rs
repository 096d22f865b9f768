use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::proxy::RouteTable;

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub azure: AzureConfig,

    #[serde(default)]
    pub streaming: StreamingConfig,

    /// Client-facing model id -> Azure deployment, in listing order
    #[serde(default)]
    pub model_mapping: Vec<ModelDeployment>,

    /// File this configuration was read from; `None` when built from defaults
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Largest inbound request body, in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            max_body_size: default_max_body_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    /// Name of the Azure OpenAI resource (`{resource}.openai.azure.com`)
    #[serde(default)]
    pub resource_name: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Replaces `https://{resource}.openai.azure.com` when set
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            resource_name: String::new(),
            api_version: default_api_version(),
            endpoint: None,
            request_timeout: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Delay between relayed event-stream frames
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            pacing_ms: default_pacing_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelDeployment {
    pub model: String,
    #[serde(default)]
    pub deployment: String,
}

impl ModelDeployment {
    pub fn new(model: impl Into<String>, deployment: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            deployment: deployment.into(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            azure: AzureConfig::default(),
            streaming: StreamingConfig::default(),
            model_mapping: Vec::new(),
            source: None,
        }
    }
}

impl Config {
    /// Build the read-only route table shared by all requests
    pub fn route_table(&self) -> RouteTable {
        RouteTable::new(
            self.model_mapping
                .iter()
                .map(|m| (m.model.clone(), m.deployment.clone())),
        )
    }

    /// Base URL that deployment paths are appended to
    pub fn backend_base_url(&self) -> String {
        match self.azure.endpoint.as_deref().filter(|e| !e.is_empty()) {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.openai.azure.com", self.azure.resource_name),
        }
    }

    /// Apply environment overrides using `lookup` for variable access.
    ///
    /// `RESOURCE_NAME` and `API_VERSION` override the file values. When the
    /// file defines no model mapping, the default table is filled from the
    /// `DEPLOY_NAME_*` variables.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(resource) = lookup("RESOURCE_NAME").filter(|v| !v.is_empty()) {
            self.azure.resource_name = resource;
        }
        if let Some(version) = lookup("API_VERSION").filter(|v| !v.is_empty()) {
            self.azure.api_version = version;
        }
        if self.model_mapping.is_empty() {
            self.model_mapping = default_model_mapping(&lookup);
        }
    }
}

/// Default client model ids and the variables naming their deployments
const DEFAULT_MODELS: [(&str, &str); 5] = [
    ("gpt-3.5-turbo", "DEPLOY_NAME_GPT35"),
    ("gpt-3.5-turbo-16k", "DEPLOY_NAME_GPT35_16K"),
    ("gpt-4", "DEPLOY_NAME_GPT4"),
    ("gpt-4-32k", "DEPLOY_NAME_GPT4_32K"),
    ("text-embedding-ada-002", "DEPLOY_NAME_EMBEDDING"),
];

fn default_model_mapping<F>(lookup: &F) -> Vec<ModelDeployment>
where
    F: Fn(&str) -> Option<String>,
{
    DEFAULT_MODELS
        .iter()
        .map(|(model, var)| ModelDeployment::new(*model, lookup(var).unwrap_or_default()))
        .collect()
}

// Default value functions
fn default_port() -> u16 { 8045 }
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_max_body_size() -> usize { 100 * 1024 * 1024 } // 100MB
fn default_api_version() -> String { "2023-08-01-preview".to_string() }
fn default_request_timeout() -> u64 { 600 }
fn default_pacing_ms() -> u64 { 20 }
fn default_channel_capacity() -> usize { 32 }

/// Get default config file path
/// Uses ~/.config/azure-gateway/config.toml for Unix-like CLI experience
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("azure-gateway")
        .join("config.toml")
}

/// Load config from file, or fall back to defaults, then apply environment overrides.
///
/// An explicit `path` must exist. Without one, `./config.toml` is tried
/// first (a broken local file is skipped with a warning), then
/// `default_config_path()`.
pub fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(explicit) => {
            anyhow::ensure!(explicit.exists(), "Specified config file not found: {:?}", explicit);
            parse_config_file(&explicit)?
        }
        None => discover_config()?,
    };
    config.apply_env_with(|key| std::env::var(key).ok());
    Ok(config)
}

fn discover_config() -> anyhow::Result<Config> {
    let local = Path::new("config.toml");
    if local.exists() {
        match parse_config_file(local) {
            Ok(config) => return Ok(config),
            Err(e) => tracing::warn!("Skipping {}: {:#}", local.display(), e),
        }
    }

    let home = default_config_path();
    if home.exists() {
        return parse_config_file(&home);
    }

    tracing::info!("No config file found, using defaults");
    Ok(Config::default())
}

fn parse_config_file(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    config.source = Some(path.to_path_buf());
    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}
