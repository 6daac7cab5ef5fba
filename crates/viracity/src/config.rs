use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CHAT_PATH: &str = "/chat/completions";
const DEFAULT_API_KEY_ENV: &str = "VIRACITY_API_KEY";
const DEFAULT_PROMPT_DIR: &str = "prompts";

#[derive(Debug, Deserialize)]
pub(crate) struct ViracityConfig {
    #[serde(default = "default_prompt_dir")]
    pub(crate) prompt_dir: PathBuf,
    pub(crate) system_prompt: Option<String>,
    pub(crate) service: ServiceConfig,
    #[serde(default)]
    pub(crate) request: RequestConfig,
    pub(crate) search: Option<SearchConfig>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub(crate) enum AuthScheme {
    #[default]
    ApiKey,
    Bearer,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ServiceConfig {
    pub(crate) base_url: String,
    #[serde(default = "default_chat_path")]
    pub(crate) chat_path: String,
    pub(crate) api_version: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub(crate) api_key_env: String,
    #[serde(default)]
    pub(crate) auth: AuthScheme,
    pub(crate) model: String,
    pub(crate) timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct RequestConfig {
    pub(crate) max_tokens: u32,
    pub(crate) temperature: f64,
    pub(crate) top_p: f64,
    pub(crate) seed: Option<i64>,
    pub(crate) presence_penalty: f64,
    pub(crate) frequency_penalty: f64,
    pub(crate) json_response: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            max_tokens: 16384,
            temperature: 0.0,
            top_p: 0.001,
            seed: Some(42),
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            json_response: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchConfig {
    pub(crate) endpoint: String,
    pub(crate) index_name: String,
    #[serde(default = "default_true")]
    pub(crate) in_scope: bool,
    #[serde(default = "default_strictness")]
    pub(crate) strictness: u8,
    #[serde(default = "default_top_n_documents")]
    pub(crate) top_n_documents: u16,
    #[serde(default = "default_query_type")]
    pub(crate) query_type: String,
    #[serde(default = "default_embedding_deployment")]
    pub(crate) embedding_deployment: Option<String>,
    #[serde(default = "default_semantic_configuration")]
    pub(crate) semantic_configuration: Option<String>,
    #[serde(default = "default_true")]
    pub(crate) allow_partial_result: bool,
    #[serde(default = "default_search_authentication")]
    pub(crate) authentication: String,
}

impl ServiceConfig {
    pub(crate) fn api_key(&self) -> anyhow::Result<String> {
        let key = std::env::var(&self.api_key_env)
            .with_context(|| format!("environment variable {} is not set", self.api_key_env))?;
        if key.trim().is_empty() {
            anyhow::bail!("environment variable {} is empty", self.api_key_env);
        }
        Ok(key)
    }
}

fn default_prompt_dir() -> PathBuf {
    PathBuf::from(DEFAULT_PROMPT_DIR)
}

fn default_chat_path() -> String {
    DEFAULT_CHAT_PATH.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_true() -> bool {
    true
}

fn default_strictness() -> u8 {
    3
}

fn default_top_n_documents() -> u16 {
    11
}

fn default_query_type() -> String {
    "vector_simple_hybrid".to_string()
}

fn default_embedding_deployment() -> Option<String> {
    Some("text-embedding-ada-002".to_string())
}

fn default_semantic_configuration() -> Option<String> {
    Some("default".to_string())
}

fn default_search_authentication() -> String {
    "system_assigned_managed_identity".to_string()
}

fn validate_config(config: &ViracityConfig) -> anyhow::Result<()> {
    if config.service.base_url.trim().is_empty() {
        anyhow::bail!("service.base_url must be set");
    }
    if config.service.model.trim().is_empty() {
        anyhow::bail!("service.model must be set");
    }
    let request = &config.request;
    if !(0.0..=1.0).contains(&request.temperature) {
        anyhow::bail!("request.temperature must be within 0..=1");
    }
    if !(0.0..=1.0).contains(&request.top_p) {
        anyhow::bail!("request.top_p must be within 0..=1");
    }
    if !(-2.0..=2.0).contains(&request.presence_penalty) {
        anyhow::bail!("request.presence_penalty must be within -2..=2");
    }
    if !(-2.0..=2.0).contains(&request.frequency_penalty) {
        anyhow::bail!("request.frequency_penalty must be within -2..=2");
    }
    if let Some(search) = &config.search {
        if search.endpoint.trim().is_empty() || search.index_name.trim().is_empty() {
            anyhow::bail!("search requires endpoint and index_name");
        }
        if !(1..=5).contains(&search.strictness) {
            anyhow::bail!("search.strictness must be within 1..=5");
        }
        if !(1..=128).contains(&search.top_n_documents) {
            anyhow::bail!("search.top_n_documents must be within 1..=128");
        }
    }
    Ok(())
}

pub(crate) fn load_viracity_config(path: &Path) -> anyhow::Result<ViracityConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let mut config: ViracityConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    validate_config(&config)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    config.prompt_dir = resolve_relative(base_dir, &config.prompt_dir);
    Ok(config)
}

fn resolve_relative(base_dir: &Path, path: &Path) -> PathBuf {
    let expanded = expand_tilde(&path.to_string_lossy());
    if expanded.is_absolute() {
        expanded
    } else {
        base_dir.join(expanded)
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home);
        }
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}
