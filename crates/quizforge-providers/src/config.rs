//! Configuration loading and provider factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizforge_core::engine::EngineConfig;
use quizforge_core::model::{DiagnosticSettings, DEFAULT_TOPICS};
use quizforge_core::traits::LlmProvider;

use crate::gemini::GeminiProvider;
use crate::openai::OpenAiProvider;

/// File name looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = "quizforge.toml";

/// Configuration for a single content generator.
///
/// The `Debug` impl masks API keys.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    Gemini {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::Gemini {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
        }
    }
}

impl ProviderConfig {
    fn api_key_mut(&mut self) -> &mut String {
        match self {
            ProviderConfig::OpenAI { api_key, .. } | ProviderConfig::Gemini { api_key, .. } => {
                api_key
            }
        }
    }

    fn resolved(&self) -> ProviderConfig {
        match self {
            ProviderConfig::OpenAI {
                api_key,
                base_url,
                org_id,
            } => ProviderConfig::OpenAI {
                api_key: resolve_env_vars(api_key),
                base_url: base_url.as_deref().map(resolve_env_vars),
                org_id: org_id.as_deref().map(resolve_env_vars),
            },
            ProviderConfig::Gemini { api_key, base_url } => ProviderConfig::Gemini {
                api_key: resolve_env_vars(api_key),
                base_url: base_url.as_deref().map(resolve_env_vars),
            },
        }
    }
}

/// Top-level quizforge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizforgeConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default = "default_provider")]
    pub default_provider: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_temperature")]
    pub default_temperature: f64,
    /// Max retries on transient provider errors, per slot.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Max concurrent slot requests.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Where sessions and scorecards are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Topic catalog the allocator picks from.
    #[serde(default = "default_topics")]
    pub topics: Vec<String>,
    /// Default diagnostic settings.
    #[serde(default)]
    pub diagnostic: DiagnosticSettings,
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4.1".to_string()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_retries() -> u32 {
    2
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./quizforge-sessions")
}
fn default_topics() -> Vec<String> {
    DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect()
}

impl Default for QuizforgeConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
            topics: default_topics(),
            diagnostic: DiagnosticSettings::default(),
        }
    }
}

impl QuizforgeConfig {
    /// Engine settings derived from this configuration.
    pub fn engine_config(&self, model: Option<&str>) -> EngineConfig {
        EngineConfig {
            model: model.unwrap_or(&self.default_model).to_string(),
            parallelism: self.parallelism,
            temperature: self.default_temperature,
            max_retries_per_slot: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            ..EngineConfig::default()
        }
    }

    /// Build the named provider, or the default one.
    pub fn provider(&self, name: Option<&str>) -> Result<Arc<dyn LlmProvider>> {
        let name = name.unwrap_or(&self.default_provider);
        let config = self.providers.get(name).with_context(|| {
            format!(
                "provider '{name}' is not configured (add [providers.{name}] to {CONFIG_FILE_NAME} \
                 or set QUIZFORGE_{}_KEY)",
                name.to_uppercase()
            )
        })?;
        create_provider(config)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Unset variables resolve to an empty string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

/// Apply `QUIZFORGE_<PROVIDER>_KEY` overrides, creating the provider entry
/// when it is missing.
fn apply_key_overrides(config: &mut QuizforgeConfig, lookup: impl Fn(&str) -> Option<String>) {
    let known = [
        (
            "openai",
            "QUIZFORGE_OPENAI_KEY",
            ProviderConfig::OpenAI {
                api_key: String::new(),
                base_url: None,
                org_id: None,
            },
        ),
        (
            "gemini",
            "QUIZFORGE_GEMINI_KEY",
            ProviderConfig::Gemini {
                api_key: String::new(),
                base_url: None,
            },
        ),
    ];

    for (name, var, empty) in known {
        if let Some(key) = lookup(var) {
            *config
                .providers
                .entry(name.to_string())
                .or_insert(empty)
                .api_key_mut() = key;
        }
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizforge.toml` in the current directory
/// 2. `~/.config/quizforge/config.toml`
///
/// Environment variable overrides: `QUIZFORGE_OPENAI_KEY`, `QUIZFORGE_GEMINI_KEY`.
pub fn load_config() -> Result<QuizforgeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizforgeConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() {
                Some(local)
            } else {
                global_config_path().filter(|p| p.exists())
            }
        }
    };

    let mut config = match &config_path {
        Some(path) => parse_config_file(path)?,
        None => QuizforgeConfig::default(),
    };

    apply_key_overrides(&mut config, |var| std::env::var(var).ok());
    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), v.resolved()))
        .collect();

    tracing::debug!(
        path = ?config_path,
        providers = config.providers.len(),
        "loaded configuration"
    );
    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<QuizforgeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let config = toml::from_str::<QuizforgeConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))?;
    config
        .diagnostic
        .validate()
        .with_context(|| format!("invalid [diagnostic] settings in {}", path.display()))?;
    Ok(config)
}

fn global_config_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|h| {
        PathBuf::from(h)
            .join(".config")
            .join("quizforge")
            .join("config.toml")
    })
}

/// Create a provider instance from its configuration.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn LlmProvider>> {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => Ok(Arc::new(OpenAiProvider::new(
            api_key,
            base_url.clone(),
            org_id.clone(),
        )?)),
        ProviderConfig::Gemini { api_key, base_url } => {
            Ok(Arc::new(GeminiProvider::new(api_key, base_url.clone())?))
        }
    }
}
