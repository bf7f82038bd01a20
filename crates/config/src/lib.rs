//! Configuration loading, validation, and credential resolution for Casewise.
//!
//! Loads configuration from `~/.casewise/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use casewise_core::cascade::DEFAULT_MODELS;
use casewise_core::credential::CredentialPool;
use casewise_core::provider::DEFAULT_TEMPERATURE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persona used when no `persona_file` is configured.
pub const DEFAULT_PERSONA: &str = "You are the intake assistant of a social security law office. \
Speak plain, warm Brazilian Portuguese and keep answers short. \
Find out which benefit the client needs, what happened, and which documents they already have. \
When the case is clear enough for a lawyer, call notify_team exactly once. \
When staff teach you a rule, preference, correction or term, call save_knowledge. \
Never promise results and never give a final legal opinion.";

/// Environment variables consulted for credentials, in priority order.
/// `CASEWISE_API_KEY` is the user override; the rest come from deployment.
pub const CREDENTIAL_ENV_VARS: &[&str] = &["CASEWISE_API_KEY", "GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// The root configuration structure.
///
/// Maps directly to `~/.casewise/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Extra API keys, tried after override and environment keys
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_keys: Vec<String>,

    /// Model cascade, most preferred first
    #[serde(default = "default_models")]
    pub models: Vec<String>,

    /// Sampling temperature for conversation turns
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Cap on knowledge facts injected per prompt (unset = all facts)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_facts_in_prompt: Option<usize>,

    /// File holding the base persona text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_file: Option<PathBuf>,

    /// Backend settings
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Knowledge and transcript locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Triage notification settings
    #[serde(default)]
    pub notify: NotifyConfig,
}

fn default_models() -> Vec<String> {
    DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
}
fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_keys", &format!("[{} REDACTED]", self.api_keys.len()))
            .field("models", &self.models)
            .field("temperature", &self.temperature)
            .field("max_facts_in_prompt", &self.max_facts_in_prompt)
            .field("persona_file", &self.persona_file)
            .field("gemini", &self.gemini)
            .field("storage", &self.storage)
            .field("notify", &self.notify)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_base_url(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSONL fact log (default: `~/.casewise/knowledge.jsonl`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_path: Option<PathBuf>,

    /// One JSONL file per conversation (default: `~/.casewise/transcripts`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn knowledge_path(&self) -> PathBuf {
        self.knowledge_path
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("knowledge.jsonl"))
    }

    pub fn transcript_dir(&self) -> PathBuf {
        self.transcript_dir
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("transcripts"))
    }
}

/// Which notifier delivers triage reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifierKind {
    #[default]
    Log,
    Webhook,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub kind: NotifierKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,

    /// HMAC shared secret for the signature header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_secret: Option<String>,

    /// Staff addresses copied on every report
    #[serde(default)]
    pub recipients: Vec<String>,
}

impl std::fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("kind", &self.kind)
            .field("webhook_url", &self.webhook_url)
            .field("shared_secret", &redact(&self.shared_secret))
            .field("recipients", &self.recipients)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.casewise/config.toml).
    ///
    /// `CASEWISE_MODELS` (comma separated) overrides the cascade.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(models) = std::env::var("CASEWISE_MODELS") {
            let models: Vec<String> = models
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
            if !models.is_empty() {
                config.models = models;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".casewise")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.models.iter().all(|m| m.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "models must name at least one model".into(),
            ));
        }

        if self.notify.kind == NotifierKind::Webhook && self.notify.webhook_url.is_none() {
            return Err(ConfigError::ValidationError(
                "notify.kind = \"webhook\" requires notify.webhook_url".into(),
            ));
        }

        Ok(())
    }

    /// Raw credential values in priority order: explicit override, then the
    /// credential environment variables, then the config file list.
    pub fn credential_sources<F>(&self, override_key: Option<&str>, env: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        override_key
            .map(str::to_string)
            .into_iter()
            .chain(CREDENTIAL_ENV_VARS.iter().filter_map(|var| env(var)))
            .chain(self.api_keys.iter().cloned())
            .collect()
    }

    /// Resolve the credential pool from the process environment.
    pub fn credential_pool(&self, override_key: Option<&str>) -> CredentialPool {
        let pool = CredentialPool::from_sources(
            self.credential_sources(override_key, |var| std::env::var(var).ok()),
        );
        tracing::debug!(credentials = pool.len(), "Resolved credential pool");
        pool
    }

    /// The base persona text, from `persona_file` or the built-in default.
    pub fn persona(&self) -> Result<String, ConfigError> {
        match &self.persona_file {
            None => Ok(DEFAULT_PERSONA.to_string()),
            Some(path) => std::fs::read_to_string(path)
                .map(|s| s.trim().to_string())
                .map_err(|e| ConfigError::ReadError {
                    path: path.clone(),
                    reason: e.to_string(),
                }),
        }
    }

    /// Generate a default config TOML string (for the `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_keys: vec![],
            models: default_models(),
            temperature: default_temperature(),
            max_facts_in_prompt: None,
            persona_file: None,
            gemini: GeminiConfig::default(),
            storage: StorageConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
