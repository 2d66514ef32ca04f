//! TOML Configuration File Support
//!
//! Centralized configuration loading for the analyzer, with an optional TOML
//! file at `~/.config/sentiment-analyzer/analyzer.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (applied by the caller through [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! host = "localhost"
//! port = 11434
//! request_timeout_secs = 30
//!
//! [analysis]
//! model = "sentiment-engine"
//! think = true
//! system_prompt = "Analyze the sentiment. Return JSON with polarity, emotion, confidence_score, and reasoning."
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analyzer::AnalyzerConfig;
use crate::backend::BackendConfig;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Backend section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// Ollama host
    pub host: Option<String>,

    /// Ollama port
    pub port: Option<u16>,

    /// Upper bound for one analysis, in seconds
    pub request_timeout_secs: Option<u64>,
}

/// Analysis section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisToml {
    /// Model name
    pub model: Option<String>,

    /// Whether to request streamed reasoning
    pub think: Option<bool>,

    /// System prompt sent ahead of the text
    pub system_prompt: Option<String>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerToml {
    /// Backend configuration section
    pub backend: BackendToml,

    /// Analysis configuration section
    pub analysis: AnalysisToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Consolidated configuration from all sources
#[derive(Clone, Debug)]
pub struct AnalyzerConfigFile {
    /// Backend connection
    pub backend: BackendConfig,

    /// Upper bound for one analysis
    pub request_timeout: Duration,

    /// Analyzer settings
    pub analyzer: AnalyzerConfig,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for AnalyzerConfigFile {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            request_timeout: Duration::from_secs(30),
            analyzer: AnalyzerConfig::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl AnalyzerConfigFile {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Check values that would make every request fail
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for a zero port, a zero
    /// timeout, or an empty model name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let BackendConfig::Ollama { ref host, port } = self.backend;
        if host.trim().is_empty() {
            return Err(ConfigError::ValidationError("backend host is empty".into()));
        }
        if port == 0 {
            return Err(ConfigError::ValidationError("backend port is 0".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "request timeout must be at least 1 second".into(),
            ));
        }
        if self.analyzer.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model name is empty".into()));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/sentiment-analyzer/analyzer.toml` or the
/// platform equivalent.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sentiment-analyzer").join("analyzer.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if the
/// resulting values are invalid. A missing config file is not an error.
pub fn load_config() -> Result<AnalyzerConfigFile, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only defaults
///   and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed, or
/// if the resulting values are invalid.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<AnalyzerConfigFile, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration with an explicit environment lookup
pub(crate) fn load_config_with_env(
    path: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<AnalyzerConfigFile, ConfigError> {
    // Start with defaults
    let mut config = AnalyzerConfigFile::default();

    // Try to load from file
    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: AnalyzerToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    // Apply environment variables (overrides file values)
    apply_env_config(&mut config, env);

    config.validate()?;
    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut AnalyzerConfigFile, toml: &AnalyzerToml) {
    let BackendConfig::Ollama {
        ref mut host,
        ref mut port,
    } = config.backend;

    // Backend settings
    if let Some(ref h) = toml.backend.host {
        host.clone_from(h);
    }
    if let Some(p) = toml.backend.port {
        *port = p;
    }
    if let Some(secs) = toml.backend.request_timeout_secs {
        config.request_timeout = Duration::from_secs(secs);
    }

    // Analysis settings
    if let Some(ref model) = toml.analysis.model {
        config.analyzer.model.clone_from(model);
    }
    if let Some(think) = toml.analysis.think {
        config.analyzer.think = think;
    }
    if toml.analysis.system_prompt.is_some() {
        config.analyzer.system_prompt.clone_from(&toml.analysis.system_prompt);
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut AnalyzerConfigFile, env: impl Fn(&str) -> Option<String>) {
    let BackendConfig::Ollama {
        ref mut host,
        ref mut port,
    } = config.backend;

    // Backend settings from environment
    if let Some(h) = env("OLLAMA_HOST") {
        *host = h;
        config.source = ConfigSource::Env;
    }
    if let Some(p) = env("OLLAMA_PORT") {
        if let Ok(p) = p.parse::<u16>() {
            *port = p;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(secs) = env("SENTIMENT_TIMEOUT_SECS") {
        if let Ok(secs) = secs.parse::<u64>() {
            config.request_timeout = Duration::from_secs(secs);
            config.source = ConfigSource::Env;
        }
    }

    // Analysis settings from environment
    if let Some(model) = env("SENTIMENT_MODEL") {
        config.analyzer.model = model;
        config.source = ConfigSource::Env;
    }
    if let Some(think) = env("SENTIMENT_THINK") {
        config.analyzer.think = think != "0" && think.to_lowercase() != "false";
        config.source = ConfigSource::Env;
    }
    if let Some(prompt) = env("SENTIMENT_SYSTEM_PROMPT") {
        config.analyzer.system_prompt = Some(prompt).filter(|p| !p.trim().is_empty());
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Host override
    pub host: Option<String>,

    /// Port override
    pub port: Option<u16>,

    /// Model override
    pub model: Option<String>,

    /// Reasoning mode override
    pub think: Option<bool>,

    /// Timeout override (seconds)
    pub request_timeout_secs: Option<u64>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set host override
    #[must_use]
    pub fn with_host(mut self, host: String) -> Self {
        self.host = Some(host);
        self
    }

    /// Set port override
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set model override
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }

    /// Set reasoning mode override
    #[must_use]
    pub fn with_think(mut self, think: bool) -> Self {
        self.think = Some(think);
        self
    }

    /// Set timeout override
    #[must_use]
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// Apply overrides to a configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if the overridden values are invalid.
    pub fn apply(&self, config: &mut AnalyzerConfigFile) -> Result<(), ConfigError> {
        if self.host.is_some()
            || self.port.is_some()
            || self.model.is_some()
            || self.think.is_some()
            || self.request_timeout_secs.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        let BackendConfig::Ollama {
            ref mut host,
            ref mut port,
        } = config.backend;

        if let Some(ref h) = self.host {
            host.clone_from(h);
        }
        if let Some(p) = self.port {
            *port = p;
        }
        if let Some(ref model) = self.model {
            config.analyzer.model.clone_from(model);
        }
        if let Some(think) = self.think {
            config.analyzer.think = think;
        }
        if let Some(secs) = self.request_timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }

        config.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_toml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = AnalyzerConfigFile::default();

        assert_eq!(config.backend, BackendConfig::ollama("localhost", 11434));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.analyzer.model, "sentiment-engine");
        assert!(config.analyzer.think);
        assert_eq!(config.analyzer.system_prompt, None);
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.to_string_lossy().contains("sentiment-analyzer"));
            assert!(p.to_string_lossy().ends_with("analyzer.toml"));
        }
    }

    #[test]
    fn test_parse_valid_toml() {
        let file = write_toml(
            r#"
[backend]
host = "gpu-box"
port = 8080
request_timeout_secs = 90

[analysis]
model = "qwen3:8b"
think = false
system_prompt = "Return JSON"
"#,
        );

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.backend, BackendConfig::ollama("gpu-box", 8080));
        assert_eq!(config.request_timeout, Duration::from_secs(90));
        assert_eq!(config.analyzer.model, "qwen3:8b");
        assert!(!config.analyzer.think);
        assert_eq!(config.analyzer.system_prompt.as_deref(), Some("Return JSON"));
        assert_eq!(config.source(), ConfigSource::File);
        assert_eq!(config.config_file_path, Some(file.path().to_path_buf()));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let file = write_toml("[analysis]\nmodel = \"other\"\n");
        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.analyzer.model, "other");
        assert_eq!(config.backend, BackendConfig::default());
        assert!(config.analyzer.think);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config =
            load_config_with_env(Some(PathBuf::from("/nonexistent/analyzer.toml")), no_env)
                .unwrap();
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.config_file_path.is_none());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let file = write_toml("[backend\nport = ");
        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_zero_port_is_invalid() {
        let file = write_toml("[backend]\nport = 0\n");
        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_toml("[backend]\nhost = \"file-host\"\n[analysis]\nmodel = \"file-model\"\n");
        let env: HashMap<&str, &str> = [
            ("OLLAMA_HOST", "env-host"),
            ("OLLAMA_PORT", "9999"),
            ("SENTIMENT_MODEL", "env-model"),
            ("SENTIMENT_THINK", "false"),
            ("SENTIMENT_TIMEOUT_SECS", "12"),
        ]
        .into_iter()
        .collect();

        let config = load_config_with_env(Some(file.path().to_path_buf()), |key| {
            env.get(key).map(|v| (*v).to_string())
        })
        .unwrap();

        assert_eq!(config.backend, BackendConfig::ollama("env-host", 9999));
        assert_eq!(config.analyzer.model, "env-model");
        assert!(!config.analyzer.think);
        assert_eq!(config.request_timeout, Duration::from_secs(12));
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_unparseable_env_port_ignored() {
        let config = load_config_with_env(None, |key| {
            (key == "OLLAMA_PORT").then(|| "not-a-port".to_string())
        })
        .unwrap();
        assert_eq!(config.backend, BackendConfig::default());
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = AnalyzerConfigFile::default();
        ConfigOverrides::new()
            .with_model("cli-model".to_string())
            .with_port(1234)
            .with_think(false)
            .apply(&mut config)
            .unwrap();

        assert_eq!(config.analyzer.model, "cli-model");
        assert_eq!(config.backend, BackendConfig::ollama("localhost", 1234));
        assert!(!config.analyzer.think);
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_empty_overrides_keep_source() {
        let mut config = AnalyzerConfigFile::default();
        ConfigOverrides::new().apply(&mut config).unwrap();
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_cli_override_validated() {
        let mut config = AnalyzerConfigFile::default();
        let result = ConfigOverrides::new()
            .with_request_timeout_secs(0)
            .apply(&mut config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
