//! Configuration management with YAML support

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

/// Bearer token verification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret. `JWT_SECRET` in the environment takes precedence.
    #[serde(default)]
    pub jwt_secret: Option<String>,
}

/// Chat-completion gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// 0 disables retries
    #[serde(default)]
    pub max_retries: u32,

    #[serde(default = "CallProfile::code_analysis")]
    pub code_analysis: CallProfile,

    #[serde(default = "CallProfile::security")]
    pub security: CallProfile,

    #[serde(default = "CallProfile::performance")]
    pub performance: CallProfile,

    #[serde(default = "CallProfile::debug")]
    pub debug: CallProfile,

    #[serde(default = "CallProfile::error_analysis")]
    pub error_analysis: CallProfile,
}

/// Sampling parameters for one kind of pipeline call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CallProfile {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CallProfile {
    fn code_analysis() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 4000,
        }
    }

    fn security() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 4000,
        }
    }

    fn performance() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 4000,
        }
    }

    fn debug() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 3000,
        }
    }

    fn error_analysis() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 2000,
        }
    }
}

/// Request validation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_code_length")]
    pub max_code_length: usize,
}

// Default value functions
fn default_database_path() -> String {
    "~/.local/share/henrymo/analysis.db".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:3001".to_string()
}

fn default_provider() -> String {
    "anthropic".to_string()
}

fn default_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_base_url() -> String {
    "https://api.anthropic.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_code_length() -> usize {
    100_000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
            code_analysis: CallProfile::code_analysis(),
            security: CallProfile::security(),
            performance: CallProfile::performance(),
            debug: CallProfile::debug(),
            error_analysis: CallProfile::error_analysis(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_code_length: default_max_code_length(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    /// Searches in order:
    /// 1. Provided path
    /// 2. ./henrymo.yaml (current directory)
    /// 3. ~/.config/henrymo/henrymo.yaml
    pub fn load(path: &str) -> Result<Self> {
        let search_paths = vec![
            shellexpand::tilde(path).to_string(),
            "henrymo.yaml".to_string(),
            shellexpand::tilde("~/.config/henrymo/henrymo.yaml").to_string(),
        ];

        for search_path in &search_paths {
            if std::path::Path::new(search_path).exists() {
                let content = std::fs::read_to_string(search_path)
                    .with_context(|| format!("Failed to read config {}", search_path))?;
                let config: Config = serde_yaml::from_str(&content)
                    .with_context(|| format!("Invalid config {}", search_path))?;
                return Ok(config);
            }
        }

        // No config file found, use defaults
        Ok(Config::default())
    }

    /// Get the database path, expanding ~ to home directory
    pub fn database_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.database.path).to_string();
        PathBuf::from(expanded)
    }

    /// Resolve the token signing secret
    /// `JWT_SECRET` wins over the config file.
    pub fn jwt_secret(&self) -> Option<String> {
        std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.auth.jwt_secret.clone())
    }

    /// Read the LLM API key from the configured environment variable
    pub fn llm_api_key(&self) -> Option<String> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.bind, "127.0.0.1:3001");
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.llm.max_retries, 0);
        assert_eq!(config.llm.security.temperature, 0.2);
        assert_eq!(config.limits.max_code_length, 100_000);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
database:
  path: ~/.local/share/henrymo/test.db

server:
  bind: 0.0.0.0:8080

auth:
  jwt_secret: dev-secret

llm:
  model: claude-3-haiku-20240307
  max_retries: 2
  debug:
    temperature: 0.1
    max_tokens: 1500

limits:
  max_code_length: 5000
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.database.path, "~/.local/share/henrymo/test.db");
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("dev-secret"));
        assert_eq!(config.llm.model, "claude-3-haiku-20240307");
        assert_eq!(config.llm.max_retries, 2);
        assert_eq!(config.llm.debug.max_tokens, 1500);
        // untouched profiles keep their defaults
        assert_eq!(config.llm.code_analysis.max_tokens, 4000);
        assert_eq!(config.limits.max_code_length, 5000);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(&path, "server:\n  bind: 127.0.0.1:9999\n").unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9999");
        assert_eq!(config.llm.api_key_env, "ANTHROPIC_API_KEY");
    }

    #[test]
    fn test_database_path() {
        let config = Config::default();
        let path = config.database_path();
        assert!(path.ends_with("henrymo/analysis.db"));
    }
}
