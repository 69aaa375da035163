use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{BackendError, Result};

/// Backend configuration: named presets plus per-provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Preset to use when the caller does not name one
    #[serde(default = "default_preset")]
    pub default_preset: String,

    /// Named backend presets for quick access
    #[serde(default)]
    pub presets: HashMap<String, ModelPreset>,

    /// Provider-specific configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_preset() -> String {
    "ollama".to_string()
}

/// A named backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPreset {
    /// Provider identifier (ollama, openai, openrouter)
    pub provider: String,

    /// Model name/identifier for the provider
    pub model: String,
}

/// Provider-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (optional, can use env var instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Custom base URL (Ollama host, self-hosted gateway, etc.)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home =
            std::env::var("HOME").map_err(|_| BackendError::ConfigError("HOME not set".into()))?;
        Ok(PathBuf::from(home).join(".config/chapterwise/backends.toml"))
    }

    /// Get a preset by name
    pub fn get_preset(&self, name: &str) -> Result<&ModelPreset> {
        self.presets
            .get(name)
            .ok_or_else(|| BackendError::InvalidPreset(name.to_string()))
    }

    /// Get provider config by provider name
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.providers.get(provider)
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut presets = HashMap::new();

        // Default preset: local Ollama with llama3.1
        presets.insert(
            "ollama".to_string(),
            ModelPreset {
                provider: "ollama".to_string(),
                model: "llama3.1".to_string(),
            },
        );

        Self {
            default_preset: "ollama".to_string(),
            presets,
            providers: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_preset, "ollama");
        assert!(config.presets.contains_key("ollama"));

        let preset = config.get_preset("ollama").unwrap();
        assert_eq!(preset.provider, "ollama");
        assert_eq!(preset.model, "llama3.1");
    }

    #[test]
    fn test_invalid_preset() {
        let config = Config::default();
        let result = config.get_preset("nonexistent");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_preset, config.default_preset);
    }

    #[test]
    fn test_parse_provider_config() {
        let toml_str = r#"
default_preset = "fast"

[presets.fast]
provider = "openai"
model = "gpt-4o-mini"

[providers.openai]
api_key = "sk-test"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_preset, "fast");
        let preset = config.get_preset("fast").unwrap();
        assert_eq!(preset.provider, "openai");
        let provider = config.get_provider_config("openai").unwrap();
        assert_eq!(provider.api_key.as_deref(), Some("sk-test"));
    }
}
