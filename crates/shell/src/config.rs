//! Configuration system for retrodesk
//!
//! Reads config from ~/.config/retrodesk/config.toml

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use retrodesk_ai::{AiConfig, ProviderKind};

/// AI configuration section.
#[derive(Debug, Clone)]
pub struct AiSection {
    pub provider: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub cache: bool,
    pub cache_size: usize,
    pub usage_tracking: bool,
}

impl Default for AiSection {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            api_key: None,
            timeout_ms: 30_000,
            max_retries: 2,
            cache: true,
            cache_size: 100,
            usage_tracking: true,
        }
    }
}

/// Storage configuration section.
#[derive(Debug, Clone, Default)]
pub struct StorageSection {
    /// Database path override; None uses the default config-dir location.
    pub path: Option<PathBuf>,
}

/// Full application configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub ai: AiSection,
    pub storage: StorageSection,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Self {
        let config_path = Self::default_config_path();
        Self::load_from_path(&config_path).unwrap_or_default()
    }

    /// Get the default config path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("retrodesk")
            .join("config.toml")
    }

    /// Load from a specific path (simple key=value parsing).
    pub fn load_from_path(path: &PathBuf) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;

        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"');

                match key {
                    "provider" => {
                        config.ai.provider = value.to_string();
                    }
                    "api_key" => {
                        if !value.is_empty() {
                            config.ai.api_key = Some(value.to_string());
                        }
                    }
                    "timeout_ms" => {
                        if let Ok(ms) = value.parse() {
                            config.ai.timeout_ms = ms;
                        }
                    }
                    "max_retries" => {
                        if let Ok(retries) = value.parse() {
                            config.ai.max_retries = retries;
                        }
                    }
                    "cache" => {
                        if let Ok(enabled) = value.parse() {
                            config.ai.cache = enabled;
                        }
                    }
                    "cache_size" => {
                        if let Ok(size) = value.parse() {
                            config.ai.cache_size = size;
                        }
                    }
                    "usage_tracking" => {
                        if let Ok(enabled) = value.parse() {
                            config.ai.usage_tracking = enabled;
                        }
                    }
                    "storage_path" => {
                        config.storage.path = Some(PathBuf::from(value));
                    }
                    _ => {}
                }
            }
        }

        Some(config)
    }

    /// Create a default config file if it doesn't exist.
    pub fn create_default_if_missing() {
        let path = Self::default_config_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let default_config = r#"# retrodesk Configuration

[ai]
provider = "mock"
# api_key = "sk-..."
timeout_ms = 30000
max_retries = 2
cache = true
cache_size = 100
usage_tracking = true

[storage]
# storage_path = "/path/to/storage.db"
"#;
            let _ = std::fs::write(&path, default_config);
        }
    }

    /// Translate the config surface into an `AiConfig`.
    ///
    /// The API key falls back to `$OPENAI_API_KEY` when the config file
    /// doesn't carry one.
    pub fn to_ai_config(&self) -> AiConfig {
        let provider = ProviderKind::from_str(&self.ai.provider).unwrap_or_else(|err| {
            warn!("{err}, using mock");
            ProviderKind::Mock
        });
        let api_key = self
            .ai
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        AiConfig {
            provider,
            api_key,
            timeout: Duration::from_millis(self.ai.timeout_ms),
            max_retries: self.ai.max_retries,
            enable_cache: self.ai.cache,
            cache_size: self.ai.cache_size,
            enable_usage_tracking: self.ai.usage_tracking,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ai.provider, "mock");
        assert_eq!(config.ai.timeout_ms, 30_000);
        assert!(config.ai.cache);
        assert!(config.storage.path.is_none());
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "# comment\n[ai]\nprovider = \"test\"\ntimeout_ms = 500\ncache = false\n",
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.ai.provider, "test");
        assert_eq!(config.ai.timeout_ms, 500);
        assert!(!config.ai.cache);
        // Unspecified keys keep their defaults
        assert_eq!(config.ai.max_retries, 2);
    }

    #[test]
    fn test_missing_file_yields_none() {
        let path = PathBuf::from("/definitely/not/here.toml");
        assert!(Config::load_from_path(&path).is_none());
    }

    #[test]
    fn test_to_ai_config_maps_provider() {
        let mut config = Config::default();
        config.ai.provider = "test".to_string();
        assert_eq!(config.to_ai_config().provider, ProviderKind::Test);

        config.ai.provider = "no-such-provider".to_string();
        assert_eq!(config.to_ai_config().provider, ProviderKind::Mock);
    }
}
