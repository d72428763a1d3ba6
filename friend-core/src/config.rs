use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

use crate::provider::ProviderId;

/// Environment variable holding the chat service key.
pub const CHAT_API_KEY_ENV: &str = "OLLAMA_API_KEY";

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Hosted chat model used when a message is not a weather question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_chat_base_url")]
    pub base_url: String,

    #[serde(default = "default_chat_model")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_chat_base_url() -> String {
    "https://ollama.com".to_string()
}

fn default_chat_model() -> String {
    "gpt-oss:120b".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_chat_base_url(),
            model: default_chat_model(),
            api_key: None,
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Optional default provider id, e.g. "openweather" or "openmeteo".
    #[serde(default)]
    pub default_provider: Option<String>,

    /// Deadline for every outbound HTTP request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub chat: ChatConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_provider: None,
            timeout_secs: default_timeout_secs(),
            providers: HashMap::new(),
            chat: ChatConfig::default(),
        }
    }
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    ///
    /// With nothing configured this is Open-Meteo, which needs no key.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        match self.default_provider.as_deref() {
            Some(s) => ProviderId::try_from(s),
            None => Ok(ProviderId::OpenMeteo),
        }
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-friend", "weather-friend")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Convenience helper: set/replace a provider API key and optionally set default provider.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    /// API key for a provider. The provider's environment variable wins over
    /// the file.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<String> {
        self.provider_api_key_with(provider_id, |name| std::env::var(name).ok())
    }

    pub(crate) fn provider_api_key_with(
        &self,
        provider_id: ProviderId,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        provider_id
            .api_key_env()
            .and_then(env)
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.provider_config(provider_id).map(|cfg| cfg.api_key.clone()))
    }

    /// Whether `provider_id` can be built: keyless providers always can.
    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.is_provider_configured_with(provider_id, |name| std::env::var(name).ok())
    }

    pub(crate) fn is_provider_configured_with(
        &self,
        provider_id: ProviderId,
        env: impl Fn(&str) -> Option<String>,
    ) -> bool {
        !provider_id.requires_api_key() || self.provider_api_key_with(provider_id, env).is_some()
    }

    /// Chat key, environment first.
    pub fn chat_api_key(&self) -> Option<String> {
        self.chat_api_key_with(|name| std::env::var(name).ok())
    }

    pub(crate) fn chat_api_key_with(&self, env: impl Fn(&str) -> Option<String>) -> Option<String> {
        env(CHAT_API_KEY_ENV)
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.chat.api_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn default_provider_is_keyless_open_meteo() {
        let cfg = Config::default();
        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenMeteo);
    }

    #[test]
    fn unknown_default_provider_is_an_error() {
        let cfg = Config {
            default_provider: Some("darksky".into()),
            ..Default::default()
        };
        let err = cfg.default_provider_id().unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn set_api_key_and_default_for_provider() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());

        let default = cfg.default_provider_id().expect("default provider must exist");
        assert_eq!(default, ProviderId::OpenWeather);

        let key = cfg.provider_api_key_with(ProviderId::OpenWeather, no_env);
        assert_eq!(key.as_deref(), Some("OPEN_KEY"));
    }

    #[test]
    fn upsert_does_not_override_existing_default() {
        let mut cfg = Config::default();
        cfg.set_default_provider(ProviderId::OpenMeteo);

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());

        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenMeteo);
    }

    #[test]
    fn set_default_provider_overrides_default() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());
        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenWeather);

        cfg.set_default_provider(ProviderId::OpenMeteo);
        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenMeteo);
    }

    #[test]
    fn environment_key_wins_over_file() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "FILE_KEY".into());

        let env = |name: &str| (name == "OPENWEATHER_API_KEY").then(|| "ENV_KEY".to_string());
        assert_eq!(
            cfg.provider_api_key_with(ProviderId::OpenWeather, env).as_deref(),
            Some("ENV_KEY")
        );

        let blank = |_: &str| Some("   ".to_string());
        assert_eq!(
            cfg.provider_api_key_with(ProviderId::OpenWeather, blank).as_deref(),
            Some("FILE_KEY")
        );
    }

    #[test]
    fn configured_means_key_present_or_not_needed() {
        let mut cfg = Config::default();
        assert!(cfg.is_provider_configured_with(ProviderId::OpenMeteo, no_env));
        assert!(!cfg.is_provider_configured_with(ProviderId::OpenWeather, no_env));

        let env = |name: &str| (name == "OPENWEATHER_API_KEY").then(|| "ENV_KEY".to_string());
        assert!(cfg.is_provider_configured_with(ProviderId::OpenWeather, env));

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "FILE_KEY".into());
        assert!(cfg.is_provider_configured_with(ProviderId::OpenWeather, no_env));
    }

    #[test]
    fn chat_key_resolution() {
        let mut cfg = Config::default();
        assert_eq!(cfg.chat_api_key_with(no_env), None);

        cfg.chat.api_key = Some("FILE".into());
        assert_eq!(cfg.chat_api_key_with(no_env).as_deref(), Some("FILE"));

        let env = |_: &str| Some("ENV".to_string());
        assert_eq!(cfg.chat_api_key_with(env).as_deref(), Some("ENV"));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());
        cfg.chat.model = "llama3".into();
        cfg.timeout_secs = 4;

        cfg.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();

        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_provider = \"openweather\"\n[chat]\nmodel = \"m\"\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();

        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenWeather);
        assert_eq!(cfg.chat.model, "m");
        assert_eq!(cfg.chat.base_url, "https://ollama.com");
        assert_eq!(cfg.timeout_secs, 10);
    }

    #[test]
    fn garbage_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is = = not toml").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
