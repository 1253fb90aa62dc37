use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::provider::ProviderId;

/// Credentials for a single provider. Naver uses `api_key` as the client id plus a `secret`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub base_url: String,
    /// Forecast grid cell.
    pub nx: u32,
    pub ny: u32,
    pub rows: u32,
    /// Lag between the scheduled publication hour and data actually being available.
    pub publish_margin_minutes: i64,
    /// A cache hit with less than this left before expiry schedules a background refresh.
    pub refresh_threshold_minutes: i64,
    /// How long after expiry the background refresh runs.
    pub refresh_delay_minutes: i64,
    pub group_chunk_size: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            base_url: "https://apihub.kma.go.kr/api/typ02/openApi/VilageFcstInfoService_2.0/getVilageFcst"
                .to_string(),
            nx: 77,
            ny: 131,
            rows: 900,
            publish_margin_minutes: 10,
            refresh_threshold_minutes: 10,
            refresh_delay_minutes: 1,
            group_chunk_size: 150,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub base_url: String,
    pub query: String,
    /// Page size requested from the search API.
    pub display: u32,
    /// Unique articles kept per fetch.
    pub keep: usize,
    pub ttl_minutes: i64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openapi.naver.com/v1/search/news.json".to_string(),
            query: "뉴스".to_string(),
            display: 20,
            keep: 5,
            ttl_minutes: 30,
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub forecast: ForecastConfig,

    #[serde(default)]
    pub news: NewsConfig,

    /// Example TOML:
    /// [providers.naver]
    /// api_key = "client-id"
    /// secret = "client-secret"
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl Config {
    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-reminder", "reminder")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set or replace the credentials for a provider.
    pub fn upsert_provider_credentials(
        &mut self,
        provider_id: ProviderId,
        api_key: String,
        secret: Option<String>,
    ) {
        self.providers
            .insert(provider_id.as_str().to_string(), ProviderConfig { api_key, secret });
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        match self.provider_config(provider_id) {
            Some(cfg) if provider_id.needs_secret() => {
                !cfg.api_key.is_empty() && cfg.secret.as_deref().is_some_and(|s| !s.is_empty())
            }
            Some(cfg) => !cfg.api_key.is_empty(),
            None => false,
        }
    }

    /// Overlay credentials from the process environment (`API_KEY`, `NAVER_CLIENT_ID`,
    /// `NAVER_CLIENT_SECRET`). Values found there win over the file.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    pub(crate) fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup("API_KEY") {
            self.upsert_provider_credentials(ProviderId::Kma, key, None);
        }

        let existing = self.provider_config(ProviderId::Naver).cloned();
        let id = lookup("NAVER_CLIENT_ID").or_else(|| existing.as_ref().map(|c| c.api_key.clone()));
        let secret = lookup("NAVER_CLIENT_SECRET").or_else(|| existing.and_then(|c| c.secret));
        if let Some(id) = id {
            self.upsert_provider_credentials(ProviderId::Naver, id, secret);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;

    #[test]
    fn defaults_match_the_deployed_service() {
        let cfg = Config::default();
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
        assert_eq!((cfg.forecast.nx, cfg.forecast.ny), (77, 131));
        assert_eq!(cfg.news.display, 20);
        assert_eq!(cfg.news.keep, 5);
        assert_eq!(cfg.news.ttl_minutes, 30);
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_fields() {
        let cfg = Config::from_toml(
            r#"
            [forecast]
            nx = 60
            ny = 127

            [providers.kma]
            api_key = "KMA_KEY"
            "#,
        )
        .unwrap();

        assert_eq!((cfg.forecast.nx, cfg.forecast.ny), (60, 127));
        assert_eq!(cfg.forecast.rows, 900);
        assert_eq!(cfg.news.query, "뉴스");
        assert_eq!(cfg.provider_api_key(ProviderId::Kma), Some("KMA_KEY"));
    }

    #[test]
    fn naver_requires_both_id_and_secret() {
        let mut cfg = Config::default();

        cfg.upsert_provider_credentials(ProviderId::Naver, "ID".into(), None);
        assert!(!cfg.is_provider_configured(ProviderId::Naver));

        cfg.upsert_provider_credentials(ProviderId::Naver, "ID".into(), Some("SECRET".into()));
        assert!(cfg.is_provider_configured(ProviderId::Naver));
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let mut cfg = Config::default();
        cfg.upsert_provider_credentials(ProviderId::Kma, "FROM_FILE".into(), None);
        cfg.upsert_provider_credentials(ProviderId::Naver, "FILE_ID".into(), Some("FILE_SECRET".into()));

        cfg.apply_overrides(|name| match name {
            "API_KEY" => Some("FROM_ENV".to_string()),
            "NAVER_CLIENT_SECRET" => Some("ENV_SECRET".to_string()),
            _ => None,
        });

        assert_eq!(cfg.provider_api_key(ProviderId::Kma), Some("FROM_ENV"));
        let naver = cfg.provider_config(ProviderId::Naver).unwrap();
        assert_eq!(naver.api_key, "FILE_ID");
        assert_eq!(naver.secret.as_deref(), Some("ENV_SECRET"));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut cfg = Config::default();
        cfg.apply_overrides(|_| Some("   ".to_string()));
        assert!(cfg.providers.is_empty());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let path = std::env::temp_dir().join("reminder-config-that-does-not-exist.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(cfg.providers.is_empty());
    }
}
