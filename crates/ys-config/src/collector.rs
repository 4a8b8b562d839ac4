use serde::{Deserialize, Serialize};
use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::paths::ConfigPaths;
use crate::phrases::default_search_phrases;

pub const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8000
}

fn default_allowed_origins() -> Vec<String> {
    match env::var("YTSCOPE_ALLOWED_ORIGINS") {
        Ok(val) => val
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn default_daily_quota() -> u32 {
    10_000
}

fn default_videos_per_query() -> u32 {
    2_000
}

fn default_reset_timezone() -> String {
    "America/Los_Angeles".to_string()
}

fn default_min_request_interval_ms() -> u64 {
    1_000
}

fn default_api_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// Overrides `<base>/data` when set.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_daily_quota")]
    pub daily_quota: u32,
    #[serde(default = "default_videos_per_query")]
    pub videos_per_query: u32,
    #[serde(default = "default_search_phrases")]
    pub search_phrases: Vec<String>,
    /// IANA zone whose midnight marks the daily quota reset.
    #[serde(default = "default_reset_timezone")]
    pub reset_timezone: String,
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Read from `YOUTUBE_API_KEY`; never written to the config file.
    #[serde(skip)]
    pub api_key: Option<String>,
    #[serde(skip)]
    paths: Option<ConfigPaths>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
            data_dir: None,
            daily_quota: default_daily_quota(),
            videos_per_query: default_videos_per_query(),
            search_phrases: default_search_phrases(),
            reset_timezone: default_reset_timezone(),
            min_request_interval_ms: default_min_request_interval_ms(),
            api_base_url: default_api_base_url(),
            api_key: None,
            paths: None,
        }
    }
}

impl CollectorConfig {
    /// Returns the `ConfigPaths` for this config. If paths haven't been set,
    /// creates the default paths (may fail if `$HOME` is unset).
    pub fn paths(&self) -> anyhow::Result<ConfigPaths> {
        match &self.paths {
            Some(p) => Ok(p.clone()),
            None => ConfigPaths::new(),
        }
    }

    pub fn set_paths(&mut self, paths: ConfigPaths) {
        self.paths = Some(paths);
    }

    /// Load config from the default location (`~/.ytscope/config.toml`).
    pub fn load() -> anyhow::Result<Self> {
        let paths = ConfigPaths::new()?;
        Self::load_from(&paths)
    }

    /// Load config from a specific `ConfigPaths`, picking up the API key
    /// from the environment.
    pub fn load_from(paths: &ConfigPaths) -> anyhow::Result<Self> {
        let config_file = paths.config_path();
        let mut config = if config_file.exists() {
            let content = std::fs::read_to_string(&config_file)?;
            let config: CollectorConfig = toml::from_str(&content)?;
            config
        } else {
            Self::default()
        };
        config.paths = Some(paths.clone());
        config.api_key = env::var(API_KEY_ENV)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        config.validate()?;
        Ok(config)
    }

    /// Validate config values. Called automatically by `load` / `load_from`.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must not be 0");
        }
        if self.daily_quota == 0 {
            anyhow::bail!("daily_quota must be greater than 0");
        }
        if self.videos_per_query == 0 {
            anyhow::bail!("videos_per_query must be greater than 0");
        }
        if self.search_phrases.iter().all(|p| p.trim().is_empty()) {
            anyhow::bail!("search_phrases must contain at least one phrase");
        }
        if self.api_base_url.is_empty() {
            anyhow::bail!("api_base_url must not be empty");
        }
        self.reset_tz()?;
        Ok(())
    }

    pub fn reset_tz(&self) -> anyhow::Result<chrono_tz::Tz> {
        self.reset_timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| anyhow::anyhow!("unknown reset_timezone: {}", self.reset_timezone))
    }

    pub fn data_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(self.paths()?.data_dir()),
        }
    }

    pub fn checkpoint_path(&self) -> anyhow::Result<PathBuf> {
        Ok(self.paths()?.checkpoint_path())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_paths() -> (tempfile::TempDir, ConfigPaths) {
        let dir = tempfile::tempdir().unwrap();
        let paths = ConfigPaths::with_base(dir.path().to_path_buf());
        (dir, paths)
    }

    #[test]
    fn default_produces_expected_values() {
        let config = CollectorConfig::default();
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.port, 8000);
        assert_eq!(config.daily_quota, 10_000);
        assert_eq!(config.videos_per_query, 2_000);
        assert_eq!(config.search_phrases.len(), 17);
        assert_eq!(config.reset_timezone, "America/Los_Angeles");
    }

    #[test]
    fn bind_addr_formats_correctly() {
        let mut config = CollectorConfig::default();
        config.port = 8080;
        config.host = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn load_with_no_file_returns_default() {
        let (_dir, paths) = test_paths();
        let config = CollectorConfig::load_from(&paths).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.data_dir().unwrap(), paths.data_dir());
    }

    #[test]
    fn load_with_partial_toml_fills_defaults() {
        let (_dir, paths) = test_paths();
        std::fs::write(
            paths.config_path(),
            "port = 7777\nsearch_phrases = [\"Bach Cantata\"]\n",
        )
        .unwrap();
        let config = CollectorConfig::load_from(&paths).unwrap();
        assert_eq!(config.port, 7777);
        assert_eq!(config.search_phrases, vec!["Bach Cantata"]);
        assert_eq!(config.daily_quota, 10_000);
    }

    #[test]
    fn load_with_invalid_toml_returns_error() {
        let (_dir, paths) = test_paths();
        std::fs::write(paths.config_path(), "not valid {{{{ toml").unwrap();
        assert!(CollectorConfig::load_from(&paths).is_err());
    }

    #[test]
    fn data_dir_override_wins() {
        let (_dir, paths) = test_paths();
        let mut config = CollectorConfig::default();
        config.set_paths(paths);
        config.data_dir = Some(PathBuf::from("/srv/ytscope"));
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/srv/ytscope"));
    }

    #[test]
    fn validate_rejects_port_zero() {
        let mut config = CollectorConfig::default();
        config.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_quota() {
        let mut config = CollectorConfig::default();
        config.daily_quota = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_phrases() {
        let mut config = CollectorConfig::default();
        config.search_phrases = vec!["  ".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_timezone() {
        let mut config = CollectorConfig::default();
        config.reset_timezone = "Mars/Olympus_Mons".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn api_key_is_never_serialized() {
        let mut config = CollectorConfig::default();
        config.api_key = Some("secret".to_string());
        let serialized = toml::to_string(&config).unwrap();
        assert!(!serialized.contains("secret"));
        let deserialized: CollectorConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.port, config.port);
        assert!(deserialized.api_key.is_none());
    }
}
