use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ys_collect::Collector;
use ys_config::CollectorConfig;
use ys_youtube::{
    ChannelItem, SearchOrder, SearchPage, VideoItem, YouTubeApi, YouTubeClient, YouTubeError,
};

/// Stands in for the client when no API key is configured, so the
/// dashboard and analytics still work.
struct MissingKeyApi;

#[async_trait]
impl YouTubeApi for MissingKeyApi {
    async fn search(
        &self,
        _query: &str,
        _max_results: u32,
        _page_token: Option<&str>,
        _order: SearchOrder,
    ) -> Result<SearchPage, YouTubeError> {
        Err(YouTubeError::MissingApiKey)
    }

    async fn videos(&self, _ids: &[String]) -> Result<Vec<VideoItem>, YouTubeError> {
        Err(YouTubeError::MissingApiKey)
    }

    async fn channels(&self, _ids: &[String]) -> Result<Vec<ChannelItem>, YouTubeError> {
        Err(YouTubeError::MissingApiKey)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: CollectorConfig,
    pub collector: Arc<Collector>,
    /// False when running without an API key; extraction endpoints refuse.
    pub api_ready: bool,
    pub version: &'static str,
}

impl AppState {
    pub fn new(config: CollectorConfig) -> anyhow::Result<Self> {
        match YouTubeClient::new(config.api_key.clone()) {
            Ok(client) => {
                let client = client
                    .with_base_url(config.api_base_url.clone())
                    .with_min_interval(Duration::from_millis(config.min_request_interval_ms));
                Self::with_api(config, Arc::new(client))
            }
            Err(YouTubeError::MissingApiKey) => {
                tracing::warn!(
                    "{} not set; extraction is disabled, analytics remain available",
                    ys_config::API_KEY_ENV
                );
                let mut state = Self::with_api(config, Arc::new(MissingKeyApi))?;
                state.api_ready = false;
                Ok(state)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn with_api(config: CollectorConfig, api: Arc<dyn YouTubeApi>) -> anyhow::Result<Self> {
        let collector = Arc::new(Collector::from_config(&config, api)?);
        Ok(Self {
            config,
            collector,
            api_ready: true,
            version: env!("CARGO_PKG_VERSION"),
        })
    }

    pub fn search_phrases(&self) -> Vec<String> {
        ys_collect::CollectOptions::from_config(&self.config).queries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ys_config::ConfigPaths;

    #[tokio::test]
    async fn missing_key_disables_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CollectorConfig::default();
        config.set_paths(ConfigPaths::with_base(dir.path().to_path_buf()));
        config.api_key = None;

        let state = AppState::new(config).unwrap();
        assert!(!state.api_ready);
        assert_eq!(state.search_phrases().len(), 17);
        assert_eq!(state.collector.data_dir(), dir.path().join("data"));
    }

    #[tokio::test]
    async fn configured_key_enables_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CollectorConfig::default();
        config.set_paths(ConfigPaths::with_base(dir.path().to_path_buf()));
        config.api_key = Some("key".into());

        let state = AppState::new(config).unwrap();
        assert!(state.api_ready);
    }
}
