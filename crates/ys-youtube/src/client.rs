use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::YouTubeError;
use crate::types::{ChannelItem, ListResponse, SearchOrder, SearchPage, VideoItem};

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Largest page or id batch a single list call accepts.
pub const MAX_RESULTS_PER_CALL: usize = 50;

const VIDEO_PARTS: &str = "snippet,contentDetails,statistics";
const CHANNEL_PARTS: &str = "snippet,statistics,contentDetails,brandingSettings";

/// The three list calls the collector relies on. Quota accounting is the
/// caller's job; implementations only talk to the API.
#[async_trait]
pub trait YouTubeApi: Send + Sync {
    async fn search(
        &self,
        query: &str,
        max_results: u32,
        page_token: Option<&str>,
        order: SearchOrder,
    ) -> Result<SearchPage, YouTubeError>;

    /// Details for up to 50 videos; extra ids are ignored.
    async fn videos(&self, ids: &[String]) -> Result<Vec<VideoItem>, YouTubeError>;

    /// Details for up to 50 channels; extra ids are ignored.
    async fn channels(&self, ids: &[String]) -> Result<Vec<ChannelItem>, YouTubeError>;
}

pub struct YouTubeClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl YouTubeClient {
    pub fn new(api_key: Option<String>) -> Result<Self, YouTubeError> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(YouTubeError::MissingApiKey)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        tracing::info!("YouTube API client initialized");
        Ok(Self {
            http,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            min_interval: Duration::from_secs(1),
            last_request: Mutex::new(None),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, YouTubeError> {
        self.wait_for_rate_limit().await;

        let url = format!("{}/{}", self.base_url, endpoint);
        let resp = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            let err = YouTubeError::from_response(status.as_u16(), &body);
            if err.is_quota_exceeded() {
                tracing::error!("YouTube API quota exceeded");
            } else {
                tracing::error!("HTTP error calling {}: {}", endpoint, err);
            }
            return Err(err);
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn first_batch(ids: &[String]) -> String {
    ids.iter()
        .take(MAX_RESULTS_PER_CALL)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl YouTubeApi for YouTubeClient {
    async fn search(
        &self,
        query: &str,
        max_results: u32,
        page_token: Option<&str>,
        order: SearchOrder,
    ) -> Result<SearchPage, YouTubeError> {
        let max_results = max_results.clamp(1, MAX_RESULTS_PER_CALL as u32).to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("q", query),
            ("type", "video"),
            ("maxResults", max_results.as_str()),
            ("order", order.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let page: SearchPage = self.get("search", &params).await?;
        tracing::info!(
            "Search request completed: '{}' (results: {})",
            query,
            page.items.len()
        );
        Ok(page)
    }

    async fn videos(&self, ids: &[String]) -> Result<Vec<VideoItem>, YouTubeError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let id_list = first_batch(ids);
        let resp: ListResponse<VideoItem> = self
            .get("videos", &[("part", VIDEO_PARTS), ("id", id_list.as_str())])
            .await?;
        tracing::debug!("Video details fetched for {} ids", ids.len().min(50));
        Ok(resp.items)
    }

    async fn channels(&self, ids: &[String]) -> Result<Vec<ChannelItem>, YouTubeError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let id_list = first_batch(ids);
        let resp: ListResponse<ChannelItem> = self
            .get("channels", &[("part", CHANNEL_PARTS), ("id", id_list.as_str())])
            .await?;
        tracing::debug!("Channel details fetched for {} ids", ids.len().min(50));
        Ok(resp.items)
    }
}
