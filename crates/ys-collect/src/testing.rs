use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ys_youtube::{
    ChannelItem, ChannelSnippet, ChannelStatistics, SearchItem, SearchItemId, SearchOrder,
    SearchPage, VideoItem, VideoSnippet, YouTubeApi, YouTubeError,
};

/// Scripted API: each query has a fixed number of results spread over
/// channels `UC0`..`UC2`; page tokens are result offsets.
#[derive(Default)]
pub(crate) struct FakeYouTube {
    pub results: HashMap<String, usize>,
    pub failing: HashSet<String>,
    /// Search calls after this many succeed with a quota error.
    pub quota_after_searches: Option<usize>,
    pub channel_quota_exceeded: bool,
    pub search_calls: AtomicUsize,
    pub channel_calls: AtomicUsize,
}

impl FakeYouTube {
    pub fn with_results(pairs: &[(&str, usize)]) -> Self {
        Self {
            results: pairs.iter().map(|(q, n)| (q.to_string(), *n)).collect(),
            ..Default::default()
        }
    }

    pub fn searches(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl YouTubeApi for FakeYouTube {
    async fn search(
        &self,
        query: &str,
        max_results: u32,
        page_token: Option<&str>,
        _order: SearchOrder,
    ) -> Result<SearchPage, YouTubeError> {
        let call = self.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.quota_after_searches.is_some_and(|limit| call >= limit) {
            return Err(YouTubeError::QuotaExceeded);
        }
        if self.failing.contains(query) {
            return Err(YouTubeError::Http {
                status: 500,
                reason: "backendError".into(),
                message: "backend error".into(),
            });
        }

        let total = self.results.get(query).copied().unwrap_or(0);
        let offset: usize = page_token.and_then(|t| t.parse().ok()).unwrap_or(0);
        let end = (offset + max_results as usize).min(total);
        let items = (offset..end)
            .map(|i| SearchItem {
                id: SearchItemId::Resource {
                    video_id: Some(format!("{query}-{i}")),
                },
                snippet: VideoSnippet {
                    title: format!("{query} #{i}"),
                    description: String::new(),
                    published_at: "2024-01-01T00:00:00Z".into(),
                    channel_title: format!("Channel {}", i % 3),
                    channel_id: format!("UC{}", i % 3),
                },
            })
            .collect();
        Ok(SearchPage {
            items,
            next_page_token: (end < total).then(|| end.to_string()),
        })
    }

    async fn videos(&self, ids: &[String]) -> Result<Vec<VideoItem>, YouTubeError> {
        Ok(ids
            .iter()
            .map(|id| VideoItem {
                id: id.clone(),
                ..Default::default()
            })
            .collect())
    }

    async fn channels(&self, ids: &[String]) -> Result<Vec<ChannelItem>, YouTubeError> {
        self.channel_calls.fetch_add(1, Ordering::SeqCst);
        if self.channel_quota_exceeded {
            return Err(YouTubeError::QuotaExceeded);
        }
        Ok(ids
            .iter()
            .map(|id| ChannelItem {
                id: id.clone(),
                snippet: ChannelSnippet {
                    title: format!("{id} title"),
                    country: "GB".into(),
                    ..Default::default()
                },
                statistics: ChannelStatistics {
                    subscriber_count: Some("100".into()),
                    ..Default::default()
                },
                ..Default::default()
            })
            .collect())
    }
}
