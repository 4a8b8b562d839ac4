use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ys_data::records::channel_url;
use ys_data::{ChannelRecord, VideoRecord};
use ys_quota::{QuotaManager, QuotaOperation};
use ys_youtube::{ChannelItem, SearchItem, SearchOrder, YouTubeApi, YouTubeError};

use crate::error::CollectError;

const PAGE_SIZE: usize = 50;
const CHANNEL_BATCH: usize = 50;

/// Why a paginated search stopped.
#[derive(Debug)]
pub enum SearchEnd {
    TargetReached,
    /// Empty page or no next-page token.
    Exhausted,
    /// The local budget cannot cover another search call.
    BudgetExhausted,
    Stopped,
    Failed(YouTubeError),
}

#[derive(Debug)]
pub struct SearchOutcome {
    pub videos: Vec<VideoRecord>,
    pub end: SearchEnd,
}

#[derive(Debug, Default)]
pub struct ChannelFetch {
    pub channels: Vec<ChannelRecord>,
    /// Set when batches were left unfetched for lack of quota.
    pub quota_exceeded: bool,
}

/// Search hit to record; hits without a video id are dropped.
pub fn video_record(item: &SearchItem) -> Option<VideoRecord> {
    let video_id = item.id.video_id();
    if video_id.is_empty() {
        return None;
    }
    let snippet = &item.snippet;
    Some(VideoRecord {
        video_id: video_id.to_string(),
        title: snippet.title.clone(),
        description: snippet.description.clone(),
        published_at: snippet.published_at.clone(),
        channel_title: snippet.channel_title.clone(),
        channel_id: snippet.channel_id.clone(),
    })
}

pub fn channel_record(item: &ChannelItem) -> ChannelRecord {
    let count = |value: &Option<String>| value.clone().unwrap_or_else(|| "0".to_string());
    let hidden = if item.statistics.hidden_subscriber_count {
        "True"
    } else {
        "False"
    };
    ChannelRecord {
        channel_id: item.id.clone(),
        title: item.snippet.title.clone(),
        description: item.snippet.description.clone(),
        published_at: item.snippet.published_at.clone(),
        country: item.snippet.country.clone(),
        custom_url: item.snippet.custom_url.clone(),
        view_count: count(&item.statistics.view_count),
        subscriber_count: count(&item.statistics.subscriber_count),
        video_count: count(&item.statistics.video_count),
        hidden_subscriber_count: hidden.to_string(),
        channel_url: channel_url(&item.id),
    }
}

/// Trimmed, non-empty channel ids, de-duplicated and sorted.
pub fn unique_channel_ids<'a>(videos: impl IntoIterator<Item = &'a VideoRecord>) -> Vec<String> {
    let mut count = 0;
    let ids: BTreeSet<String> = videos
        .into_iter()
        .inspect(|_| count += 1)
        .map(|v| v.channel_id.trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    tracing::info!(
        "Extracted {} unique channel IDs from {} videos",
        ids.len(),
        count
    );
    ids.into_iter().collect()
}

/// Drives the API for one run, charging every successful call to its own
/// quota budget.
pub struct Extractor {
    api: Arc<dyn YouTubeApi>,
    quota: QuotaManager,
    stop: Arc<AtomicBool>,
}

impl Extractor {
    pub fn new(api: Arc<dyn YouTubeApi>, quota: QuotaManager) -> Self {
        Self {
            api,
            quota,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn quota(&self) -> &QuotaManager {
        &self.quota
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Pages through search results until `max_videos` are collected or the
    /// results run out. Only a quota signal from the API is returned as an
    /// error; anything else ends the search with what was gathered.
    pub async fn search_videos(
        &mut self,
        query: &str,
        max_videos: usize,
        order: SearchOrder,
    ) -> Result<SearchOutcome, CollectError> {
        let mut videos = Vec::new();
        let mut page_token: Option<String> = None;

        tracing::info!(
            "Starting video search: '{}' (target: {} videos)",
            query,
            max_videos
        );

        let end = loop {
            if videos.len() >= max_videos {
                break SearchEnd::TargetReached;
            }
            if self.stop_requested() {
                tracing::info!("Stop requested during search for '{}'", query);
                break SearchEnd::Stopped;
            }
            if !self.quota.can_afford(QuotaOperation::Search) {
                tracing::warn!(
                    "Quota limit reached. Collected {} videos so far",
                    videos.len()
                );
                break SearchEnd::BudgetExhausted;
            }

            let request = (max_videos - videos.len()).min(PAGE_SIZE) as u32;
            let page = match self
                .api
                .search(query, request, page_token.as_deref(), order)
                .await
            {
                Ok(page) => page,
                Err(err) if err.is_quota_exceeded() => {
                    tracing::warn!("Quota exceeded while searching '{}'", query);
                    return Err(CollectError::QuotaExceeded);
                }
                Err(err) => {
                    tracing::error!("Error during video search for '{}': {}", query, err);
                    break SearchEnd::Failed(err);
                }
            };
            self.quota.record(QuotaOperation::Search);

            if page.items.is_empty() {
                break SearchEnd::Exhausted;
            }
            videos.extend(page.items.iter().filter_map(video_record));
            tracing::info!(
                "Progress: {}/{} videos collected for '{}'",
                videos.len(),
                max_videos,
                query
            );

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break SearchEnd::Exhausted,
            }
        };

        videos.truncate(max_videos);
        tracing::info!(
            "Completed search for '{}': {} videos collected",
            query,
            videos.len()
        );
        Ok(SearchOutcome { videos, end })
    }

    /// Fetches channel details in batches of 50. A quota signal stops the
    /// fetch; other batch failures are logged and skipped.
    pub async fn fetch_channels(&mut self, ids: &[String]) -> ChannelFetch {
        let mut fetch = ChannelFetch::default();
        if ids.is_empty() {
            return fetch;
        }

        let total_batches = ids.len().div_ceil(CHANNEL_BATCH);
        tracing::info!(
            "Fetching details for {} channels in {} batches",
            ids.len(),
            total_batches
        );

        for (index, batch) in ids.chunks(CHANNEL_BATCH).enumerate() {
            if !self.quota.can_afford(QuotaOperation::Channels) {
                tracing::warn!(
                    "Quota limit reached. Collected {} channel details so far",
                    fetch.channels.len()
                );
                fetch.quota_exceeded = true;
                break;
            }

            match self.api.channels(batch).await {
                Ok(items) => {
                    self.quota.record(QuotaOperation::Channels);
                    fetch.channels.extend(items.iter().map(channel_record));
                    tracing::info!(
                        "Batch {}/{} complete: {} channels fetched ({} total)",
                        index + 1,
                        total_batches,
                        items.len(),
                        fetch.channels.len()
                    );
                }
                Err(err) if err.is_quota_exceeded() => {
                    tracing::warn!("Quota exceeded. Stopping channel collection");
                    fetch.quota_exceeded = true;
                    break;
                }
                Err(err) => {
                    tracing::error!("Error fetching channel batch {}: {}", index + 1, err);
                }
            }
        }

        tracing::info!(
            "Channel data collection complete: {} channels collected",
            fetch.channels.len()
        );
        fetch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeYouTube;
    use ys_youtube::{ChannelStatistics, SearchItemId, VideoSnippet};

    fn extractor(api: FakeYouTube, limit: u32) -> (Arc<FakeYouTube>, Extractor) {
        let api = Arc::new(api);
        let extractor = Extractor::new(api.clone(), QuotaManager::new(limit));
        (api, extractor)
    }

    #[tokio::test]
    async fn search_stops_at_target() {
        let (api, mut ex) = extractor(FakeYouTube::with_results(&[("Vivaldi Gloria", 500)]), 10_000);
        let outcome = ex
            .search_videos("Vivaldi Gloria", 120, SearchOrder::Date)
            .await
            .unwrap();
        assert_eq!(outcome.videos.len(), 120);
        assert!(matches!(outcome.end, SearchEnd::TargetReached));
        // 50 + 50 + 20
        assert_eq!(api.searches(), 3);
        assert_eq!(ex.quota().used(), 300);
    }

    #[tokio::test]
    async fn search_stops_when_results_run_out() {
        let (_, mut ex) = extractor(FakeYouTube::with_results(&[("Schubert Mass", 70)]), 10_000);
        let outcome = ex
            .search_videos("Schubert Mass", 2000, SearchOrder::Date)
            .await
            .unwrap();
        assert_eq!(outcome.videos.len(), 70);
        assert!(matches!(outcome.end, SearchEnd::Exhausted));
    }

    #[tokio::test]
    async fn search_respects_local_budget() {
        let (api, mut ex) = extractor(FakeYouTube::with_results(&[("Haydn", 500)]), 250);
        let outcome = ex.search_videos("Haydn", 500, SearchOrder::Date).await.unwrap();
        assert_eq!(outcome.videos.len(), 100);
        assert!(matches!(outcome.end, SearchEnd::BudgetExhausted));
        assert_eq!(api.searches(), 2);
    }

    #[tokio::test]
    async fn search_propagates_quota_signal() {
        let api = FakeYouTube {
            quota_after_searches: Some(1),
            ..FakeYouTube::with_results(&[("Bach", 500)])
        };
        let (_, mut ex) = extractor(api, 10_000);
        let err = ex.search_videos("Bach", 500, SearchOrder::Date).await.unwrap_err();
        assert!(matches!(err, CollectError::QuotaExceeded));
    }

    #[tokio::test]
    async fn search_reports_other_failures() {
        let mut api = FakeYouTube::with_results(&[("Bach", 10)]);
        api.failing.insert("Bach".into());
        let (_, mut ex) = extractor(api, 10_000);
        let outcome = ex.search_videos("Bach", 10, SearchOrder::Date).await.unwrap();
        assert!(outcome.videos.is_empty());
        assert!(matches!(outcome.end, SearchEnd::Failed(_)));
        assert_eq!(ex.quota().used(), 0);
    }

    #[tokio::test]
    async fn search_honours_stop_flag() {
        let (api, ex) = extractor(FakeYouTube::with_results(&[("Bach", 10)]), 10_000);
        let stop = Arc::new(AtomicBool::new(true));
        let mut ex = ex.with_stop_flag(stop);
        let outcome = ex.search_videos("Bach", 10, SearchOrder::Date).await.unwrap();
        assert!(matches!(outcome.end, SearchEnd::Stopped));
        assert_eq!(api.searches(), 0);
    }

    #[tokio::test]
    async fn channels_fetched_in_batches() {
        let (api, mut ex) = extractor(FakeYouTube::default(), 10_000);
        let ids: Vec<String> = (0..120).map(|i| format!("UC{i}")).collect();
        let fetch = ex.fetch_channels(&ids).await;
        assert_eq!(fetch.channels.len(), 120);
        assert!(!fetch.quota_exceeded);
        assert_eq!(api.channel_calls.load(Ordering::SeqCst), 3);
        assert_eq!(ex.quota().used(), 3);
    }

    #[tokio::test]
    async fn channel_quota_signal_stops_fetch() {
        let api = FakeYouTube {
            channel_quota_exceeded: true,
            ..Default::default()
        };
        let (api, mut ex) = extractor(api, 10_000);
        let ids: Vec<String> = (0..120).map(|i| format!("UC{i}")).collect();
        let fetch = ex.fetch_channels(&ids).await;
        assert!(fetch.channels.is_empty());
        assert!(fetch.quota_exceeded);
        assert_eq!(api.channel_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unique_ids_are_trimmed_and_sorted() {
        let videos: Vec<VideoRecord> = ["UC2", " UC1 ", "", "UC2", "UC3"]
            .iter()
            .map(|id| VideoRecord {
                channel_id: id.to_string(),
                ..Default::default()
            })
            .collect();
        assert_eq!(unique_channel_ids(&videos), vec!["UC1", "UC2", "UC3"]);
    }

    #[test]
    fn search_items_without_id_are_dropped() {
        let item = SearchItem {
            id: SearchItemId::Resource { video_id: None },
            snippet: VideoSnippet::default(),
        };
        assert!(video_record(&item).is_none());

        let item = SearchItem {
            id: SearchItemId::Plain("abc".into()),
            snippet: VideoSnippet {
                channel_id: "UC1".into(),
                ..Default::default()
            },
        };
        let record = video_record(&item).unwrap();
        assert_eq!(record.video_id, "abc");
        assert_eq!(record.channel_id, "UC1");
    }

    #[test]
    fn channel_record_defaults_missing_statistics() {
        let item = ChannelItem {
            id: "UC9".into(),
            statistics: ChannelStatistics {
                view_count: Some("42".into()),
                hidden_subscriber_count: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let record = channel_record(&item);
        assert_eq!(record.view_count, "42");
        assert_eq!(record.subscriber_count, "0");
        assert_eq!(record.video_count, "0");
        assert_eq!(record.hidden_subscriber_count, "True");
        assert_eq!(record.channel_url, "https://www.youtube.com/channel/UC9");
    }
}
