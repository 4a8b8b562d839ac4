//! Reports over the latest exports.
//!
//! Every struct here serializes to JSON with finite numbers only; counts
//! are parsed through [`sanitize`](crate::sanitize) when the analyzer is
//! built, and missing values are omitted or empty rather than `null`.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::error::DataError;
use crate::export::file_timestamp;
use crate::load::Dataset;
use crate::records::{ChannelRecord, VideoRow};
use crate::sanitize::{clean_text, finite, parse_count, ratio};
use crate::table::contains_ci;

const RANKING_SIZE: usize = 20;

#[derive(Debug, Clone)]
struct ParsedChannel {
    channel_id: String,
    title: String,
    country: String,
    channel_url: String,
    subscribers: u64,
    views: u64,
    videos: u64,
}

impl ParsedChannel {
    fn from_record(record: &ChannelRecord) -> Self {
        Self {
            channel_id: clean_text(&record.channel_id),
            title: clean_text(&record.title),
            country: clean_text(&record.country),
            channel_url: clean_text(&record.channel_url),
            subscribers: as_count(&record.subscriber_count),
            views: as_count(&record.view_count),
            videos: as_count(&record.video_count),
        }
    }
}

fn as_count(raw: &str) -> u64 {
    parse_count(raw).max(0.0).round() as u64
}

/// Counts like `"1e30"` clamp to `u64::MAX`, so totals must not wrap.
fn saturating_total(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

/// Accepts RFC3339 plus the date-only and space-separated forms spreadsheets
/// tend to write back.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `(key, count)` pairs, largest count first, ties by key.
fn ranked_counts<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for key in keys.filter(|k| !k.is_empty()) {
        *counts.entry(key).or_default() += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DateRange {
    pub earliest: String,
    pub latest: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Overview {
    pub total_videos: usize,
    pub total_channels: usize,
    pub search_queries: usize,
    pub date_range: DateRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_views: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_subscribers: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_subscribers_per_channel: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryStats {
    pub query: String,
    pub video_count: usize,
    pub unique_channels: usize,
    pub avg_videos_per_channel: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedChannel {
    pub channel_id: String,
    pub title: String,
    pub subscriber_count: u64,
    pub view_count: u64,
    pub video_count: u64,
    pub country: String,
    pub channel_url: String,
}

impl From<&ParsedChannel> for RankedChannel {
    fn from(c: &ParsedChannel) -> Self {
        Self {
            channel_id: c.channel_id.clone(),
            title: c.title.clone(),
            subscriber_count: c.subscribers,
            view_count: c.views,
            video_count: c.videos,
            country: c.country.clone(),
            channel_url: c.channel_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CountryStats {
    pub country: String,
    pub channel_count: usize,
    pub total_subscribers: u64,
    pub total_views: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Rankings {
    pub most_subscribed: Vec<RankedChannel>,
    pub least_subscribed: Vec<RankedChannel>,
    pub most_viewed: Vec<RankedChannel>,
    pub least_viewed: Vec<RankedChannel>,
    pub most_videos: Vec<RankedChannel>,
    pub by_country: Vec<CountryStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Temporal {
    pub by_year: BTreeMap<i32, usize>,
    /// Last 24 months that have uploads, keyed `YYYY-MM`.
    pub by_month: BTreeMap<String, usize>,
    /// Uploads in the last 30 days, per search phrase.
    pub recent_uploads: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Spread {
    pub mean: f64,
    pub median: f64,
    pub max: usize,
    pub min: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Distribution {
    pub videos_per_channel: Spread,
    pub top_contributors: Vec<NamedCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_country: Option<Vec<NamedCount>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Reach {
    pub views: u64,
    pub subscribers: u64,
    pub videos: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngagedChannel {
    pub title: String,
    pub views_per_video: f64,
    pub subscriber_count: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Engagement {
    pub avg_views_per_video: f64,
    pub avg_views_per_subscriber: f64,
    pub total_reach: Reach,
    pub top_engagement_channels: Vec<EngagedChannel>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SpanRange {
    pub earliest: String,
    pub latest: String,
    pub span_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryCount {
    pub query: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelVideoCount {
    pub channel: String,
    pub video_count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VideoStatistics {
    pub total_videos: usize,
    pub unique_channels: usize,
    pub unique_queries: usize,
    pub date_range: SpanRange,
    pub videos_by_year: BTreeMap<i32, usize>,
    pub top_queries: Vec<QueryCount>,
    pub top_channels_by_video_count: Vec<ChannelVideoCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub overview: Overview,
    pub query_stats: Vec<QueryStats>,
    pub top_channels: Vec<RankedChannel>,
    pub temporal: Temporal,
    pub distribution: Distribution,
    pub engagement: Engagement,
    pub generated_at: String,
}

pub struct Analyzer {
    videos: Option<Vec<VideoRow>>,
    channels: Option<Vec<ParsedChannel>>,
}

impl Analyzer {
    pub fn new(dataset: Dataset) -> Self {
        let videos = dataset
            .videos
            .map(|rows| rows.iter().map(VideoRow::cleaned).collect());
        let channels = dataset
            .channels
            .map(|rows| rows.iter().map(ParsedChannel::from_record).collect());
        Self { videos, channels }
    }

    /// Loads the newest exports from `dir`.
    pub fn load(dir: &Path) -> Result<Self, DataError> {
        Ok(Self::new(Dataset::load_latest(dir)?))
    }

    fn videos(&self) -> &[VideoRow] {
        self.videos.as_deref().unwrap_or(&[])
    }

    fn unique<'a>(values: impl Iterator<Item = &'a str>) -> usize {
        values.filter(|v| !v.is_empty()).collect::<HashSet<_>>().len()
    }

    fn published_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let mut dates = self.videos().iter().filter_map(|v| parse_published(&v.published_at));
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    pub fn overview(&self) -> Overview {
        let videos = self.videos();
        let unique_channels = Self::unique(videos.iter().map(|v| v.channel_id.as_str()));
        let total_channels = match &self.channels {
            Some(channels) if !channels.is_empty() => channels.len(),
            _ => unique_channels,
        };

        let date_range = self
            .published_range()
            .map(|(lo, hi)| DateRange {
                earliest: lo.to_rfc3339(),
                latest: hi.to_rfc3339(),
            })
            .unwrap_or_default();

        let mut overview = Overview {
            total_videos: videos.len(),
            total_channels,
            search_queries: Self::unique(videos.iter().map(|v| v.search_query.as_str())),
            date_range,
            ..Default::default()
        };

        if let Some(channels) = &self.channels {
            let subscribers = saturating_total(channels.iter().map(|c| c.subscribers));
            overview.total_views = Some(saturating_total(channels.iter().map(|c| c.views)));
            overview.total_subscribers = Some(subscribers);
            overview.avg_subscribers_per_channel =
                Some(ratio(subscribers as f64, channels.len() as f64));
        }
        overview
    }

    pub fn query_statistics(&self) -> Vec<QueryStats> {
        let mut by_query: BTreeMap<&str, Vec<&VideoRow>> = BTreeMap::new();
        for video in self.videos().iter().filter(|v| !v.search_query.is_empty()) {
            by_query.entry(&video.search_query).or_default().push(video);
        }

        let mut stats: Vec<QueryStats> = by_query
            .into_iter()
            .map(|(query, videos)| {
                let unique_channels = Self::unique(videos.iter().map(|v| v.channel_id.as_str()));
                QueryStats {
                    query: query.to_string(),
                    video_count: videos.len(),
                    unique_channels,
                    avg_videos_per_channel: ratio(videos.len() as f64, unique_channels as f64),
                }
            })
            .collect();
        stats.sort_by(|a, b| b.video_count.cmp(&a.video_count));
        stats
    }

    fn channels_sorted_by(
        &self,
        key: impl Fn(&ParsedChannel) -> u64,
        descending: bool,
        positive_only: bool,
        limit: usize,
    ) -> Vec<RankedChannel> {
        let Some(channels) = &self.channels else {
            return Vec::new();
        };
        let mut selected: Vec<&ParsedChannel> = channels
            .iter()
            .filter(|c| !positive_only || key(*c) > 0)
            .collect();
        // Stable sort keeps file order among equal values.
        selected.sort_by(|a, b| {
            let ord = key(*a).cmp(&key(*b));
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });
        selected.into_iter().take(limit).map(RankedChannel::from).collect()
    }

    pub fn top_channels(&self, limit: usize) -> Vec<RankedChannel> {
        self.channels_sorted_by(|c| c.subscribers, true, false, limit)
    }

    pub fn channel_rankings(&self) -> Rankings {
        let Some(channels) = &self.channels else {
            return Rankings::default();
        };

        let mut countries: HashMap<&str, CountryStats> = HashMap::new();
        for channel in channels {
            let entry = countries
                .entry(channel.country.as_str())
                .or_insert_with(|| CountryStats {
                    country: channel.country.clone(),
                    channel_count: 0,
                    total_subscribers: 0,
                    total_views: 0,
                });
            entry.channel_count += 1;
            entry.total_subscribers = entry.total_subscribers.saturating_add(channel.subscribers);
            entry.total_views = entry.total_views.saturating_add(channel.views);
        }
        let mut by_country: Vec<CountryStats> = countries.into_values().collect();
        by_country.sort_by(|a, b| {
            b.channel_count
                .cmp(&a.channel_count)
                .then_with(|| a.country.cmp(&b.country))
        });
        by_country.truncate(RANKING_SIZE);

        Rankings {
            most_subscribed: self.channels_sorted_by(|c| c.subscribers, true, false, RANKING_SIZE),
            least_subscribed: self.channels_sorted_by(|c| c.subscribers, false, true, RANKING_SIZE),
            most_viewed: self.channels_sorted_by(|c| c.views, true, false, RANKING_SIZE),
            least_viewed: self.channels_sorted_by(|c| c.views, false, true, RANKING_SIZE),
            most_videos: self.channels_sorted_by(|c| c.videos, true, false, RANKING_SIZE),
            by_country,
        }
    }

    pub fn temporal_distribution(&self, now: DateTime<Utc>) -> Temporal {
        let mut temporal = Temporal::default();
        let cutoff = now - Duration::days(30);
        let mut by_month: BTreeMap<String, usize> = BTreeMap::new();

        for video in self.videos() {
            let Some(published) = parse_published(&video.published_at) else {
                continue;
            };
            *temporal.by_year.entry(published.year()).or_default() += 1;
            *by_month
                .entry(format!("{:04}-{:02}", published.year(), published.month()))
                .or_default() += 1;
            if published > cutoff && !video.search_query.is_empty() {
                *temporal
                    .recent_uploads
                    .entry(video.search_query.clone())
                    .or_default() += 1;
            }
        }

        let skip = by_month.len().saturating_sub(24);
        temporal.by_month = by_month.into_iter().skip(skip).collect();
        temporal
    }

    pub fn channel_distribution(&self) -> Distribution {
        let videos = self.videos();
        let mut per_channel: Vec<usize> = ranked_counts(videos.iter().map(|v| v.channel_id.as_str()))
            .into_iter()
            .map(|(_, count)| count)
            .collect();
        per_channel.sort_unstable();

        let videos_per_channel = if per_channel.is_empty() {
            Spread::default()
        } else {
            let n = per_channel.len();
            let median = if n % 2 == 1 {
                per_channel[n / 2] as f64
            } else {
                (per_channel[n / 2 - 1] + per_channel[n / 2]) as f64 / 2.0
            };
            Spread {
                mean: finite(per_channel.iter().sum::<usize>() as f64 / n as f64),
                median,
                max: per_channel[n - 1],
                min: per_channel[0],
            }
        };

        let top_contributors = ranked_counts(videos.iter().map(|v| v.channel_title.as_str()))
            .into_iter()
            .take(10)
            .map(|(name, count)| NamedCount { name, count })
            .collect();

        let by_country = self.channels.as_ref().map(|channels| {
            ranked_counts(channels.iter().map(|c| c.country.as_str()))
                .into_iter()
                .take(10)
                .map(|(name, count)| NamedCount { name, count })
                .collect()
        });

        Distribution {
            videos_per_channel,
            top_contributors,
            by_country,
        }
    }

    /// Case-insensitive filter: `query` against title or description,
    /// `channel` against the channel title.
    pub fn search_videos(&self, query: &str, channel: &str, limit: usize) -> Vec<VideoRow> {
        let query = query.trim().to_lowercase();
        let channel = channel.trim().to_lowercase();
        self.videos()
            .iter()
            .filter(|v| {
                query.is_empty()
                    || contains_ci(&v.title, &query)
                    || contains_ci(&v.description, &query)
            })
            .filter(|v| channel.is_empty() || contains_ci(&v.channel_title, &channel))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn engagement(&self) -> Engagement {
        let Some(channels) = &self.channels else {
            return Engagement::default();
        };
        if channels.is_empty() {
            return Engagement::default();
        }

        let per_video: Vec<f64> = channels
            .iter()
            .map(|c| ratio(c.views as f64, c.videos as f64))
            .collect();
        let per_subscriber: Vec<f64> = channels
            .iter()
            .map(|c| ratio(c.views as f64, c.subscribers as f64))
            .collect();
        let n = channels.len() as f64;

        let mut ranked: Vec<(usize, f64)> = per_video.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        Engagement {
            avg_views_per_video: finite(per_video.iter().sum::<f64>() / n),
            avg_views_per_subscriber: finite(per_subscriber.iter().sum::<f64>() / n),
            total_reach: Reach {
                views: saturating_total(channels.iter().map(|c| c.views)),
                subscribers: saturating_total(channels.iter().map(|c| c.subscribers)),
                videos: saturating_total(channels.iter().map(|c| c.videos)),
            },
            top_engagement_channels: ranked
                .into_iter()
                .take(10)
                .map(|(i, views_per_video)| EngagedChannel {
                    title: channels[i].title.clone(),
                    views_per_video,
                    subscriber_count: channels[i].subscribers,
                })
                .collect(),
        }
    }

    pub fn video_statistics(&self) -> VideoStatistics {
        let videos = self.videos();
        if self.videos.is_none() {
            return VideoStatistics::default();
        }

        let date_range = self
            .published_range()
            .map(|(lo, hi)| SpanRange {
                earliest: lo.to_rfc3339(),
                latest: hi.to_rfc3339(),
                span_days: (hi - lo).num_days(),
            })
            .unwrap_or_default();

        let mut videos_by_year = BTreeMap::new();
        for published in videos.iter().filter_map(|v| parse_published(&v.published_at)) {
            *videos_by_year.entry(published.year()).or_default() += 1;
        }

        VideoStatistics {
            total_videos: videos.len(),
            unique_channels: Self::unique(videos.iter().map(|v| v.channel_id.as_str())),
            unique_queries: Self::unique(videos.iter().map(|v| v.search_query.as_str())),
            date_range,
            videos_by_year,
            top_queries: ranked_counts(videos.iter().map(|v| v.search_query.as_str()))
                .into_iter()
                .take(RANKING_SIZE)
                .map(|(query, count)| QueryCount { query, count })
                .collect(),
            top_channels_by_video_count: ranked_counts(
                videos.iter().map(|v| v.channel_title.as_str()),
            )
            .into_iter()
            .take(RANKING_SIZE)
            .map(|(channel, video_count)| ChannelVideoCount {
                channel,
                video_count,
            })
            .collect(),
        }
    }

    pub fn summary_report(&self, now: DateTime<Utc>) -> SummaryReport {
        SummaryReport {
            overview: self.overview(),
            query_stats: self.query_statistics(),
            top_channels: self.top_channels(10),
            temporal: self.temporal_distribution(now),
            distribution: self.channel_distribution(),
            engagement: self.engagement(),
            generated_at: now.to_rfc3339(),
        }
    }

    /// Writes the summary report as `analysis_report_{stamp}.json` in `dir`.
    pub fn export_report(&self, dir: &Path, now: DateTime<Local>) -> Result<PathBuf, DataError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("analysis_report_{}.json", file_timestamp(now)));
        let report = self.summary_report(now.with_timezone(&Utc));
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        tracing::info!("Analysis report exported to: {}", path.display());
        Ok(path)
    }
}
