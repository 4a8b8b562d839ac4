use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use ys_config::CollectorConfig;
use ys_data::{
    file_timestamp, ChannelRecord, ExportedFiles, Exporter, QuotaSummary, VideoRecord,
};
use ys_quota::{next_reset_after, QuotaManager, QuotaOperation, QuotaResetInfo, QuotaUsage};
use ys_youtube::{SearchOrder, YouTubeApi};

use crate::checkpoint::{Checkpoint, CheckpointProgress};
use crate::error::CollectError;
use crate::extract::{unique_channel_ids, Extractor, SearchEnd};
use crate::status::StatusHandle;

/// Parameters of one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectOptions {
    pub queries: Vec<String>,
    pub videos_per_query: u32,
    pub daily_quota: u32,
    #[serde(default)]
    pub order: SearchOrder,
}

impl CollectOptions {
    pub fn from_config(config: &CollectorConfig) -> Self {
        Self {
            queries: config
                .search_phrases
                .iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            videos_per_query: config.videos_per_query,
            daily_quota: config.daily_quota,
            order: SearchOrder::Date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    QuotaExceeded,
    Stopped,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total_queries: usize,
    pub completed_queries: usize,
    pub videos_collected: usize,
    pub channels_collected: usize,
    pub quota: QuotaUsage,
    pub halted: Option<HaltReason>,
    pub exported: ExportedFiles,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomQueryResult {
    pub query: String,
    pub videos: Vec<VideoRecord>,
    pub channels: Vec<ChannelRecord>,
    pub video_count: usize,
    pub channel_count: usize,
    pub quota_used: u32,
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((done * 100) / total).min(100) as u8
}

/// Runs the multi-query extraction against a checkpoint and publishes its
/// progress through a [`StatusHandle`].
pub struct Collector {
    api: Arc<dyn YouTubeApi>,
    data_dir: PathBuf,
    checkpoint_path: PathBuf,
    reset_tz: Tz,
    daily_quota: u32,
    status: StatusHandle,
}

impl Collector {
    pub fn new(
        api: Arc<dyn YouTubeApi>,
        data_dir: PathBuf,
        checkpoint_path: PathBuf,
        reset_tz: Tz,
        daily_quota: u32,
    ) -> Self {
        Self {
            api,
            data_dir,
            checkpoint_path,
            reset_tz,
            daily_quota,
            status: StatusHandle::new(daily_quota),
        }
    }

    pub fn from_config(config: &CollectorConfig, api: Arc<dyn YouTubeApi>) -> anyhow::Result<Self> {
        Ok(Self::new(
            api,
            config.data_dir()?,
            config.checkpoint_path()?,
            config.reset_tz()?,
            config.daily_quota,
        ))
    }

    pub fn status(&self) -> &StatusHandle {
        &self.status
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    pub fn reset_info(&self) -> QuotaResetInfo {
        next_reset_after(Utc::now(), self.reset_tz)
    }

    pub fn request_stop(&self) {
        tracing::info!("Extraction stop requested");
        self.status.request_stop();
    }

    pub fn progress(&self, queries: &[String]) -> CheckpointProgress {
        Checkpoint::load(&self.checkpoint_path).progress(queries)
    }

    /// Claims the running slot for a new run.
    pub async fn begin(&self, options: &CollectOptions) -> Result<(), CollectError> {
        if self
            .status
            .try_begin(options.queries.len(), options.daily_quota)
            .await
        {
            Ok(())
        } else {
            Err(CollectError::AlreadyRunning)
        }
    }

    pub async fn run(&self, options: CollectOptions) -> Result<RunSummary, CollectError> {
        self.begin(&options).await?;
        Ok(self.execute(options).await)
    }

    /// Body of a run claimed with [`Collector::begin`]. Always leaves the
    /// status record marked as not running.
    pub async fn execute(&self, options: CollectOptions) -> RunSummary {
        let mut extractor = Extractor::new(self.api.clone(), QuotaManager::new(options.daily_quota))
            .with_stop_flag(self.status.stop_flag());
        let mut summary = RunSummary {
            total_queries: options.queries.len(),
            completed_queries: 0,
            videos_collected: 0,
            channels_collected: 0,
            quota: extractor.quota().usage(),
            halted: None,
            exported: ExportedFiles::default(),
        };

        if let Err(err) = self.collect(&options, &mut extractor, &mut summary).await {
            tracing::error!("Fatal error in extraction task: {}", err);
            self.status.push_error(format!("Fatal error: {}", err)).await;
        }

        summary.quota = extractor.quota().usage();
        let quota_used = summary.quota.used;
        self.status
            .update(|s| {
                s.is_running = false;
                s.progress = 100;
                s.current_query = None;
                s.quota_used = quota_used;
            })
            .await;
        tracing::info!(
            "Extraction finished: {}/{} queries, {} videos, {} channels, quota {}/{}",
            summary.completed_queries,
            summary.total_queries,
            summary.videos_collected,
            summary.channels_collected,
            summary.quota.used,
            summary.quota.limit
        );
        summary
    }

    async fn collect(
        &self,
        options: &CollectOptions,
        extractor: &mut Extractor,
        summary: &mut RunSummary,
    ) -> Result<(), CollectError> {
        let total = options.queries.len();
        let mut checkpoint = Checkpoint::load(&self.checkpoint_path);
        let remaining = checkpoint.remaining(&options.queries);

        let completed = checkpoint.completed_queries.clone();
        let videos = checkpoint.video_count();
        self.status
            .update(|s| {
                s.completed_queries = completed;
                s.videos_collected = videos;
            })
            .await;
        tracing::info!(
            "Processing {} remaining queries of {}",
            remaining.len(),
            total
        );

        for query in &remaining {
            if self.status.stop_requested() {
                summary.halted = Some(HaltReason::Stopped);
                break;
            }

            let done = options
                .queries
                .iter()
                .filter(|q| checkpoint.is_completed(q))
                .count();
            let quota_used = extractor.quota().used();
            self.status
                .update(|s| {
                    s.current_query = Some(query.clone());
                    s.progress = percent(done, total);
                    s.quota_used = quota_used;
                })
                .await;

            if !extractor.quota().can_afford(QuotaOperation::Search) {
                tracing::warn!(
                    "Insufficient quota for '{}': {}/{} used",
                    query,
                    quota_used,
                    options.daily_quota
                );
                self.halt_on_quota(&mut checkpoint, "daily budget exhausted")
                    .await;
                summary.halted = Some(HaltReason::QuotaExceeded);
                break;
            }

            match extractor
                .search_videos(query, options.videos_per_query as usize, options.order)
                .await
            {
                Ok(outcome) => match outcome.end {
                    SearchEnd::Stopped => {
                        summary.halted = Some(HaltReason::Stopped);
                        break;
                    }
                    SearchEnd::Failed(err) => {
                        self.status
                            .push_error(format!("Error with query '{}': {}", query, err))
                            .await;
                    }
                    SearchEnd::BudgetExhausted => {
                        // Partial results are discarded; the query reruns after the reset.
                        tracing::warn!(
                            "Budget ran out mid-query for '{}'; {} videos discarded",
                            query,
                            outcome.videos.len()
                        );
                        self.halt_on_quota(&mut checkpoint, "daily budget exhausted")
                            .await;
                        summary.halted = Some(HaltReason::QuotaExceeded);
                        break;
                    }
                    SearchEnd::TargetReached | SearchEnd::Exhausted => {
                        let count = outcome.videos.len();
                        checkpoint.record(query, outcome.videos);
                        if let Err(err) = checkpoint.save(&self.checkpoint_path) {
                            tracing::error!("Failed to save progress: {}", err);
                            self.status
                                .push_error(format!("Failed to save progress: {}", err))
                                .await;
                        }
                        let completed = checkpoint.completed_queries.clone();
                        let videos = checkpoint.video_count();
                        let quota_used = extractor.quota().used();
                        self.status
                            .update(|s| {
                                s.completed_queries = completed;
                                s.videos_collected = videos;
                                s.quota_used = quota_used;
                            })
                            .await;
                        tracing::info!("Query '{}' complete: {} videos collected", query, count);
                    }
                },
                Err(CollectError::QuotaExceeded) => {
                    self.halt_on_quota(&mut checkpoint, "the API reported the daily limit")
                        .await;
                    summary.halted = Some(HaltReason::QuotaExceeded);
                    break;
                }
                Err(err) => {
                    tracing::error!("Error extracting videos for '{}': {}", query, err);
                    self.status
                        .push_error(format!("Error with query '{}': {}", query, err))
                        .await;
                }
            }

            tokio::task::yield_now().await;
        }

        summary.completed_queries = options
            .queries
            .iter()
            .filter(|q| checkpoint.is_completed(q))
            .count();
        summary.videos_collected = checkpoint.video_count();

        if summary.halted.is_some() || checkpoint.video_data.is_empty() {
            return Ok(());
        }

        self.status
            .update(|s| s.current_query = Some("Collecting channel data...".to_string()))
            .await;
        let ids = unique_channel_ids(checkpoint.video_data.values().flatten());
        let fetch = extractor.fetch_channels(&ids).await;
        summary.channels_collected = fetch.channels.len();

        let channels = fetch.channels.len();
        let quota_used = extractor.quota().used();
        self.status
            .update(|s| {
                s.channels_collected = channels;
                s.quota_used = quota_used;
            })
            .await;
        if fetch.quota_exceeded {
            self.halt_on_quota(&mut checkpoint, "channel collection incomplete")
                .await;
            summary.halted = Some(HaltReason::QuotaExceeded);
        }

        let now = Local::now();
        let stamp = file_timestamp(now);
        let exporter = Exporter::new(self.data_dir.clone())?;
        summary.exported.videos =
            exporter.export_query_videos(&checkpoint.video_data, None, &stamp)?;
        summary.exported.channels = exporter.export_channels(&fetch.channels, None, &stamp)?;
        summary.exported.per_query =
            exporter.export_separate_query_csvs(&checkpoint.video_data, "videos", &stamp)?;

        let usage = extractor.quota().usage();
        summary.exported.summary = Some(exporter.export_summary_report(
            &checkpoint.video_data,
            fetch.channels.len(),
            QuotaSummary {
                used: usage.used,
                limit: usage.limit,
                remaining: usage.remaining,
                requests: usage.requests,
            },
            now,
        )?);

        let all_done = options.queries.iter().all(|q| checkpoint.is_completed(q));
        if all_done && !fetch.quota_exceeded {
            Checkpoint::remove(&self.checkpoint_path)?;
        }
        Ok(())
    }

    async fn halt_on_quota(&self, checkpoint: &mut Checkpoint, detail: &str) {
        if let Err(err) = checkpoint.save(&self.checkpoint_path) {
            tracing::error!("Failed to save progress: {}", err);
        }
        let reset = self.reset_info();
        let completed = checkpoint.completed_queries.len();
        tracing::warn!(
            "Quota exceeded ({}); resets in {} at {}",
            detail,
            reset.formatted,
            reset.reset_time
        );

        let detail = detail.to_string();
        self.status
            .update(move |s| {
                s.quota_exceeded = true;
                s.quota_reset_at = Some(reset.reset_time.clone());
                s.errors.push(format!("Quota exceeded: {}", detail));
                s.errors.push(format!(
                    "Extracted {} queries before the limit",
                    completed
                ));
                s.errors.push(format!(
                    "Quota resets at {} (in {})",
                    reset.reset_time, reset.formatted
                ));
                s.errors
                    .push("Resume extraction after the reset; progress is saved".to_string());
            })
            .await;
    }

    /// One search plus channel lookup on a fresh quota budget. Nothing is
    /// written to disk.
    pub async fn custom_query(
        &self,
        query: &str,
        max_videos: usize,
    ) -> Result<CustomQueryResult, CollectError> {
        let mut extractor = Extractor::new(self.api.clone(), QuotaManager::new(self.daily_quota));
        let outcome = extractor
            .search_videos(query, max_videos, SearchOrder::Date)
            .await?;
        if let SearchEnd::Failed(err) = outcome.end {
            return Err(CollectError::Api(err));
        }

        let ids = unique_channel_ids(&outcome.videos);
        let fetch = extractor.fetch_channels(&ids).await;

        Ok(CustomQueryResult {
            query: query.to_string(),
            video_count: outcome.videos.len(),
            channel_count: fetch.channels.len(),
            videos: outcome.videos,
            channels: fetch.channels,
            quota_used: extractor.quota().used(),
        })
    }
}
