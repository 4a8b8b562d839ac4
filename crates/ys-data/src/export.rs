use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::DataError;
use crate::load::{CHANNELS_PREFIX, VIDEOS_PREFIX};
use crate::records::{ChannelRecord, QueryVideos, VideoRecord, VideoRow};

/// Excel only detects UTF-8 in CSV files that start with a BOM.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Quota figures printed in the extraction summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotaSummary {
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
    pub requests: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportedFiles {
    pub videos: Option<PathBuf>,
    pub channels: Option<PathBuf>,
    pub summary: Option<PathBuf>,
    /// One `videos_{query}_{stamp}.csv` per search phrase.
    pub per_query: Vec<PathBuf>,
}

/// `YYYYmmdd_HHMMSS`, the suffix every export file carries.
pub fn file_timestamp(now: DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

fn with_csv_extension(filename: &str) -> String {
    if filename.ends_with(".csv") {
        filename.to_string()
    } else {
        format!("{}.csv", filename)
    }
}

fn safe_query_name(query: &str) -> String {
    query
        .replace([' ', '/'], "_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Writes collected data under a single output directory.
pub struct Exporter {
    output_dir: PathBuf,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, DataError> {
        let output_dir = output_dir.into();
        if !output_dir.exists() {
            fs::create_dir_all(&output_dir)?;
            tracing::info!("Created output directory: {}", output_dir.display());
        }
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn write_csv<T: Serialize>(&self, filename: &str, rows: &[T]) -> Result<PathBuf, DataError> {
        let path = self.output_dir.join(with_csv_extension(filename));
        let mut file = fs::File::create(&path)?;
        file.write_all(UTF8_BOM)?;
        let mut writer = csv::Writer::from_writer(file);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(path)
    }

    /// Videos of one query, without the `searchQuery` column.
    pub fn export_videos(
        &self,
        videos: &[VideoRecord],
        filename: Option<&str>,
        stamp: &str,
    ) -> Result<Option<PathBuf>, DataError> {
        if videos.is_empty() {
            tracing::warn!("No video data to export");
            return Ok(None);
        }
        let default_name = format!("videos_{}.csv", stamp);
        let path = self.write_csv(filename.unwrap_or(&default_name), videos)?;
        tracing::info!("Exported {} videos to: {}", videos.len(), path.display());
        Ok(Some(path))
    }

    pub fn export_channels(
        &self,
        channels: &[ChannelRecord],
        filename: Option<&str>,
        stamp: &str,
    ) -> Result<Option<PathBuf>, DataError> {
        if channels.is_empty() {
            tracing::warn!("No channel data to export");
            return Ok(None);
        }
        let default_name = format!("{}{}.csv", CHANNELS_PREFIX, stamp);
        let path = self.write_csv(filename.unwrap_or(&default_name), channels)?;
        tracing::info!("Exported {} channels to: {}", channels.len(), path.display());
        Ok(Some(path))
    }

    /// All queries in one file, `searchQuery` first.
    pub fn export_query_videos(
        &self,
        data: &QueryVideos,
        filename: Option<&str>,
        stamp: &str,
    ) -> Result<Option<PathBuf>, DataError> {
        let rows: Vec<VideoRow> = data
            .iter()
            .flat_map(|(query, videos)| videos.iter().map(move |v| VideoRow::new(query, v)))
            .collect();
        if rows.is_empty() {
            tracing::warn!("No videos found in query data");
            return Ok(None);
        }
        let default_name = format!("{}{}.csv", VIDEOS_PREFIX, stamp);
        let path = self.write_csv(filename.unwrap_or(&default_name), &rows)?;
        tracing::info!(
            "Exported {} videos from {} queries to: {}",
            rows.len(),
            data.len(),
            path.display()
        );
        Ok(Some(path))
    }

    /// One CSV per query, named `{prefix}_{safe_query}_{stamp}.csv`.
    pub fn export_separate_query_csvs(
        &self,
        data: &QueryVideos,
        prefix: &str,
        stamp: &str,
    ) -> Result<Vec<PathBuf>, DataError> {
        let mut exported = Vec::new();
        for (query, videos) in data {
            let filename = format!("{}_{}_{}.csv", prefix, safe_query_name(query), stamp);
            if let Some(path) = self.export_videos(videos, Some(&filename), stamp)? {
                exported.push(path);
            }
        }
        tracing::info!("Exported {} separate CSV files", exported.len());
        Ok(exported)
    }

    pub fn export_summary_report(
        &self,
        data: &QueryVideos,
        channel_count: usize,
        quota: QuotaSummary,
        now: DateTime<Local>,
    ) -> Result<PathBuf, DataError> {
        let path = self
            .output_dir
            .join(format!("extraction_summary_{}.txt", file_timestamp(now)));
        fs::write(&path, render_summary(data, channel_count, quota, now))?;
        tracing::info!("Exported summary report to: {}", path.display());
        Ok(path)
    }
}

fn render_summary(
    data: &QueryVideos,
    channel_count: usize,
    quota: QuotaSummary,
    now: DateTime<Local>,
) -> String {
    let rule = "=".repeat(70);
    let thin = "-".repeat(70);
    let mut out = String::new();

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "YouTube Data Extraction Summary");
    let _ = writeln!(out, "{rule}\n");
    let _ = writeln!(out, "Extraction Date: {}\n", now.format("%Y-%m-%d %H:%M:%S"));

    let _ = writeln!(out, "Video Collection Summary:");
    let _ = writeln!(out, "{thin}");
    let mut total = 0;
    for (query, videos) in data {
        let _ = writeln!(out, "  {}: {} videos", query, videos.len());
        total += videos.len();
    }
    let _ = writeln!(out, "\n  TOTAL VIDEOS: {}\n", total);

    let _ = writeln!(out, "Channel Collection Summary:");
    let _ = writeln!(out, "{thin}");
    let _ = writeln!(out, "  Unique Channels: {}\n", channel_count);

    let _ = writeln!(out, "API Quota Usage:");
    let _ = writeln!(out, "{thin}");
    let _ = writeln!(out, "  Used: {}", quota.used);
    let _ = writeln!(out, "  Limit: {}", quota.limit);
    let _ = writeln!(out, "  Remaining: {}", quota.remaining);
    let _ = writeln!(out, "  Total Requests: {}\n", quota.requests);
    let _ = writeln!(out, "{rule}");
    out
}
