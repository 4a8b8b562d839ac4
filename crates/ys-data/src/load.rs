use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::DataError;
use crate::records::{ChannelRecord, VideoRow};

pub const VIDEOS_PREFIX: &str = "classical_music_videos_";
pub const CHANNELS_PREFIX: &str = "classical_music_channels_";

/// The most recent video and channel exports, whichever exist.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub videos: Option<Vec<VideoRow>>,
    pub channels: Option<Vec<ChannelRecord>>,
}

/// Export names embed a sortable timestamp, so the greatest name is the newest.
fn latest_with_prefix(dir: &Path, prefix: &str) -> Result<Option<PathBuf>, DataError> {
    let mut latest: Option<String> = None;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !name.starts_with(prefix) || !name.ends_with(".csv") {
            continue;
        }
        if latest.as_deref().map_or(true, |current| name.as_str() > current) {
            latest = Some(name);
        }
    }
    Ok(latest.map(|name| dir.join(name)))
}

fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DataError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

impl Dataset {
    /// Loads the newest exports in `dir`. Fails with `NoData` when neither a
    /// video nor a channel export is present.
    pub fn load_latest(dir: &Path) -> Result<Self, DataError> {
        if !dir.exists() {
            return Err(DataError::NoData);
        }

        let mut dataset = Dataset::default();

        if let Some(path) = latest_with_prefix(dir, VIDEOS_PREFIX)? {
            let rows: Vec<VideoRow> = read_csv(&path)?;
            tracing::info!("Loaded video data: {} ({} records)", path.display(), rows.len());
            dataset.videos = Some(rows);
        }

        if let Some(path) = latest_with_prefix(dir, CHANNELS_PREFIX)? {
            let rows: Vec<ChannelRecord> = read_csv(&path)?;
            tracing::info!(
                "Loaded channel data: {} ({} records)",
                path.display(),
                rows.len()
            );
            dataset.channels = Some(rows);
        }

        if dataset.videos.is_none() && dataset.channels.is_none() {
            return Err(DataError::NoData);
        }
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let result = Dataset::load_latest(&dir.path().join("absent"));
        assert!(matches!(result, Err(DataError::NoData)));
    }

    #[test]
    fn empty_directory_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        assert!(matches!(
            Dataset::load_latest(dir.path()),
            Err(DataError::NoData)
        ));
    }

    #[test]
    fn picks_newest_export_and_strips_bom() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("classical_music_videos_20240101_000000.csv"),
            "searchQuery,videoId,title,description,publishedAt,channelTitle,channelId\n\
             old,v0,t,d,2023-01-01,c,UC0\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("classical_music_videos_20240301_000000.csv"),
            "\u{feff}searchQuery,videoId,title,description,publishedAt,channelTitle,channelId\n\
             new,v1,t,d,2024-01-01,c,UC1\n\
             new,v2,t,,2024-01-02,c,UC1\n",
        )
        .unwrap();

        let dataset = Dataset::load_latest(dir.path()).unwrap();
        let videos = dataset.videos.unwrap();
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].search_query, "new");
        assert_eq!(videos[1].description, "");
        assert!(dataset.channels.is_none());
    }

    #[test]
    fn channels_without_optional_columns_load_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("classical_music_channels_20240101_000000.csv"),
            "channelId,title,subscriberCount\nUC1,Choir,\nUC2,Band,15\n",
        )
        .unwrap();
        let dataset = Dataset::load_latest(dir.path()).unwrap();
        let channels = dataset.channels.unwrap();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].subscriber_count, "");
        assert_eq!(channels[1].subscriber_count, "15");
        assert_eq!(channels[1].country, "");
        assert!(dataset.videos.is_none());
    }
}
