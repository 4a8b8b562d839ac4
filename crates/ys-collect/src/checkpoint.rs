use std::path::Path;

use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use ys_data::{QueryVideos, VideoRecord};

/// Resumable progress, written after every completed query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(default)]
    pub completed_queries: Vec<String>,
    #[serde(default)]
    pub video_data: QueryVideos,
    #[serde(default)]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckpointProgress {
    pub completed_queries: Vec<String>,
    pub total_queries: usize,
    pub completion_percentage: f64,
    pub videos_collected: usize,
    pub last_updated: Option<String>,
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    let tmp = path.with_extension(format!("tmp.{}", Uuid::new_v4()));
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

impl Checkpoint {
    /// A missing file is a fresh start; an unreadable one is logged and
    /// treated the same way.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                tracing::warn!("Error loading progress file {}: {}", path.display(), err);
                return Self::default();
            }
        };
        match serde_json::from_str::<Checkpoint>(&content) {
            Ok(checkpoint) => {
                tracing::info!(
                    "Loaded progress: {} queries completed",
                    checkpoint.completed_queries.len()
                );
                checkpoint
            }
            Err(err) => {
                tracing::warn!("Corrupt progress file {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    pub fn save(&mut self, path: &Path) -> Result<(), std::io::Error> {
        self.last_updated = Some(Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string());
        write_json_atomic(path, self)?;
        tracing::info!(
            "Progress saved: {} queries completed",
            self.completed_queries.len()
        );
        Ok(())
    }

    pub fn remove(path: &Path) -> Result<(), std::io::Error> {
        match std::fs::remove_file(path) {
            Ok(()) => {
                tracing::info!("Progress file cleaned up");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }

    pub fn is_completed(&self, query: &str) -> bool {
        self.completed_queries.iter().any(|q| q == query)
    }

    /// Queries not yet completed, in the given order.
    pub fn remaining(&self, queries: &[String]) -> Vec<String> {
        queries
            .iter()
            .filter(|q| !self.is_completed(q))
            .cloned()
            .collect()
    }

    pub fn record(&mut self, query: &str, videos: Vec<VideoRecord>) {
        self.video_data.insert(query.to_string(), videos);
        if !self.is_completed(query) {
            self.completed_queries.push(query.to_string());
        }
    }

    pub fn video_count(&self) -> usize {
        self.video_data.values().map(Vec::len).sum()
    }

    pub fn progress(&self, queries: &[String]) -> CheckpointProgress {
        let total = queries.len();
        let done = queries.iter().filter(|q| self.is_completed(q)).count();
        CheckpointProgress {
            completed_queries: self.completed_queries.clone(),
            total_queries: total,
            completion_percentage: if total == 0 {
                0.0
            } else {
                done as f64 * 100.0 / total as f64
            },
            videos_collected: self.video_count(),
            last_updated: self.last_updated.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queries() -> Vec<String> {
        vec!["Handel Messiah".into(), "Mozart Requiem".into(), "Faure Requiem".into()]
    }

    fn video(id: &str) -> VideoRecord {
        VideoRecord {
            video_id: id.into(),
            channel_id: "UC1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = Checkpoint::load(&dir.path().join("extraction_progress.json"));
        assert_eq!(checkpoint, Checkpoint::default());
    }

    #[test]
    fn corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extraction_progress.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(Checkpoint::load(&path).completed_queries.is_empty());
    }

    #[test]
    fn save_then_load_restores_progress() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("extraction_progress.json");

        let mut checkpoint = Checkpoint::default();
        checkpoint.record("Mozart Requiem", vec![video("a"), video("b")]);
        checkpoint.save(&path).unwrap();

        let loaded = Checkpoint::load(&path);
        assert_eq!(loaded.completed_queries, vec!["Mozart Requiem"]);
        assert_eq!(loaded.video_count(), 2);
        assert!(loaded.last_updated.is_some());
        assert_eq!(
            loaded.remaining(&queries()),
            vec!["Handel Messiah".to_string(), "Faure Requiem".to_string()]
        );

        // no temp files left behind
        let names: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn reads_files_written_with_camel_case_videos() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extraction_progress.json");
        std::fs::write(
            &path,
            r#"{"completed_queries":["Vivaldi Gloria"],
                "video_data":{"Vivaldi Gloria":[{"videoId":"x","channelId":"UC7"}]},
                "last_updated":"2024-01-01T00:00:00"}"#,
        )
        .unwrap();
        let checkpoint = Checkpoint::load(&path);
        assert_eq!(checkpoint.video_data["Vivaldi Gloria"][0].channel_id, "UC7");
    }

    #[test]
    fn record_is_idempotent_per_query() {
        let mut checkpoint = Checkpoint::default();
        checkpoint.record("Mozart Requiem", vec![video("a")]);
        checkpoint.record("Mozart Requiem", vec![video("a"), video("b")]);
        assert_eq!(checkpoint.completed_queries.len(), 1);
        assert_eq!(checkpoint.video_count(), 2);
    }

    #[test]
    fn progress_percentage() {
        let mut checkpoint = Checkpoint::default();
        checkpoint.record("Faure Requiem", vec![video("a")]);
        let progress = checkpoint.progress(&queries());
        assert_eq!(progress.total_queries, 3);
        assert!((progress.completion_percentage - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(progress.videos_collected, 1);
        assert_eq!(Checkpoint::default().progress(&[]).completion_percentage, 0.0);
    }

    #[test]
    fn remove_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extraction_progress.json");
        Checkpoint::remove(&path).unwrap();
        std::fs::write(&path, "{}").unwrap();
        Checkpoint::remove(&path).unwrap();
        assert!(!path.exists());
    }
}
