use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use tokio::sync::RwLock;

/// Snapshot of the extraction run served by `/api/status`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionStatus {
    pub is_running: bool,
    pub current_query: Option<String>,
    /// 0..=100
    pub progress: u8,
    pub total_queries: usize,
    pub completed_queries: Vec<String>,
    pub videos_collected: usize,
    pub channels_collected: usize,
    pub quota_used: u32,
    pub quota_limit: u32,
    pub quota_exceeded: bool,
    pub errors: Vec<String>,
    pub started_at: Option<String>,
    pub last_updated: Option<String>,
    pub quota_reset_at: Option<String>,
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Shared status record plus the cooperative stop flag.
#[derive(Clone)]
pub struct StatusHandle {
    inner: Arc<RwLock<ExtractionStatus>>,
    stop: Arc<AtomicBool>,
}

impl StatusHandle {
    pub fn new(quota_limit: u32) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ExtractionStatus {
                quota_limit,
                ..Default::default()
            })),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn snapshot(&self) -> ExtractionStatus {
        self.inner.read().await.clone()
    }

    pub async fn is_running(&self) -> bool {
        self.inner.read().await.is_running
    }

    /// Applies `f` and stamps `last_updated`.
    pub async fn update(&self, f: impl FnOnce(&mut ExtractionStatus)) {
        let mut status = self.inner.write().await;
        f(&mut status);
        status.last_updated = Some(timestamp());
    }

    pub async fn push_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|s| s.errors.push(message)).await;
    }

    /// Marks a new run as started unless one is already running. The check
    /// and the flip happen under one write lock.
    pub async fn try_begin(&self, total_queries: usize, quota_limit: u32) -> bool {
        let mut status = self.inner.write().await;
        if status.is_running {
            return false;
        }
        let now = timestamp();
        *status = ExtractionStatus {
            is_running: true,
            total_queries,
            quota_limit,
            started_at: Some(now.clone()),
            last_updated: Some(now),
            ..Default::default()
        };
        self.stop.store(false, Ordering::SeqCst);
        true
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn begin_is_exclusive() {
        let handle = StatusHandle::new(10_000);
        assert!(handle.try_begin(17, 10_000).await);
        assert!(!handle.try_begin(17, 10_000).await);

        let status = handle.snapshot().await;
        assert!(status.is_running);
        assert_eq!(status.total_queries, 17);
        assert!(status.started_at.is_some());

        handle.update(|s| s.is_running = false).await;
        assert!(handle.try_begin(3, 500).await);
        assert_eq!(handle.snapshot().await.quota_limit, 500);
    }

    #[tokio::test]
    async fn begin_clears_previous_run() {
        let handle = StatusHandle::new(10_000);
        handle
            .update(|s| {
                s.errors.push("old".into());
                s.quota_exceeded = true;
            })
            .await;
        handle.request_stop();
        assert!(handle.try_begin(1, 10_000).await);

        let status = handle.snapshot().await;
        assert!(status.errors.is_empty());
        assert!(!status.quota_exceeded);
        assert!(!handle.stop_requested());
    }

    #[tokio::test]
    async fn stop_flag_is_shared() {
        let handle = StatusHandle::new(10_000);
        let flag = handle.stop_flag();
        handle.clone().request_stop();
        assert!(flag.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn push_error_stamps_update() {
        let handle = StatusHandle::new(10_000);
        handle.push_error("boom").await;
        let status = handle.snapshot().await;
        assert_eq!(status.errors, vec!["boom"]);
        assert!(status.last_updated.is_some());
    }
}
