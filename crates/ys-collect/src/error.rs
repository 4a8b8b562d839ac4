use thiserror::Error;
use ys_data::DataError;
use ys_youtube::YouTubeError;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("YouTube API quota exceeded")]
    QuotaExceeded,

    #[error("Extraction already running")]
    AlreadyRunning,

    #[error("YouTube API error: {0}")]
    Api(YouTubeError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<YouTubeError> for CollectError {
    fn from(err: YouTubeError) -> Self {
        if err.is_quota_exceeded() {
            CollectError::QuotaExceeded
        } else {
            CollectError::Api(err)
        }
    }
}

impl CollectError {
    pub fn error_code(&self) -> &'static str {
        match self {
            CollectError::QuotaExceeded => "QUOTA_EXCEEDED",
            CollectError::AlreadyRunning => "EXTRACTION_RUNNING",
            CollectError::Api(_) => "YOUTUBE_API_ERROR",
            CollectError::Data(err) => err.error_code(),
            CollectError::Io(_) => "COLLECT_IO_ERROR",
        }
    }
}
