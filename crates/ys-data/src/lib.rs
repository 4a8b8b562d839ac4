pub mod analyzer;
pub mod error;
pub mod export;
pub mod files;
pub mod load;
pub mod records;
pub mod sanitize;
pub mod table;

pub use analyzer::{
    parse_published, Analyzer, Distribution, Engagement, Overview, QueryStats, RankedChannel,
    Rankings, SummaryReport, Temporal, VideoStatistics,
};
pub use error::DataError;
pub use export::{file_timestamp, ExportedFiles, Exporter, QuotaSummary};
pub use files::{list_data_files, resolve_data_file, DataFile};
pub use load::{Dataset, CHANNELS_PREFIX, VIDEOS_PREFIX};
pub use records::{ChannelRecord, QueryVideos, VideoRecord, VideoRow};
pub use table::{paginate_channels, paginate_videos, Page};
