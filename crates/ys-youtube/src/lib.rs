pub mod client;
pub mod error;
pub mod types;

pub use client::{YouTubeApi, YouTubeClient, DEFAULT_BASE_URL};
pub use error::YouTubeError;
pub use types::{
    BrandingChannel, BrandingSettings, ChannelItem, ChannelSnippet, ChannelStatistics,
    SearchItem, SearchItemId, SearchOrder, SearchPage, VideoContentDetails, VideoItem,
    VideoSnippet, VideoStatistics,
};
