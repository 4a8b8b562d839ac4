//! Wire types for the subset of the YouTube Data API v3 this crate calls.
//!
//! Every field is defaulted: the API omits keys freely (for example
//! `country` on most channels, or `subscriberCount` when it is hidden).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchOrder {
    #[default]
    Date,
    Rating,
    Relevance,
    Title,
    ViewCount,
}

impl SearchOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchOrder::Date => "date",
            SearchOrder::Rating => "rating",
            SearchOrder::Relevance => "relevance",
            SearchOrder::Title => "title",
            SearchOrder::ViewCount => "viewCount",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub items: Vec<SearchItem>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub id: SearchItemId,
    #[serde(default)]
    pub snippet: VideoSnippet,
}

/// `search.list` returns `{"kind": ..., "videoId": ...}`; some proxies and
/// older fixtures flatten it to a bare string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchItemId {
    Resource {
        #[serde(rename = "videoId", default)]
        video_id: Option<String>,
    },
    Plain(String),
}

impl Default for SearchItemId {
    fn default() -> Self {
        SearchItemId::Resource { video_id: None }
    }
}

impl SearchItemId {
    pub fn video_id(&self) -> &str {
        match self {
            SearchItemId::Resource { video_id } => video_id.as_deref().unwrap_or(""),
            SearchItemId::Plain(id) => id,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoSnippet {
    pub title: String,
    pub description: String,
    pub published_at: String,
    pub channel_title: String,
    pub channel_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoStatistics {
    pub view_count: Option<String>,
    pub like_count: Option<String>,
    pub comment_count: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoContentDetails {
    pub duration: String,
    pub definition: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoItem {
    pub id: String,
    pub snippet: VideoSnippet,
    pub statistics: VideoStatistics,
    pub content_details: VideoContentDetails,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelSnippet {
    pub title: String,
    pub description: String,
    pub published_at: String,
    pub country: String,
    pub custom_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelStatistics {
    pub view_count: Option<String>,
    pub subscriber_count: Option<String>,
    pub video_count: Option<String>,
    pub hidden_subscriber_count: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandingChannel {
    pub title: String,
    pub description: String,
    pub country: String,
    pub keywords: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandingSettings {
    pub channel: BrandingChannel,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelItem {
    pub id: String,
    pub snippet: ChannelSnippet,
    pub statistics: ChannelStatistics,
    pub branding_settings: BrandingSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}
