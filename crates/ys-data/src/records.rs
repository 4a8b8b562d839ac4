use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sanitize::{clean_count, clean_text};

/// Videos collected per search phrase.
pub type QueryVideos = BTreeMap<String, Vec<VideoRecord>>;

/// One search hit. Field names double as CSV headers and checkpoint keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub published_at: String,
    pub channel_title: String,
    pub channel_id: String,
}

/// A video row of the combined export, tagged with the phrase that found it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoRow {
    pub search_query: String,
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub published_at: String,
    pub channel_title: String,
    pub channel_id: String,
}

impl VideoRow {
    pub fn new(search_query: &str, video: &VideoRecord) -> Self {
        Self {
            search_query: search_query.to_string(),
            video_id: video.video_id.clone(),
            title: video.title.clone(),
            description: video.description.clone(),
            published_at: video.published_at.clone(),
            channel_title: video.channel_title.clone(),
            channel_id: video.channel_id.clone(),
        }
    }
}

impl VideoRow {
    /// Copy with spreadsheet `NaN` markers blanked.
    pub fn cleaned(&self) -> Self {
        Self {
            search_query: clean_text(&self.search_query),
            video_id: clean_text(&self.video_id),
            title: clean_text(&self.title),
            description: clean_text(&self.description),
            published_at: clean_text(&self.published_at),
            channel_title: clean_text(&self.channel_title),
            channel_id: clean_text(&self.channel_id),
        }
    }
}

/// Channel profile as exported. Counts stay as the API's decimal strings;
/// analytics parse them through `sanitize::parse_count`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelRecord {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub published_at: String,
    pub country: String,
    pub custom_url: String,
    pub view_count: String,
    pub subscriber_count: String,
    pub video_count: String,
    /// `"True"` or `"False"`.
    pub hidden_subscriber_count: String,
    pub channel_url: String,
}

impl ChannelRecord {
    /// Copy with text `NaN` markers blanked and unusable counts set to `"0"`.
    pub fn cleaned(&self) -> Self {
        Self {
            channel_id: clean_text(&self.channel_id),
            title: clean_text(&self.title),
            description: clean_text(&self.description),
            published_at: clean_text(&self.published_at),
            country: clean_text(&self.country),
            custom_url: clean_text(&self.custom_url),
            view_count: clean_count(&self.view_count),
            subscriber_count: clean_count(&self.subscriber_count),
            video_count: clean_count(&self.video_count),
            hidden_subscriber_count: clean_text(&self.hidden_subscriber_count),
            channel_url: clean_text(&self.channel_url),
        }
    }
}

pub fn channel_url(channel_id: &str) -> String {
    if channel_id.is_empty() {
        String::new()
    } else {
        format!("https://www.youtube.com/channel/{}", channel_id)
    }
}
