use serde::Serialize;

use crate::records::{ChannelRecord, VideoRow};

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub skip: usize,
    pub limit: usize,
}

pub(crate) fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Rows are cleaned before filtering so a `NaN` cell neither matches a
/// search nor reaches the response.
fn paginate<T>(
    rows: &[T],
    skip: usize,
    limit: usize,
    search: &str,
    clean: impl Fn(&T) -> T,
    matches: impl Fn(&T, &str) -> bool,
) -> Page<T> {
    let needle = search.trim().to_lowercase();
    let filtered: Vec<T> = rows
        .iter()
        .map(clean)
        .filter(|row| needle.is_empty() || matches(row, &needle))
        .collect();
    let total = filtered.len();
    let data = filtered.into_iter().skip(skip).take(limit).collect();

    Page {
        data,
        total,
        skip,
        limit,
    }
}

/// Video table page; `search` matches title, channel title, or description.
pub fn paginate_videos(rows: &[VideoRow], skip: usize, limit: usize, search: &str) -> Page<VideoRow> {
    paginate(rows, skip, limit, search, VideoRow::cleaned, |row, needle| {
        contains_ci(&row.title, needle)
            || contains_ci(&row.channel_title, needle)
            || contains_ci(&row.description, needle)
    })
}

/// Channel table page; `search` matches title or description.
pub fn paginate_channels(
    rows: &[ChannelRecord],
    skip: usize,
    limit: usize,
    search: &str,
) -> Page<ChannelRecord> {
    paginate(rows, skip, limit, search, ChannelRecord::cleaned, |row, needle| {
        contains_ci(&row.title, needle) || contains_ci(&row.description, needle)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<VideoRow> {
        (0..7)
            .map(|i| VideoRow {
                video_id: format!("v{i}"),
                title: if i % 2 == 0 { "Mozart Requiem".into() } else { "Gloria".into() },
                channel_title: format!("Channel {i}"),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn pages_without_search() {
        let page = paginate_videos(&rows(), 5, 5, "");
        assert_eq!(page.total, 7);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].video_id, "v5");
        assert_eq!(page.skip, 5);
        assert_eq!(page.limit, 5);
    }

    #[test]
    fn search_is_case_insensitive_and_counts_matches() {
        let page = paginate_videos(&rows(), 0, 2, "REQUIEM");
        assert_eq!(page.total, 4);
        assert_eq!(page.data.len(), 2);
        assert!(page.data.iter().all(|v| v.title == "Mozart Requiem"));
    }

    #[test]
    fn search_matches_channel_title() {
        let page = paginate_videos(&rows(), 0, 50, "channel 3");
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].video_id, "v3");
    }

    #[test]
    fn skip_past_end_is_empty() {
        let page = paginate_videos(&rows(), 100, 10, "");
        assert!(page.data.is_empty());
        assert_eq!(page.total, 7);
    }

    #[test]
    fn channel_search_ignores_country() {
        let channels = vec![
            ChannelRecord {
                title: "Berlin Phil".into(),
                country: "DE".into(),
                ..Default::default()
            },
            ChannelRecord {
                title: "Choir".into(),
                description: "from berlin".into(),
                ..Default::default()
            },
        ];
        assert_eq!(paginate_channels(&channels, 0, 10, "berlin").total, 2);
        assert_eq!(paginate_channels(&channels, 0, 10, "de").total, 0);
    }

    #[test]
    fn pages_carry_cleaned_cells() {
        let channels = vec![ChannelRecord {
            channel_id: "UC1".into(),
            title: "nan".into(),
            view_count: "inf".into(),
            subscriber_count: "NaN".into(),
            video_count: "12".into(),
            ..Default::default()
        }];
        let page = paginate_channels(&channels, 0, 10, "");
        let row = &page.data[0];
        assert_eq!(row.title, "");
        assert_eq!(row.view_count, "0");
        assert_eq!(row.subscriber_count, "0");
        assert_eq!(row.video_count, "12");

        let json = serde_json::to_string(&page).unwrap();
        assert!(!json.to_lowercase().contains("nan"));
        assert!(!json.contains("inf"));

        assert_eq!(paginate_channels(&channels, 0, 10, "nan").total, 0);
    }

    #[test]
    fn video_pages_blank_nan_text() {
        let videos = vec![VideoRow {
            video_id: "v1".into(),
            title: "Gloria".into(),
            description: "NaN".into(),
            ..Default::default()
        }];
        let page = paginate_videos(&videos, 0, 10, "");
        assert_eq!(page.data[0].description, "");
        assert_eq!(page.data[0].title, "Gloria");
    }
}
