use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use ys_data::{paginate_channels, paginate_videos, ChannelRecord, DataError, Dataset, Page, VideoRow};

use crate::error::ApiErrorResponse;
use crate::state::AppState;

const MAX_PAGE_SIZE: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct TableQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub search: String,
}

fn default_limit() -> usize {
    50
}

pub async fn videos(
    State(state): State<AppState>,
    Query(query): Query<TableQuery>,
) -> Result<Json<Page<VideoRow>>, ApiErrorResponse> {
    let dataset = Dataset::load_latest(state.collector.data_dir())?;
    let rows = dataset.videos.ok_or(DataError::NoData)?;
    Ok(Json(paginate_videos(
        &rows,
        query.skip,
        query.limit.min(MAX_PAGE_SIZE),
        &query.search,
    )))
}

pub async fn channels(
    State(state): State<AppState>,
    Query(query): Query<TableQuery>,
) -> Result<Json<Page<ChannelRecord>>, ApiErrorResponse> {
    let dataset = Dataset::load_latest(state.collector.data_dir())?;
    let rows = dataset.channels.ok_or(DataError::NoData)?;
    Ok(Json(paginate_channels(
        &rows,
        query.skip,
        query.limit.min(MAX_PAGE_SIZE),
        &query.search,
    )))
}
