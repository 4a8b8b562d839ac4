use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use ys_data::{
    Analyzer, Distribution, Engagement, Overview, QueryStats, RankedChannel, Rankings,
    SummaryReport, Temporal, VideoRow, VideoStatistics,
};

use crate::error::ApiErrorResponse;
use crate::state::AppState;

/// Loads the newest exports; 404 `NO_DATA` when there are none.
fn analyzer(state: &AppState) -> Result<Analyzer, ApiErrorResponse> {
    Ok(Analyzer::load(state.collector.data_dir())?)
}

#[derive(Serialize)]
pub struct QueryStatsResponse {
    pub query_statistics: Vec<QueryStats>,
}

#[derive(Deserialize)]
pub struct TopChannelsQuery {
    #[serde(default = "default_top_limit")]
    pub limit: usize,
}

fn default_top_limit() -> usize {
    20
}

#[derive(Serialize)]
pub struct TopChannelsResponse {
    pub top_channels: Vec<RankedChannel>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

fn default_search_limit() -> usize {
    100
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<VideoRow>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub overview: Overview,
    pub video_statistics: VideoStatistics,
    pub rankings: Rankings,
    pub top_channels: Vec<RankedChannel>,
}

pub async fn overview(State(state): State<AppState>) -> Result<Json<Overview>, ApiErrorResponse> {
    Ok(Json(analyzer(&state)?.overview()))
}

pub async fn queries(
    State(state): State<AppState>,
) -> Result<Json<QueryStatsResponse>, ApiErrorResponse> {
    Ok(Json(QueryStatsResponse {
        query_statistics: analyzer(&state)?.query_statistics(),
    }))
}

pub async fn top_channels(
    State(state): State<AppState>,
    Query(query): Query<TopChannelsQuery>,
) -> Result<Json<TopChannelsResponse>, ApiErrorResponse> {
    Ok(Json(TopChannelsResponse {
        top_channels: analyzer(&state)?.top_channels(query.limit),
    }))
}

pub async fn temporal(State(state): State<AppState>) -> Result<Json<Temporal>, ApiErrorResponse> {
    Ok(Json(analyzer(&state)?.temporal_distribution(Utc::now())))
}

pub async fn distribution(
    State(state): State<AppState>,
) -> Result<Json<Distribution>, ApiErrorResponse> {
    Ok(Json(analyzer(&state)?.channel_distribution()))
}

pub async fn engagement(
    State(state): State<AppState>,
) -> Result<Json<Engagement>, ApiErrorResponse> {
    Ok(Json(analyzer(&state)?.engagement()))
}

pub async fn report(
    State(state): State<AppState>,
) -> Result<Json<SummaryReport>, ApiErrorResponse> {
    Ok(Json(analyzer(&state)?.summary_report(Utc::now())))
}

pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiErrorResponse> {
    let results = analyzer(&state)?.search_videos(
        request.query.as_deref().unwrap_or(""),
        request.channel.as_deref().unwrap_or(""),
        request.limit,
    );
    Ok(Json(SearchResponse {
        count: results.len(),
        results,
    }))
}

pub async fn rankings(State(state): State<AppState>) -> Result<Json<Rankings>, ApiErrorResponse> {
    Ok(Json(analyzer(&state)?.channel_rankings()))
}

pub async fn video_statistics(
    State(state): State<AppState>,
) -> Result<Json<VideoStatistics>, ApiErrorResponse> {
    Ok(Json(analyzer(&state)?.video_statistics()))
}

pub async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, ApiErrorResponse> {
    let analyzer = analyzer(&state)?;
    Ok(Json(DashboardResponse {
        overview: analyzer.overview(),
        video_statistics: analyzer.video_statistics(),
        rankings: analyzer.channel_rankings(),
        top_channels: analyzer.top_channels(10),
    }))
}
