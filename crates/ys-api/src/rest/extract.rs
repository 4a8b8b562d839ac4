use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use ys_collect::{CheckpointProgress, CollectOptions, ExtractionStatus};
use ys_quota::QuotaResetInfo;

use crate::error::{ApiError, ApiErrorResponse};
use crate::state::AppState;

#[derive(Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub status: ExtractionStatus,
    pub quota_reset_info: QuotaResetInfo,
}

/// Optional overrides for a run; omitted fields come from the config.
#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    pub queries: Option<Vec<String>>,
    pub videos_per_query: Option<u32>,
    pub daily_quota: Option<u32>,
}

#[derive(Serialize)]
pub struct ActionResponse {
    pub message: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct QueriesResponse {
    pub queries: Vec<String>,
}

fn bad_request(code: &str, message: impl Into<String>) -> ApiErrorResponse {
    ApiErrorResponse {
        status: StatusCode::BAD_REQUEST,
        error: ApiError::bad_request(code, message),
    }
}

fn options_for(state: &AppState, request: StartRequest) -> Result<CollectOptions, ApiErrorResponse> {
    let mut options = CollectOptions::from_config(&state.config);
    if let Some(queries) = request.queries {
        let queries: Vec<String> = queries
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();
        if !queries.is_empty() {
            options.queries = queries;
        }
    }
    if let Some(videos) = request.videos_per_query {
        if videos == 0 {
            return Err(bad_request("INVALID_REQUEST", "videos_per_query must be greater than 0"));
        }
        options.videos_per_query = videos;
    }
    if let Some(quota) = request.daily_quota {
        if quota == 0 {
            return Err(bad_request("INVALID_REQUEST", "daily_quota must be greater than 0"));
        }
        options.daily_quota = quota;
    }
    Ok(options)
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: state.collector.status().snapshot().await,
        quota_reset_info: state.collector.reset_info(),
    })
}

pub async fn start(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ActionResponse>, ApiErrorResponse> {
    if !state.api_ready {
        return Err(ApiErrorResponse {
            status: StatusCode::SERVICE_UNAVAILABLE,
            error: ApiError::new(
                "API_KEY_MISSING",
                format!("{} is not set", ys_config::API_KEY_ENV),
            ),
        });
    }

    let request = if body.iter().all(u8::is_ascii_whitespace) {
        StartRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| bad_request("INVALID_REQUEST", e.to_string()))?
    };
    let options = options_for(&state, request)?;

    state.collector.begin(&options).await?;
    tracing::info!(
        "Starting extraction: {} queries, {} videos per query, quota {}",
        options.queries.len(),
        options.videos_per_query,
        options.daily_quota
    );

    let collector = state.collector.clone();
    tokio::spawn(async move {
        collector.execute(options).await;
    });

    Ok(Json(ActionResponse {
        message: "Extraction started".to_string(),
        status: "running".to_string(),
    }))
}

pub async fn stop(State(state): State<AppState>) -> Result<Json<ActionResponse>, ApiErrorResponse> {
    if !state.collector.status().is_running().await {
        return Err(bad_request("NOT_RUNNING", "No extraction running"));
    }
    state.collector.request_stop();
    Ok(Json(ActionResponse {
        message: "Extraction stop requested".to_string(),
        status: "stopping".to_string(),
    }))
}

pub async fn queries(State(state): State<AppState>) -> Json<QueriesResponse> {
    Json(QueriesResponse {
        queries: state.search_phrases(),
    })
}

pub async fn progress(State(state): State<AppState>) -> Json<CheckpointProgress> {
    Json(state.collector.progress(&state.search_phrases()))
}
