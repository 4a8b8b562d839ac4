use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use ys_collect::CustomQueryResult;

use crate::error::{ApiError, ApiErrorResponse};
use crate::state::AppState;

const MAX_CUSTOM_VIDEOS: usize = 500;

#[derive(Debug, Deserialize)]
pub struct CustomQueryRequest {
    pub query: String,
    #[serde(default = "default_max_videos")]
    pub max_videos: usize,
}

fn default_max_videos() -> usize {
    100
}

pub async fn custom(
    State(state): State<AppState>,
    Json(request): Json<CustomQueryRequest>,
) -> Result<Json<CustomQueryResult>, ApiErrorResponse> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(ApiErrorResponse {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::bad_request("INVALID_QUERY", "query must not be empty"),
        });
    }
    if !state.api_ready {
        return Err(ApiErrorResponse {
            status: StatusCode::SERVICE_UNAVAILABLE,
            error: ApiError::new(
                "API_KEY_MISSING",
                format!("{} is not set", ys_config::API_KEY_ENV),
            ),
        });
    }

    let max_videos = request.max_videos.clamp(1, MAX_CUSTOM_VIDEOS);
    let result = state
        .collector
        .custom_query(query, max_videos)
        .await
        .map_err(|e| {
            tracing::error!("Error fetching custom query '{}': {}", query, e);
            ApiErrorResponse::from(e)
        })?;
    Ok(Json(result))
}
