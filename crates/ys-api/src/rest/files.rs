use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use ys_data::{list_data_files, resolve_data_file, DataFile};

use crate::error::ApiErrorResponse;
use crate::state::AppState;

#[derive(Serialize)]
pub struct FilesResponse {
    pub files: Vec<DataFile>,
}

fn content_type(name: &str) -> &'static str {
    if name.ends_with(".csv") {
        "text/csv; charset=utf-8"
    } else if name.ends_with(".txt") {
        "text/plain; charset=utf-8"
    } else if name.ends_with(".json") {
        "application/json"
    } else {
        "application/octet-stream"
    }
}

pub async fn list(State(state): State<AppState>) -> Result<Json<FilesResponse>, ApiErrorResponse> {
    Ok(Json(FilesResponse {
        files: list_data_files(state.collector.data_dir())?,
    }))
}

pub async fn download(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiErrorResponse> {
    let path = resolve_data_file(state.collector.data_dir(), &name)?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(ys_data::DataError::from)?;
    Ok((
        [
            (header::CONTENT_TYPE, content_type(&name).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", name),
            ),
        ],
        bytes,
    )
        .into_response())
}
