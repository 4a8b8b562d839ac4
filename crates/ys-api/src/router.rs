use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::rest::{analysis, dashboard, data, extract, files, health, query};
use crate::state::AppState;

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid allowed origin: {}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    let extraction_routes = Router::new()
        .route("/api/status", get(extract::status))
        .route("/api/extract/start", post(extract::start))
        .route("/api/extract/stop", post(extract::stop))
        .route("/api/queries", get(extract::queries))
        .route("/api/progress", get(extract::progress))
        .route("/api/query/custom", post(query::custom));

    let analysis_routes = Router::new()
        .route("/api/analysis/overview", get(analysis::overview))
        .route("/api/analysis/queries", get(analysis::queries))
        .route("/api/analysis/channels/top", get(analysis::top_channels))
        .route("/api/analysis/temporal", get(analysis::temporal))
        .route("/api/analysis/distribution", get(analysis::distribution))
        .route("/api/analysis/engagement", get(analysis::engagement))
        .route("/api/analysis/report", get(analysis::report))
        .route("/api/analysis/search", post(analysis::search))
        .route("/api/analytics/rankings", get(analysis::rankings))
        .route("/api/analytics/videos", get(analysis::video_statistics))
        .route("/api/analytics/dashboard", get(analysis::dashboard));

    let data_routes = Router::new()
        .route("/api/data/videos", get(data::videos))
        .route("/api/data/channels", get(data::channels))
        .route("/api/files", get(files::list))
        .route("/api/files/download/{name}", get(files::download));

    Router::new()
        .route("/", get(dashboard::index))
        .route("/health", get(health::health))
        .merge(extraction_routes)
        .merge(analysis_routes)
        .merge(data_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
