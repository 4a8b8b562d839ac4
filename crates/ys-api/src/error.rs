use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use ys_collect::CollectError;
use ys_data::DataError;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub retryable: bool,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn bad_request(code: &str, message: impl Into<String>) -> Self {
        Self::new(code, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message).retryable()
    }

    pub fn data_error(err: &DataError) -> (StatusCode, Self) {
        let status = match err {
            DataError::NoData | DataError::NotFound(_) => StatusCode::NOT_FOUND,
            DataError::InvalidFileName(_) => StatusCode::BAD_REQUEST,
            DataError::Csv(_) | DataError::Json(_) | DataError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Self::new(err.error_code(), err.to_string()))
    }

    pub fn collect_error(err: &CollectError) -> (StatusCode, Self) {
        match err {
            CollectError::QuotaExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                Self::new(err.error_code(), "Daily quota exceeded").retryable(),
            ),
            CollectError::AlreadyRunning => (
                StatusCode::BAD_REQUEST,
                Self::new(err.error_code(), "Extraction already running"),
            ),
            CollectError::Data(data) => Self::data_error(data),
            CollectError::Api(_) => (
                StatusCode::BAD_GATEWAY,
                Self::new(err.error_code(), err.to_string()).retryable(),
            ),
            CollectError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Self::new(err.error_code(), err.to_string()),
            ),
        }
    }
}

#[derive(Debug)]
pub struct ApiErrorResponse {
    pub status: StatusCode,
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let body = serde_json::to_string(&self.error).unwrap_or_default();
        (self.status, [("content-type", "application/json")], body).into_response()
    }
}

impl From<(StatusCode, ApiError)> for ApiErrorResponse {
    fn from((status, error): (StatusCode, ApiError)) -> Self {
        Self { status, error }
    }
}

impl From<DataError> for ApiErrorResponse {
    fn from(err: DataError) -> Self {
        ApiError::data_error(&err).into()
    }
}

impl From<CollectError> for ApiErrorResponse {
    fn from(err: CollectError) -> Self {
        ApiError::collect_error(&err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_new() {
        let err = ApiError::new("CODE", "message");
        assert_eq!(err.code, "CODE");
        assert!(!err.retryable);
        assert!(err.details.is_none());
    }

    #[test]
    fn api_error_json_serialization() {
        let err = ApiError::new("TEST", "test message").with_details(serde_json::json!({"a": 1}));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "TEST");
        assert_eq!(json["message"], "test message");
        assert_eq!(json["retryable"], false);
        assert_eq!(json["details"]["a"], 1);
    }

    #[test]
    fn no_data_maps_to_not_found() {
        let (status, err) = ApiError::data_error(&DataError::NoData);
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "NO_DATA");
    }

    #[test]
    fn invalid_file_name_maps_to_bad_request() {
        let (status, err) = ApiError::data_error(&DataError::InvalidFileName("../x".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "INVALID_FILE_NAME");
    }

    #[test]
    fn quota_maps_to_too_many_requests() {
        let (status, err) = ApiError::collect_error(&CollectError::QuotaExceeded);
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.code, "QUOTA_EXCEEDED");
        assert!(err.retryable);
    }

    #[test]
    fn already_running_maps_to_bad_request() {
        let (status, err) = ApiError::collect_error(&CollectError::AlreadyRunning);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "EXTRACTION_RUNNING");
    }

    #[test]
    fn api_error_response_into_response() {
        let resp = ApiErrorResponse {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::new("BAD", "bad request"),
        };
        assert_eq!(resp.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
