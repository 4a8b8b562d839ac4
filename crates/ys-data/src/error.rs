#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("No data available for analysis")]
    NoData,
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Invalid file name: {0}")]
    InvalidFileName(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    pub fn error_code(&self) -> &'static str {
        match self {
            DataError::NoData => "NO_DATA",
            DataError::NotFound(_) => "FILE_NOT_FOUND",
            DataError::InvalidFileName(_) => "INVALID_FILE_NAME",
            DataError::Csv(_) => "DATA_CSV_ERROR",
            DataError::Json(_) => "DATA_JSON_ERROR",
            DataError::Io(_) => "DATA_IO_ERROR",
        }
    }
}
