use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    #[error("Days must be between 1 and 365, got {0}")]
    InvalidDays(i64),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl SensorError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SensorError::InvalidDays(_) | SensorError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        }
    }
}
