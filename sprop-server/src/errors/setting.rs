use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum SettingError {
    #[error("Failed to store setting {0}")]
    StoreFailed(&'static str),
}

impl SettingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SettingError::StoreFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
