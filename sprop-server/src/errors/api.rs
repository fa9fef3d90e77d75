use super::{AuthError, SensorError, SettingError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Sensor error: {0}")]
    SensorError(#[from] SensorError),

    #[error("Setting error: {0}")]
    SettingError(#[from] SettingError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}
