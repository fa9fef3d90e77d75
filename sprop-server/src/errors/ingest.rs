/// Reasons a telemetry or status message is dropped. Never surfaced over HTTP.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("Payload is not a JSON object")]
    NotAnObject,

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Field {0} is not a number")]
    InvalidField(&'static str),
}
