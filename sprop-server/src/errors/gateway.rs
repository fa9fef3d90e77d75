#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("No broker session")]
    Disconnected,

    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("Failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
