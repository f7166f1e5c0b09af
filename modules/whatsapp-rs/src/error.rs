use thiserror::Error;

pub type Result<T> = std::result::Result<T, WhatsAppError>;

#[derive(Debug, Error)]
pub enum WhatsAppError {
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Media too large: over {max_bytes} bytes")]
    MediaTooLarge { max_bytes: usize },
}

impl From<reqwest::Error> for WhatsAppError {
    fn from(err: reqwest::Error) -> Self {
        WhatsAppError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for WhatsAppError {
    fn from(err: serde_json::Error) -> Self {
        WhatsAppError::Parse(err.to_string())
    }
}
