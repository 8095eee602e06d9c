use thiserror::Error;

/// Errors from the key-value store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read from store: {0}")]
    Read(String),

    #[error("Failed to write to store: {0}")]
    Write(String),

    #[error("Failed to delete from store: {0}")]
    Delete(String),
}

/// Errors from the completion API client.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("No API key configured")]
    NoApiKey,
}

/// Errors from the messaging platform client.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Api(String),
}

/// Rejections from a per-conversation configuration update.
#[derive(Debug, Error)]
pub enum UserConfigError {
    #[error("Unsupported configuration key: {0}")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}
