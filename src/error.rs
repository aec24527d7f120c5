use thiserror::Error;

/// The only failure text ever shown to a user, whatever went wrong upstream.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch Pokemon data";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(#[from] std::io::Error),
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

/// Upstream API failures. Both kinds collapse to [`FETCH_FAILED_MESSAGE`]
/// for display; the reason is only meant for logs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("list request at offset {offset} failed: {reason}")]
    List { offset: u32, reason: String },

    #[error("detail request for {url} failed: {reason}")]
    Detail { url: String, reason: String },

    #[error("species request for {url} failed: {reason}")]
    Species { url: String, reason: String },
}

impl FetchError {
    pub fn user_message(&self) -> &'static str {
        FETCH_FAILED_MESSAGE
    }
}
