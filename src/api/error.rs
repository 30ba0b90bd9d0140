use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded with HTTP {0}")]
    Status(u16),

    /// The backend answered with `success: false`.
    #[error("{0}")]
    Rejected(String),

    #[error("response carried no data")]
    MissingData,

    #[error("invalid API URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("API URL cannot be used as a base: {0}")]
    NotABase(String),
}

impl ApiError {
    pub fn rejected(error: Option<String>, fallback: &str) -> Self {
        ApiError::Rejected(
            error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string()),
        )
    }
}
