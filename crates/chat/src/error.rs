use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChatError>;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("API key is not configured (set GOOGLE_API_KEY or GEMINI_API_KEY)")]
    MissingApiKey,

    /// Non-success status from the provider; `body` is the raw response text.
    #[error("API Error: {body}")]
    Provider { status: u16, body: String },

    #[error("Unexpected provider response: {0}")]
    MalformedResponse(String),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}
