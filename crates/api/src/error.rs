use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Authentication failed ({status}): {message}")]
    AuthenticationFailed { status: u16, message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// The remote service rejected the request body. `message` is the
    /// response body exactly as received.
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    pub fn suggestion(&self) -> Option<&str> {
        match self {
            ApiError::AuthenticationFailed { status: 401, .. } => {
                Some("Check BITBUCKET_TOKEN (or the client id/secret used to mint it)")
            }
            ApiError::AuthenticationFailed { .. } => {
                Some("The credential lacks permission; user management needs APP_PASSWORD_BASE64")
            }
            ApiError::NotFound { .. } => Some("Check if the workspace, key or slug is correct"),
            ApiError::Rejected { .. } => Some("Review the values entered at the prompts"),
            ApiError::RequestFailed(_) => Some("Check your network connection or try again later"),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
