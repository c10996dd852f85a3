use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Remote source error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Remote knowledge source errors.
///
/// Every variant is absorbed by the service adapter's local fallback.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Remote source is disabled or not configured")]
    Disabled,

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Conversation session errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("A question is already awaiting a response")]
    Busy,
}

/// Chart rendering backend errors
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Chart backend failed: {message}")]
    Backend { message: String },
}

/// Dataset loading errors
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid dataset: {message}")]
    Invalid { message: String },
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Backend {
            message: err.to_string(),
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for remote source operations
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Result type alias for dataset operations
pub type DatasetResult<T> = Result<T, DatasetError>;
