//! Error types for the yedalm service

/// Errors that can occur in the yedalm service
#[derive(Debug, thiserror::Error)]
pub enum YedalmError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store error on '{collection}': {message}")]
    Store { collection: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Reorder rejected: {0}")]
    Reorder(String),

    #[error("Site error: {0}")]
    Site(String),
}

/// Result type alias for yedalm operations
pub type Result<T> = std::result::Result<T, YedalmError>;
