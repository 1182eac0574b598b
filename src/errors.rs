use thiserror::Error;

// Create a type alias for Result using our Error type
pub type Result<T> = std::result::Result<T, RateError>;

/// Error taxonomy for rate resolution.
///
/// Every variant carries plain strings so outcomes can be cloned into the
/// result memoization table and shared between concurrent callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Failed to retrieve '{url}': {cause}")]
    Retrieval { url: String, cause: String },

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Failed to parse number: {0}")]
    Parse(String),

    #[error("Rate resolution timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Internal failure: {0}")]
    Internal(String),
}

impl RateError {
    /// Whether this error maps to a client-error outcome at the boundary.
    /// Everything else is a server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, RateError::Validation(_))
    }
}
