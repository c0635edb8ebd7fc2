//! Gateway error taxonomy.
//!
//! Every failure in the request pipeline is raised as a typed [`GateError`]
//! variant at the point of failure and classified exactly once at the HTTP
//! boundary via [`GateError::status_code`]. No handler inspects error message
//! text to decide a status code.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = GateError> = std::result::Result<T, E>;

/// Typed errors for the chat gateway pipeline.
#[derive(Debug, Error)]
pub enum GateError {
    /// Request body failed validation (missing or empty required fields).
    #[error("{0}")]
    Validation(String),

    /// Non-POST request on the chat endpoint.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The quota configuration record is absent or malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Image download or encoding failed.
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    /// `OPENAI_API_KEY` is not set in the environment.
    #[error("OpenAI API key not configured")]
    CredentialMissing,

    /// The completion service reported a non-success outcome. The upstream
    /// message is passed through verbatim.
    #[error("{0}")]
    Upstream(String),

    /// The document store failed on the read path. Write failures are
    /// swallowed by the quota tracker and never surface as this variant.
    #[error("Database error while checking request limits: {0}")]
    Storage(String),

    /// Catch-all for failures outside the taxonomy.
    #[error("Internal server error: {0}")]
    Unknown(String),
}

impl GateError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::ImageProcessing(_) => 400,
            Self::MethodNotAllowed => 405,
            Self::Configuration(_)
            | Self::CredentialMissing
            | Self::Upstream(_)
            | Self::Storage(_)
            | Self::Unknown(_) => 500,
        }
    }
}
