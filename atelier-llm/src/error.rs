use thiserror::Error;

/// Failures from the hosted model call. An empty reply is not an error (see
/// [`crate::FALLBACK_REPLY`]); these are transport and API-level problems.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("model request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model provider returned status {status}: {message}")]
    Api { status: u16, message: String },
}
