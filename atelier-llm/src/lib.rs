pub mod client;
pub mod error;
pub mod prompt;

use async_trait::async_trait;
use atelier_database::model::chat::ChatMessage;

pub use client::GeminiClient;
pub use error::ProviderError;

/// Returned verbatim when the model produces no text, instead of failing
/// the request.
pub const FALLBACK_REPLY: &str =
    "I apologize, but I couldn't generate a response. Please try again.";

/// Stateless adapter over the hosted model. The full transcript is submitted
/// on every call; callers bound its length.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Produces the assistant reply to `user_message` given the prior
    /// `history` (oldest first, not including `user_message` itself).
    async fn generate(
        &self,
        user_message: &str,
        history: &[ChatMessage],
    ) -> Result<String, ProviderError>;
}
