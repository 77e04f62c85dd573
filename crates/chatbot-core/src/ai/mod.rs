pub mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;

use crate::error::CompletionError;

/// Something that turns one user turn into the model's answer.
///
/// `Ok(None)` means the call succeeded but the payload held no candidate text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<Option<String>, CompletionError>;
}
