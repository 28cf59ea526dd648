pub mod gemini;

use crate::domain::error::Result;
use async_trait::async_trait;

pub use gemini::GeminiClient;

#[async_trait]
pub trait TextGenerator {
    /// Sends one prompt and returns the generated text payload.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
