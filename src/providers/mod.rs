pub mod gemini;
pub mod registry;

use async_trait::async_trait;

use crate::error::Result;

pub use gemini::GeminiProvider;
pub use registry::ProviderRegistry;

/// A backend that turns a prompt into text for a given model identifier.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String>;
}
