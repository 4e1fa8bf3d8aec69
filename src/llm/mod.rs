use crate::error::Result;
use async_trait::async_trait;

#[cfg(feature = "http")]
pub mod client;
pub mod prompts;
pub mod types;

#[cfg(feature = "http")]
pub use client::*;
pub use prompts::*;
pub use types::*;

/// A chat model that turns a system and user prompt into raw response text.
///
/// The insight engine only depends on this trait, so tests can script
/// responses without a network.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}
