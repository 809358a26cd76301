//! Client for an OpenAI-compatible chat-completions gateway.
//!
//! - [`messages`] -- request and response wire types.
//! - [`CompletionProvider`] -- the seam the pipeline depends on, so stage
//!   logic can be exercised against a scripted provider.
//! - [`GatewayClient`] -- the `reqwest` implementation.

pub mod client;
pub mod error;
pub mod messages;

use async_trait::async_trait;

pub use client::{GatewayClient, GatewayConfig};
pub use error::GatewayError;
pub use messages::{ChatCompletionRequest, ChatMessage, MessageContent, Role};

/// Something that can answer a chat-completions request with text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send `messages` and return the first choice's message content.
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, GatewayError>;
}
