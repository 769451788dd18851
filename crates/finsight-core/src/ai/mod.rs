//! Pluggable chat-completion backend
//!
//! The advisor asks one question per call and treats any error as a signal
//! to fall back to the rule table, so backends only need a single
//! operation.
//!
//! # Architecture
//!
//! - `ChatBackend` trait: the interface every backend implements
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Configuration
//!
//! The endpoint and model come from [`LlmConfig`]. The API key is only read
//! from `FINSIGHT_LLM_API_KEY`; without it there is no client and every chat
//! answer comes from the rules.

mod mock;
mod openai_compatible;

pub use mock::MockBackend;
pub use openai_compatible::OpenAICompatibleBackend;

use async_trait::async_trait;

use crate::config::{api_key_from_env, LlmConfig};
use crate::error::Result;

/// Interface for all chat backends
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one system + user message pair and return the reply text
    ///
    /// An empty reply is an error.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;

    /// Model name (for logging)
    fn model(&self) -> &str;

    /// Endpoint base URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete chat client
#[derive(Clone)]
pub enum AIClient {
    /// Any server speaking the OpenAI chat-completions API (Groq by default)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Canned replies for tests and offline demos
    Mock(MockBackend),
}

impl AIClient {
    /// Build a client from config plus the API key in the environment
    ///
    /// Returns None when no usable key is set.
    pub fn from_env(config: &LlmConfig) -> Option<Self> {
        let api_key = api_key_from_env()?;
        match OpenAICompatibleBackend::new(config, Some(&api_key)) {
            Ok(backend) => Some(AIClient::OpenAICompatible(backend)),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to build LLM client, using rule-based advice");
                None
            }
        }
    }

    /// Client backed by a mock that always answers `reply`
    pub fn mock(reply: &str) -> Self {
        AIClient::Mock(MockBackend::with_reply(reply))
    }

    /// Client backed by a mock that always fails
    pub fn failing() -> Self {
        AIClient::Mock(MockBackend::failing())
    }
}

#[async_trait]
impl ChatBackend for AIClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        match self {
            AIClient::OpenAICompatible(b) => b.complete(system, prompt).await,
            AIClient::Mock(b) => b.complete(system, prompt).await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}
