//! OpenAI-compatible backend implementation
//!
//! Works with any server that implements the OpenAI chat completions API.
//! The default config points at Groq (`https://api.groq.com/openai`).
//!
//! One request per question: no retries. A non-2xx status, a body that does
//! not match the completions schema, or blank content all become
//! [`Error::Llm`], which the advisor treats as "use the rules instead".

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::ChatBackend;

/// OpenAI-compatible backend
///
/// ```rust,ignore
/// export FINSIGHT_LLM_API_KEY="gsk_..."
/// export FINSIGHT_LLM_BASE_URL="http://localhost:8000"   # optional, e.g. vLLM
/// export FINSIGHT_LLM_MODEL="llama3.2"                   # optional
/// ```
#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAICompatibleBackend {
    /// Create a backend from config; the client times out after `config.timeout`
    pub fn new(config: &LlmConfig, api_key: Option<&str>) -> Result<Self> {
        let http_client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.map(str::to_string),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

/// Chat message
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

/// Chat completion choice
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

/// Chat response message
#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ChatBackend for OpenAICompatibleBackend {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let mut req_builder = self.http_client.post(self.endpoint()).json(&request);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("API error {}: {}", status, body)));
        }

        let body = response.text().await?;
        let chat_response: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Llm(format!("Unexpected response shape: {}", e)))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(Error::Llm("Empty response".into()));
        }

        debug!(model = %self.model, chars = content.len(), "LLM response received");
        Ok(content)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockChatServer;
    use serde_json::json;
    use std::time::Duration;

    fn config(base_url: &str) -> LlmConfig {
        LlmConfig {
            base_url: base_url.to_string(),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_backend_new_trims_trailing_slash() {
        let backend = OpenAICompatibleBackend::new(&config("http://localhost:8000/"), None).unwrap();
        assert_eq!(backend.host(), "http://localhost:8000");
        assert_eq!(backend.model(), "mixtral-8x7b-32768");
        assert_eq!(backend.endpoint(), "http://localhost:8000/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_complete_sends_payload() {
        let server = MockChatServer::replying("  Cut dining out.  ").await;
        let backend = OpenAICompatibleBackend::new(&config(&server.url()), Some("sk-test")).unwrap();

        let reply = backend.complete("be helpful", "How do I save?").await.unwrap();
        assert_eq!(reply, "Cut dining out.");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer sk-test"));
        let body = &requests[0].body;
        assert_eq!(body["model"], "mixtral-8x7b-32768");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "be helpful");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "How do I save?");
    }

    #[tokio::test]
    async fn test_error_status_is_llm_error() {
        let server = MockChatServer::failing(500).await;
        let backend = OpenAICompatibleBackend::new(&config(&server.url()), None).unwrap();
        let err = backend.complete("s", "p").await.unwrap_err();
        assert!(matches!(err, Error::Llm(msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_llm_error() {
        let server = MockChatServer::start(200, json!({"unexpected": true})).await;
        let backend = OpenAICompatibleBackend::new(&config(&server.url()), None).unwrap();
        assert!(matches!(backend.complete("s", "p").await, Err(Error::Llm(_))));
    }

    #[tokio::test]
    async fn test_empty_content_is_llm_error() {
        let server = MockChatServer::start(200, json!({"choices": []})).await;
        let backend = OpenAICompatibleBackend::new(&config(&server.url()), None).unwrap();
        assert!(matches!(backend.complete("s", "p").await, Err(Error::Llm(_))));

        let server =
            MockChatServer::start(200, json!({"choices": [{"message": {"content": null}}]})).await;
        let backend = OpenAICompatibleBackend::new(&config(&server.url()), None).unwrap();
        assert!(matches!(backend.complete("s", "p").await, Err(Error::Llm(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_fails() {
        let cfg = LlmConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout: Duration::from_secs(2),
            ..LlmConfig::default()
        };
        let backend = OpenAICompatibleBackend::new(&cfg, None).unwrap();
        assert!(backend.complete("s", "p").await.is_err());
    }
}
