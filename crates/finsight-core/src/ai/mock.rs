//! Mock backend for testing
//!
//! Answers every prompt with the same canned text, or fails every call.
//! Counts calls so tests can assert the LLM was (or was not) consulted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::ChatBackend;

const DEFAULT_REPLY: &str = "Track every expense for a month, then set a budget for your \
                             largest category.";

/// Mock chat backend
#[derive(Clone)]
pub struct MockBackend {
    /// `None` makes every call fail
    reply: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Mock with a generic canned reply
    pub fn new() -> Self {
        Self::with_reply(DEFAULT_REPLY)
    }

    pub fn with_reply(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Mock whose every call returns an error
    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `complete` calls so far (shared between clones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(reply) if !reply.trim().is_empty() => Ok(reply.clone()),
            Some(_) => Err(Error::Llm("Empty response".into())),
            None => Err(Error::Llm("Mock backend configured to fail".into())),
        }
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_canned_reply_and_call_count() {
        let mock = MockBackend::with_reply("Save 20%.");
        let shared = mock.clone();
        assert_eq!(mock.complete("s", "p").await.unwrap(), "Save 20%.");
        assert_eq!(mock.complete("s", "p").await.unwrap(), "Save 20%.");
        assert_eq!(shared.calls(), 2);
    }

    #[tokio::test]
    async fn test_blank_reply_is_error() {
        let mock = MockBackend::with_reply("   ");
        assert!(matches!(mock.complete("s", "p").await, Err(Error::Llm(_))));
    }

    #[tokio::test]
    async fn test_failing() {
        let mock = MockBackend::failing();
        assert!(mock.complete("s", "p").await.is_err());
        assert_eq!(mock.calls(), 1);
    }
}
