//! Mock backend for testing
//!
//! Returns a configured reply without any network access and counts calls,
//! so tests can assert whether the classification service was consulted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::ClassificationService;

/// Reply the mock produces for every prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    /// Return this text verbatim
    Reply(String),
    /// Return an empty reply
    Empty,
    /// Fail as if the service were unreachable
    Fail,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self::Reply("shopping".to_string())
    }
}

/// Mock classification backend
///
/// Clones share the call counter and prompt log.
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    response: MockResponse,
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    /// Create a healthy mock that answers "shopping"
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Default::default()
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Default::default()
        }
    }

    /// Create a mock that answers every prompt with `reply`
    pub fn replying(reply: impl Into<String>) -> Self {
        Self::new().with_response(MockResponse::Reply(reply.into()))
    }

    /// Create a mock whose every call fails
    pub fn failing() -> Self {
        Self::new().with_response(MockResponse::Fail)
    }

    pub fn with_response(mut self, response: MockResponse) -> Self {
        self.response = response;
        self
    }

    /// Create a new instance with a different model (no-op for mock)
    pub fn with_model(&self, _model: &str) -> Self {
        self.clone()
    }

    /// Number of `classify` calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ClassificationService for MockBackend {
    async fn classify(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        match &self.response {
            MockResponse::Reply(text) => Ok(text.clone()),
            MockResponse::Empty => Ok(String::new()),
            MockResponse::Fail => Err(Error::Service("mock service unavailable".into())),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
