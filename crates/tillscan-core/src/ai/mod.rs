//! Pluggable classification service abstraction
//!
//! The resolver only needs "send a prompt, get a short label back". Backends
//! run against a local or self-hosted model server.
//!
//! # Architecture
//!
//! - `ClassificationService` trait: the seam the resolver depends on
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Selected by the `[ai]` config section, which environment variables override:
//! - `AI_BACKEND`: Backend to use (ollama, openai_compatible, mock, none). Default: ollama
//! - `OLLAMA_HOST` / `OLLAMA_MODEL`: Ollama server URL and model (default: llama3.2)
//! - `OPENAI_COMPATIBLE_HOST` / `OPENAI_COMPATIBLE_MODEL` / `OPENAI_COMPATIBLE_API_KEY`
//! - `TILLSCAN_AI_TIMEOUT_SECS`: Per-request timeout (default: 30)

mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;
pub mod types;

pub use mock::{MockBackend, MockResponse};
pub use ollama::{OllamaBackend, DEFAULT_OLLAMA_MODEL};
pub use openai_compatible::{OpenAICompatibleBackend, DEFAULT_OPENAI_MODEL};
pub use parsing::interpret_reply;
pub use types::*;

use async_trait::async_trait;
use tracing::warn;

use crate::config::AiConfig;
use crate::error::Result;

/// A generative service that answers a prompt with a short label
///
/// Errors cover network, auth, quota and timeout problems. An empty string is
/// a successful call with no usable answer.
#[async_trait]
pub trait ClassificationService: Send + Sync {
    /// Send a prompt and return the raw reply text
    async fn classify(&self, prompt: &str) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// OpenAI-compatible backend (Docker Model Runner, vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Build a client from the `[ai]` config section
    ///
    /// Returns `Ok(None)` when the selected backend has no host configured or
    /// the backend is explicitly disabled; classification then relies on
    /// keywords and the fallback ladder alone.
    pub fn from_config(config: &AiConfig) -> Result<Option<Self>> {
        let backend = config.backend.to_lowercase();
        let host = config.host.as_deref().filter(|h| !h.trim().is_empty());

        match backend.as_str() {
            "none" | "disabled" | "off" => Ok(None),
            "mock" => Ok(Some(AIClient::Mock(MockBackend::new()))),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                let Some(host) = host else {
                    return Ok(None);
                };
                let model = config.model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL);
                let mut backend = OpenAICompatibleBackend::new(host, model, config.timeout)?;
                if let Some(ref key) = config.api_key {
                    backend = backend.with_api_key(key.clone());
                }
                Ok(Some(AIClient::OpenAICompatible(backend)))
            }
            other => {
                if other != "ollama" {
                    warn!(backend = %other, "Unknown AI backend, falling back to ollama");
                }
                let Some(host) = host else {
                    return Ok(None);
                };
                let model = config.model.as_deref().unwrap_or(DEFAULT_OLLAMA_MODEL);
                Ok(Some(AIClient::Ollama(OllamaBackend::new(
                    host,
                    model,
                    config.timeout,
                )?)))
            }
        }
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str, timeout: std::time::Duration) -> Result<Self> {
        Ok(AIClient::Ollama(OllamaBackend::new(host, model, timeout)?))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        match self {
            AIClient::Ollama(b) => AIClient::Ollama(b.with_model(model)),
            AIClient::OpenAICompatible(b) => AIClient::OpenAICompatible(b.with_model(model)),
            AIClient::Mock(b) => AIClient::Mock(b.with_model(model)),
        }
    }

    /// Short backend name for display
    pub fn backend_name(&self) -> &'static str {
        match self {
            AIClient::Ollama(_) => "ollama",
            AIClient::OpenAICompatible(_) => "openai_compatible",
            AIClient::Mock(_) => "mock",
        }
    }

    /// Probe the backend and describe it
    pub async fn status(&self) -> ServiceStatus {
        ServiceStatus {
            backend: self.backend_name().to_string(),
            model: self.model().to_string(),
            host: self.host().to_string(),
            healthy: self.health_check().await,
        }
    }
}

// Implement ClassificationService for AIClient by delegating to the inner backend
#[async_trait]
impl ClassificationService for AIClient {
    async fn classify(&self, prompt: &str) -> Result<String> {
        match self {
            AIClient::Ollama(b) => b.classify(prompt).await,
            AIClient::OpenAICompatible(b) => b.classify(prompt).await,
            AIClient::Mock(b) => b.classify(prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}
