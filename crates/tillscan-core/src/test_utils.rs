//! Test utilities for tillscan-core
//!
//! A mock model server speaking both the Ollama and the OpenAI-compatible
//! protocols, for backend tests and local development without a GPU.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::oneshot;

use crate::models::Category;

/// How the mock server answers generate/chat requests
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Pick the first keyword candidate named in the prompt, else "shopping"
    FromPrompt,
    /// Always answer with this text
    Fixed(String),
    /// Fail with this HTTP status
    Status(u16),
    /// Answer with this text after a delay
    Delayed(Duration, String),
}

struct MockState {
    reply: MockReply,
    requests: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

/// Mock model server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::start_with(MockReply::FromPrompt).await
    }

    /// Start the mock server with a specific reply behaviour
    pub async fn start_with(reply: MockReply) -> Self {
        let state = Arc::new(MockState {
            reply,
            requests: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        });

        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_chat))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of generate/chat requests received
    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// Most recent prompt received
    pub fn last_prompt(&self) -> Option<String> {
        self.state.last_prompt.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Ollama tags endpoint (health check)
async fn handle_tags() -> impl IntoResponse {
    Json(json!({ "models": [{ "name": "llama3.2:latest" }] }))
}

/// OpenAI models endpoint (health check)
async fn handle_models() -> impl IntoResponse {
    Json(json!({ "object": "list", "data": [{ "id": "mock-model" }] }))
}

async fn handle_generate(
    State(state): State<Arc<MockState>>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    match answer(&state, &request.prompt).await {
        Ok(text) => Json(GenerateResponse {
            model: request.model,
            response: text,
            done: true,
        })
        .into_response(),
        Err(status) => status.into_response(),
    }
}

async fn handle_chat(
    State(state): State<Arc<MockState>>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let prompt = request
        .messages
        .last()
        .map(|m| m.content.clone())
        .unwrap_or_default();

    match answer(&state, &prompt).await {
        Ok(text) => Json(json!({
            "model": request.model,
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": text } }]
        }))
        .into_response(),
        Err(status) => status.into_response(),
    }
}

async fn answer(state: &MockState, prompt: &str) -> Result<String, StatusCode> {
    state.requests.fetch_add(1, Ordering::SeqCst);
    *state.last_prompt.lock().unwrap() = Some(prompt.to_string());

    match &state.reply {
        MockReply::FromPrompt => Ok(reply_for_prompt(prompt)),
        MockReply::Fixed(text) => Ok(text.clone()),
        MockReply::Status(code) => {
            Err(StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
        }
        MockReply::Delayed(delay, text) => {
            tokio::time::sleep(*delay).await;
            Ok(text.clone())
        }
    }
}

/// Answer with the first keyword candidate listed in the prompt
fn reply_for_prompt(prompt: &str) -> String {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix("Possible categories based on keywords: "))
        .and_then(|candidates| {
            candidates
                .trim_end_matches('.')
                .split(',')
                .find_map(Category::from_label)
        })
        .unwrap_or(Category::Shopping)
        .as_str()
        .to_string()
}
