//! Tillscan Web Server
//!
//! Axum-based REST API for receipt scanning and expense tracking.
//!
//! Security features:
//! - Optional bearer API-key authentication (enabled when keys are configured)
//! - Configurable CORS policy
//! - Upload size limit on receipt images
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use tillscan_core::{AppContext, ClassificationService};

mod handlers;

/// Maximum receipt image size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Authorization header for API key auth
const AUTHORIZATION_HEADER: &str = "authorization";

/// Shared application state
pub struct AppState {
    pub ctx: AppContext,
}

impl AppState {
    /// Authentication is required only when at least one key is configured
    fn require_auth(&self) -> bool {
        !self.ctx.config.server.api_keys.is_empty()
    }
}

/// Authentication middleware - validates a bearer API key
///
/// Keys are compared in constant time.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.require_auth() {
        return next.run(request).await;
    }

    let api_key_valid = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|key| validate_api_key(key.trim(), &state.ctx.config.server.api_keys))
        .unwrap_or(false);

    if api_key_valid {
        tracing::debug!(path = %request.uri().path(), "Authenticated via API key");
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Unauthorized request - no valid API key");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Validate an API key against the configured keys using constant-time comparison
fn validate_api_key(provided: &str, valid_keys: &[String]) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();

    valid_keys.iter().any(|key| {
        let key_bytes = key.as_bytes();
        // ct_eq short-circuits on length, which only leaks the key length
        provided_bytes.len() == key_bytes.len() && bool::from(provided_bytes.ct_eq(key_bytes))
    })
}

/// Generic success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub status: &'static str,
}

impl SuccessResponse {
    pub fn success() -> Self {
        Self { status: "success" }
    }
}

/// Create the application router
pub fn create_router(ctx: AppContext) -> Router {
    let static_dir = ctx.config.server.static_dir.clone();
    let allowed_origins = ctx.config.server.allowed_origins.clone();
    let state = Arc::new(AppState { ctx });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Classification
        .route("/classify", post(handlers::classify_expense))
        .route(
            "/classify_image",
            post(handlers::classify_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE)),
        )
        .route("/extract", post(handlers::extract_text))
        // Ledger
        .route("/save_expense", post(handlers::save_expense))
        .route("/get_expenses", get(handlers::get_expenses))
        // Insights
        .route("/recommendations", get(handlers::get_recommendations))
        .route("/summary", get(handlers::get_summary))
        .fallback(handlers::api_not_found);

    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let cors = if allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    // CSP: same-origin scripts, inline styles, blob: for receipt previews
    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' blob: data:; connect-src 'self'; frame-ancestors 'none'"
    );

    let mut app = Router::new()
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    // Serve the front end if a directory is configured
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server on the configured host and port
pub async fn serve(ctx: AppContext) -> anyhow::Result<()> {
    let addr = format!("{}:{}", ctx.config.server.host, ctx.config.server.port);

    if ctx.config.server.api_keys.is_empty() {
        warn!("Authentication disabled (no API keys configured) - do not expose to network!");
    }

    if let Some(ref dir) = ctx.config.server.static_dir {
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "Static directory not found, only the API is served");
        }
    }

    check_ai_connection(&ctx).await;

    let app = create_router(ctx);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log classification backend status
async fn check_ai_connection(ctx: &AppContext) {
    match ctx.ai() {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "AI backend connected: {} at {} (model: {})",
                    client.backend_name(),
                    client.host(),
                    client.model()
                );
            } else {
                warn!(
                    "AI backend configured but not responding: {} (model: {})",
                    client.host(),
                    client.model()
                );
            }
        }
        None => {
            info!("AI backend not configured (set OLLAMA_HOST to enable model fallback)");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Generic message to the client, full error in the log
            message: "An internal error occurred".to_string(),
            internal: Some(err.into()),
        }
    }
}
