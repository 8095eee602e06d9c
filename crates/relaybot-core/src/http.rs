use std::any::Any;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use http_body_util::Full;
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::dispatch::dispatch_update;
use crate::handler::{self, MessageHandler};
use crate::provider::{ChatProvider, OpenAiProvider};
use crate::store::KvStore;
use crate::telegram::{self, Messenger, TelegramClient};

/// Shared state behind every request.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn KvStore>,
    pub provider: Arc<dyn ChatProvider>,
    pub messenger: Arc<dyn Messenger>,
    pub pipeline: Vec<Box<dyn MessageHandler>>,
}

impl AppState {
    /// Wire the live collaborators around the given store.
    pub fn new(config: AppConfig, store: Arc<dyn KvStore>) -> Self {
        let provider = Arc::new(OpenAiProvider::new(&config.openai));
        let messenger = Arc::new(TelegramClient::new(config.telegram.token.clone()));
        Self::with_components(config, store, provider, messenger)
    }

    /// Full control over the collaborators, used by tests.
    pub fn with_components(
        config: AppConfig,
        store: Arc<dyn KvStore>,
        provider: Arc<dyn ChatProvider>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            provider,
            messenger,
            pipeline: handler::default_pipeline(),
        }
    }
}

/// Build the HTTP router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/telegram/{token}/webhook", post(handle_webhook))
        .route("/init", get(handle_init))
        .route("/health", get(handle_health))
        .layer(CatchPanicLayer::custom(acknowledge_panic))
        .with_state(state)
}

/// POST /telegram/{token}/webhook
///
/// Telegram retries any non-2xx response, so faults after the token check
/// are reported in the body of a 200 rather than via the status code. The
/// body is taken as raw bytes and decoded lossily: a payload that is not
/// valid UTF-8 must reach the same path instead of being bounced by the
/// extractor.
async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    body: Bytes,
) -> (StatusCode, String) {
    if token != state.config.telegram.token {
        warn!("Webhook called with a mismatched token");
        return (StatusCode::NOT_FOUND, "Not Found".to_string());
    }

    let body = String::from_utf8_lossy(&body);
    match telegram::parse_webhook_update(&body) {
        Ok(update) => {
            dispatch_update(&state, update).await;
            (StatusCode::OK, "OK".to_string())
        }
        Err(e) => {
            error!("Failed to parse webhook body: {}", e);
            (StatusCode::OK, format!("ERROR: {}", e))
        }
    }
}

/// GET /init registers the webhook for the configured domain.
async fn handle_init(State(state): State<Arc<AppState>>) -> (StatusCode, String) {
    if state.config.telegram.webhook_domain.is_empty() {
        return (
            StatusCode::OK,
            "ERROR: webhook domain is not configured".to_string(),
        );
    }
    let webhook_url = format!(
        "https://{}/telegram/{}/webhook",
        state.config.telegram.webhook_domain, state.config.telegram.token
    );
    let client = TelegramClient::new(state.config.telegram.token.clone());
    match client.set_webhook(&webhook_url).await {
        Ok(()) => {
            info!(
                "Webhook registered for domain {}",
                state.config.telegram.webhook_domain
            );
            (StatusCode::OK, format!("Webhook registered: {}", webhook_url))
        }
        Err(e) => {
            error!("Webhook registration failed: {}", e);
            (StatusCode::OK, format!("ERROR: {}", e))
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    })
}

/// Turn a request-level panic into the generic acknowledgment, keeping the
/// body free of panic internals.
fn acknowledge_panic(err: Box<dyn Any + Send + 'static>) -> axum::http::Response<Full<Bytes>> {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("Request handler panicked: {}", detail);

    let mut response = axum::http::Response::new(Full::new(Bytes::from("ERROR: internal fault")));
    *response.status_mut() = StatusCode::OK;
    response
}

/// Bind and serve until the process is stopped.
pub async fn serve(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, router).await?;
    Ok(())
}
