//! SSE transport for MCP server
//!
//! Implements MCP over HTTP with SSE for server-to-client events, plus plain
//! REST routes for the read queries.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, Request, StatusCode},
    middleware::{self, Next},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use jukugo_core::Level;
use jukugo_service::ServiceError;
use jukugo_storage::GraphStore;
use serde::Deserialize;
use tokio::sync::broadcast;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

use crate::transport::JsonRpcRequest;
use crate::McpServer;

/// Maximum request body size (1MB)
const MAX_BODY_SIZE: usize = 1024 * 1024;

const LOCAL_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://localhost:8080",
    "http://127.0.0.1:8080",
];

/// SSE transport state
pub struct SseState<S: GraphStore + ?Sized> {
    server: Arc<McpServer<S>>,
    event_tx: broadcast::Sender<String>,
    auth_token: Option<String>,
}

impl<S: GraphStore + ?Sized + 'static> SseState<S> {
    pub fn new(server: Arc<McpServer<S>>, auth_token: Option<String>) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            server,
            event_tx,
            auth_token,
        }
    }
}

/// Auth middleware - validates Bearer token if configured
async fn auth_middleware<S: GraphStore + ?Sized + 'static>(
    State(state): State<Arc<SseState<S>>>,
    headers: HeaderMap,
    request: Request<Body>,
    next: Next,
) -> Response {
    // Skip auth for health endpoint
    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    // If no auth token configured, allow all requests (localhost mode)
    let Some(expected_token) = &state.auth_token else {
        return next.run(request).await;
    };

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header.and_then(|auth| auth.strip_prefix("Bearer ")) {
        Some(token) if token == expected_token => next.run(request).await,
        Some(_) => (StatusCode::UNAUTHORIZED, "Invalid token").into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            "Missing or invalid Authorization header",
        )
            .into_response(),
    }
}

/// Create the SSE router
pub fn create_sse_router<S: GraphStore + ?Sized + 'static>(
    server: Arc<McpServer<S>>,
    auth_token: Option<String>,
) -> Router {
    let state = Arc::new(SseState::new(server, auth_token));

    // Restrictive CORS: only allow localhost origins
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin, _| {
            origin
                .to_str()
                .map(|o| LOCAL_ORIGINS.contains(&o))
                .unwrap_or(false)
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/sse", get(sse_handler::<S>))
        .route("/message", post(message_handler::<S>))
        .route("/health", get(health_handler))
        .route("/kanji/validate-compound", get(validate_handler::<S>))
        .route("/kanji/:kanji/compounds", get(compounds_handler::<S>))
        .route("/levels/:level/random", get(random_handler::<S>))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<S>,
        ))
        .with_state(state)
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
}

/// Health check endpoint
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "server": "jukugo-mcp",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// SSE endpoint for server-to-client events
async fn sse_handler<S: GraphStore + ?Sized + 'static>(
    State(state): State<Arc<SseState<S>>>,
) -> Sse<impl Stream<Item = Result<Event, std::convert::Infallible>>> {
    let mut rx = state.event_tx.subscribe();

    let initial_msg = serde_json::json!({
        "jsonrpc": "2.0",
        "method": "endpoint",
        "params": {
            "endpoint": "/message"
        }
    })
    .to_string();

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("endpoint").data(initial_msg));

        loop {
            match rx.recv().await {
                Ok(msg) => {
                    yield Ok(Event::default().event("message").data(msg));
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    tracing::warn!("SSE client lagged behind");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };

    Sse::new(stream)
}

/// Message endpoint for client requests
async fn message_handler<S: GraphStore + ?Sized + 'static>(
    State(state): State<Arc<SseState<S>>>,
    Json(request): Json<JsonRpcRequest>,
) -> Response {
    tracing::debug!("Received SSE request: {:?}", request.method);

    let Some(response) = state.server.handle_request(request).await else {
        return StatusCode::ACCEPTED.into_response();
    };

    // Also broadcast to SSE clients
    if let Ok(json) = serde_json::to_string(&response) {
        let _ = state.event_tx.send(json);
    }

    Json(response).into_response()
}

fn error_response(e: ServiceError) -> Response {
    let status = match e {
        ServiceError::InvalidInput(_) | ServiceError::Core(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
}

fn level_param(level: &str) -> Result<Level, Response> {
    level.parse().map_err(|e: jukugo_core::Error| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response()
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompoundsParams {
    max_level: Option<String>,
}

/// `GET /kanji/:kanji/compounds`. The path segment arrives percent-decoded.
async fn compounds_handler<S: GraphStore + ?Sized + 'static>(
    State(state): State<Arc<SseState<S>>>,
    Path(kanji): Path<String>,
    Query(params): Query<CompoundsParams>,
) -> Response {
    let queries = state.server.queries();
    let result = match params.max_level {
        Some(level) => match level_param(&level) {
            Ok(level) => queries.compounds_at_level(&kanji, level).await,
            Err(response) => return response,
        },
        None => queries.compounds_for_character(&kanji).await,
    };

    match result {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct ValidateParams {
    kanji: String,
    word: String,
    position: u32,
}

/// `GET /kanji/validate-compound?kanji=&word=&position=`
async fn validate_handler<S: GraphStore + ?Sized + 'static>(
    State(state): State<Arc<SseState<S>>>,
    Query(params): Query<ValidateParams>,
) -> Response {
    match state
        .server
        .queries()
        .validate_compound(&params.kanji, &params.word, params.position)
        .await
    {
        Ok(validation) => Json(validation).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct RandomParams {
    distractors: Option<usize>,
}

/// `GET /levels/:level/random`
async fn random_handler<S: GraphStore + ?Sized + 'static>(
    State(state): State<Arc<SseState<S>>>,
    Path(level): Path<String>,
    Query(params): Query<RandomParams>,
) -> Response {
    let level = match level_param(&level) {
        Ok(level) => level,
        Err(response) => return response,
    };
    let count = params
        .distractors
        .unwrap_or(state.server.settings().distractors);

    match state.server.queries().random_challenge(level, count).await {
        Ok(Some(challenge)) => Json(challenge).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": format!("No characters imported at level {}", level)
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Run the SSE server until `shutdown` resolves
pub async fn run_sse_server<S: GraphStore + ?Sized + 'static>(
    server: Arc<McpServer<S>>,
    addr: &str,
    auth_token: Option<String>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let router = create_sse_router(server, auth_token);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("MCP SSE server listening on {}", addr);
    tracing::info!("  SSE endpoint: http://{}/sse", addr);
    tracing::info!("  Message endpoint: http://{}/message", addr);
    tracing::info!("  Compounds: http://{}/kanji/{{kanji}}/compounds", addr);
    tracing::info!("  Health check: http://{}/health", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
