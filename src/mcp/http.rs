//! HTTP transport for tool servers.
//!
//! Carries the same JSON-RPC envelope as the stdio transport over a single
//! POST endpoint, for servers that run as long-lived network processes
//! (the weather server by default).

use super::protocol::JsonRpcRequest;
use super::server::dispatch;
use crate::servers::ToolServer;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Serve a tool server over HTTP.
pub async fn serve_http(host: &str, port: u16, server: Arc<dyn ToolServer>) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/mcp", post(rpc))
        .layer(cors)
        .with_state(server.clone());

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        "'{}' tool server listening on http://{}/mcp",
        server.name(),
        addr
    );

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn rpc(
    State(server): State<Arc<dyn ToolServer>>,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    match dispatch(server.as_ref(), request).await {
        Some(response) => Json(response).into_response(),
        // Notifications are accepted but carry no response body.
        None => StatusCode::ACCEPTED.into_response(),
    }
}
