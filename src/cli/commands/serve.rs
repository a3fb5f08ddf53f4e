//! Serve command - host the weather tool server over HTTP.

use crate::cli::Output;
use crate::config::Settings;
use crate::mcp::serve_http;
use crate::servers::{build_server, ServerKind};
use std::sync::Arc;

/// Run the HTTP-hosted weather server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let server: Arc<dyn crate::servers::ToolServer> =
        Arc::from(build_server(ServerKind::Weather, &settings)?);

    Output::header("Vett Tool Server");
    println!();
    Output::success(&format!("Hosting '{}' on http://{}:{}", server.name(), host, port));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Tool protocol", "POST /mcp");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    serve_http(host, port, server).await
}
