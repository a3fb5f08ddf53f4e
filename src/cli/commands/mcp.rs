//! Mcp command - run one tool server over stdio.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::mcp::run_stdio;
use crate::servers::{build_server, ServerKind};

/// Run a tool server speaking the tool protocol on stdin/stdout.
///
/// Diagnostics go to stderr; stdout carries only protocol messages.
pub async fn run_mcp(kind: ServerKind, settings: Settings) -> anyhow::Result<()> {
    // Missing key is not fatal here: the server still starts and reports
    // the problem as tool-call errors the model can read.
    if matches!(kind, ServerKind::Search) {
        if let Err(e) = preflight::check(Operation::SearchServer) {
            Output::warning(&format!("{}", e));
        }
    }

    let server = build_server(kind, &settings)?;
    run_stdio(server.as_ref()).await
}
