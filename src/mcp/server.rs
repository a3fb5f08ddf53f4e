//! Tool server loops: shared request dispatch plus the stdio transport.

use super::protocol::*;
use crate::servers::ToolServer;
use std::io::{self, BufRead, Write};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Handle a single JSON-RPC request against a tool server.
///
/// Returns `None` for notifications, which must not be answered: on the
/// stdio transport an unsolicited response line would desynchronize the
/// client's request/response pairing.
pub async fn dispatch(server: &dyn ToolServer, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    if request.is_notification() {
        return None;
    }

    let response = match request.method.as_str() {
        "initialize" => handle_initialize(server, request.id),
        "tools/list" => handle_tools_list(server, request.id),
        "tools/call" => handle_tools_call(server, request.id, request.params).await,
        _ => JsonRpcResponse::error(
            request.id,
            -32601,
            &format!("Method not found: {}", request.method),
        ),
    };

    Some(response)
}

/// Run a tool server on stdin/stdout (one JSON line per message).
pub async fn run_stdio(server: &dyn ToolServer) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    // Log to stderr so it doesn't interfere with JSON-RPC
    eprintln!("Vett {} tool server starting...", server.name());

    for line in stdin.lock().lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }

        let request: JsonRpcRequest = match serde_json::from_str(&line) {
            Ok(req) => req,
            Err(e) => {
                eprintln!("Failed to parse request: {}", e);
                let response = JsonRpcResponse::error(None, -32700, "Parse error");
                writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
                stdout.flush()?;
                continue;
            }
        };

        if let Some(response) = dispatch(server, request).await {
            writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// Handle initialize request.
fn handle_initialize(server: &dyn ToolServer, id: Option<serde_json::Value>) -> JsonRpcResponse {
    let result = InitializeResult {
        protocol_version: PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: ToolsCapability {
                list_changed: false,
            },
        },
        server_info: ServerInfo {
            name: server.name().to_string(),
            version: SERVER_VERSION.to_string(),
        },
    };

    JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
}

/// Handle tools/list request.
fn handle_tools_list(server: &dyn ToolServer, id: Option<serde_json::Value>) -> JsonRpcResponse {
    let result = ToolsListResult {
        tools: server.tools(),
    };
    JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
}

/// Handle tools/call request.
async fn handle_tools_call(
    server: &dyn ToolServer,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> JsonRpcResponse {
    let params: ToolCallParams = match params {
        Some(p) => match serde_json::from_value(p) {
            Ok(params) => params,
            Err(e) => {
                return JsonRpcResponse::error(id, -32602, &format!("Invalid params: {}", e))
            }
        },
        None => return JsonRpcResponse::error(id, -32602, "Missing params"),
    };

    let result = server.call(&params.name, params.arguments).await;
    JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoServer;

    #[async_trait]
    impl ToolServer for EchoServer {
        fn name(&self) -> &str {
            "echo"
        }

        fn tools(&self) -> Vec<Tool> {
            vec![Tool {
                name: "echo".to_string(),
                description: "Echo the input".to_string(),
                input_schema: json!({"type": "object", "properties": {}}),
            }]
        }

        async fn call(&self, name: &str, args: Option<serde_json::Value>) -> ToolCallResult {
            match name {
                "echo" => ToolCallResult::text(
                    args.and_then(|a| a.get("text").and_then(|t| t.as_str().map(String::from)))
                        .unwrap_or_default(),
                ),
                _ => ToolCallResult::error(format!("Unknown tool: {}", name)),
            }
        }
    }

    #[tokio::test]
    async fn test_initialize_reports_server_info() {
        let req = JsonRpcRequest::new(1, "initialize", None);
        let resp = dispatch(&EchoServer, req).await.unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], "echo");
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let req = JsonRpcRequest::notification("initialized", None);
        assert!(dispatch(&EchoServer, req).await.is_none());
    }

    #[tokio::test]
    async fn test_tools_call_routes_to_server() {
        let req = JsonRpcRequest::new(
            2,
            "tools/call",
            Some(json!({"name": "echo", "arguments": {"text": "hei"}})),
        );
        let resp = dispatch(&EchoServer, req).await.unwrap();
        let result: ToolCallResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.joined_text(), "hei");
    }

    #[tokio::test]
    async fn test_unknown_method_is_rpc_error() {
        let req = JsonRpcRequest::new(3, "resources/list", None);
        let resp = dispatch(&EchoServer, req).await.unwrap();
        assert_eq!(resp.error.unwrap().code, -32601);
    }
}
