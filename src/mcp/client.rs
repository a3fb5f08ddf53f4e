//! Tool protocol client: transports, handshake, and the tool router.

use super::protocol::*;
use crate::config::{ServerConfig, Settings, Transport};
use crate::error::{Result, VettError};
use serde_json::{json, Value};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

const CLIENT_NAME: &str = "vett";
const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Connection to one tool server.
#[derive(Debug)]
enum Connection {
    Stdio {
        // Held so the child is killed when the client drops.
        _child: Child,
        stdin: ChildStdin,
        lines: Lines<BufReader<ChildStdout>>,
    },
    Http {
        client: reqwest::Client,
        url: String,
    },
}

/// Client for a single tool server.
///
/// Requests are serial per connection: the stdio transport pairs each
/// request line with the next response line.
#[derive(Debug)]
pub struct McpClient {
    server_name: String,
    connection: Connection,
    next_id: u64,
}

impl McpClient {
    /// Connect to a tool server and perform the initialize handshake.
    pub async fn connect(name: &str, config: &ServerConfig) -> Result<Self> {
        let connection = match config.transport {
            Transport::Stdio => Self::spawn_stdio(config)?,
            Transport::Http => {
                let url = config.url.clone().ok_or_else(|| {
                    VettError::Config(format!(
                        "server '{}' uses http transport but has no url configured",
                        name
                    ))
                })?;
                Connection::Http {
                    client: reqwest::Client::new(),
                    url,
                }
            }
        };

        let mut client = Self {
            server_name: name.to_string(),
            connection,
            next_id: 0,
        };

        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ClientCapabilities::default(),
            client_info: ClientInfo {
                name: CLIENT_NAME.to_string(),
                version: CLIENT_VERSION.to_string(),
            },
        };

        let result = client
            .request("initialize", Some(serde_json::to_value(params)?))
            .await?;
        let init: InitializeResult = serde_json::from_value(result)
            .map_err(|e| VettError::Mcp(format!("invalid initialize result: {}", e)))?;

        debug!(
            "Connected to '{}' ({} {})",
            name, init.server_info.name, init.server_info.version
        );

        client.notify("initialized", None).await?;

        Ok(client)
    }

    /// Spawn a stdio server as a child process.
    fn spawn_stdio(config: &ServerConfig) -> Result<Connection> {
        let command = match &config.command {
            Some(cmd) => std::path::PathBuf::from(cmd),
            // Default: the bundled servers live in this binary.
            None => std::env::current_exe()?,
        };

        let mut child = Command::new(&command)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                VettError::Mcp(format!("failed to spawn {}: {}", command.display(), e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| VettError::Mcp("child stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| VettError::Mcp("child stdout not captured".to_string()))?;

        Ok(Connection::Stdio {
            _child: child,
            stdin,
            lines: BufReader::new(stdout).lines(),
        })
    }

    /// Name of the server this client is connected to.
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Send a request and wait for its response.
    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        self.next_id += 1;
        let request = JsonRpcRequest::new(self.next_id, method, params);

        let response: JsonRpcResponse = match &mut self.connection {
            Connection::Stdio { stdin, lines, .. } => {
                let line = serde_json::to_string(&request)?;
                stdin.write_all(line.as_bytes()).await?;
                stdin.write_all(b"\n").await?;
                stdin.flush().await?;

                let reply = loop {
                    match lines.next_line().await? {
                        Some(line) if line.trim().is_empty() => continue,
                        Some(line) => break line,
                        None => {
                            return Err(VettError::Mcp(format!(
                                "server '{}' closed its stdout",
                                self.server_name
                            )))
                        }
                    }
                };

                serde_json::from_str(&reply)?
            }
            Connection::Http { client, url } => {
                client
                    .post(url.as_str())
                    .json(&request)
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?
            }
        };

        if let Some(err) = response.error {
            return Err(VettError::Mcp(format!(
                "'{}' returned error {}: {}",
                self.server_name, err.code, err.message
            )));
        }

        response
            .result
            .ok_or_else(|| VettError::Mcp("response missing result".to_string()))
    }

    /// Send a notification (no response expected).
    async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        let request = JsonRpcRequest::notification(method, params);

        match &mut self.connection {
            Connection::Stdio { stdin, .. } => {
                let line = serde_json::to_string(&request)?;
                stdin.write_all(line.as_bytes()).await?;
                stdin.write_all(b"\n").await?;
                stdin.flush().await?;
            }
            Connection::Http { client, url } => {
                client.post(url.as_str()).json(&request).send().await?;
            }
        }

        Ok(())
    }

    /// Fetch the tools this server advertises.
    pub async fn list_tools(&mut self) -> Result<Vec<Tool>> {
        let result = self.request("tools/list", None).await?;
        let list: ToolsListResult = serde_json::from_value(result)
            .map_err(|e| VettError::Mcp(format!("invalid tools/list result: {}", e)))?;
        Ok(list.tools)
    }

    /// Call a tool and return its text output.
    ///
    /// Tool-level failures (`isError`) become `ToolServer` errors so the
    /// caller can surface them as conversational text.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<String> {
        let params = json!({ "name": name, "arguments": arguments });
        let result = self.request("tools/call", Some(params)).await?;
        let call: ToolCallResult = serde_json::from_value(result)
            .map_err(|e| VettError::Mcp(format!("invalid tools/call result: {}", e)))?;

        let text = call.joined_text();
        if call.is_error == Some(true) {
            return Err(VettError::tool_server(&self.server_name, text));
        }
        Ok(text)
    }
}

/// One connected server plus the tools it advertised.
struct ServerEntry {
    name: String,
    client: tokio::sync::Mutex<McpClient>,
    tools: Vec<Tool>,
}

/// The agent's view of every connected tool server.
///
/// Tools are addressed by name; when two servers advertise the same tool
/// name, the server listed first in the configuration wins.
pub struct Toolbox {
    entries: Vec<ServerEntry>,
}

impl Toolbox {
    /// Connect to all enabled servers from the configuration.
    ///
    /// Servers that fail to connect are skipped with a warning so a session
    /// can still run with the remaining tools.
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let connections = settings
            .servers
            .entries()
            .into_iter()
            .filter(|(_, config)| config.enabled)
            .map(|(name, config)| async move {
                let result = async {
                    let mut client = McpClient::connect(name, config).await?;
                    let tools = client.list_tools().await?;
                    Ok::<_, VettError>((client, tools))
                }
                .await;
                (name, result)
            });

        let mut entries = Vec::new();
        for (name, result) in futures::future::join_all(connections).await {
            match result {
                Ok((client, tools)) => {
                    debug!("Server '{}' advertises {} tool(s)", name, tools.len());
                    entries.push(ServerEntry {
                        name: name.to_string(),
                        client: tokio::sync::Mutex::new(client),
                        tools,
                    });
                }
                Err(e) => {
                    warn!("Skipping server '{}': {}", name, e);
                }
            }
        }

        Ok(Self { entries })
    }

    /// True when no server connected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of the connected servers.
    pub fn server_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Per-server tool listing, for display.
    pub fn catalog(&self) -> Vec<(&str, &[Tool])> {
        self.entries
            .iter()
            .map(|e| (e.name.as_str(), e.tools.as_slice()))
            .collect()
    }

    /// All routable tools, first owner winning on name collisions.
    pub fn tools(&self) -> Vec<&Tool> {
        let mut seen = std::collections::HashSet::new();
        let mut tools = Vec::new();
        for entry in &self.entries {
            for tool in &entry.tools {
                if seen.insert(tool.name.as_str()) {
                    tools.push(tool);
                } else {
                    warn!(
                        "Tool '{}' from server '{}' shadowed by an earlier server",
                        tool.name, entry.name
                    );
                }
            }
        }
        tools
    }

    /// Route a tool call to the server that owns the tool.
    pub async fn call(&self, tool_name: &str, arguments: Value) -> Result<String> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.tools.iter().any(|t| t.name == tool_name))
            .ok_or_else(|| VettError::Agent(format!("Unknown tool: {}", tool_name)))?;

        let mut client = entry.client.lock().await;
        client.call_tool(tool_name, arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_http_transport_requires_url() {
        let config = ServerConfig {
            transport: Transport::Http,
            url: None,
            ..ServerConfig::default()
        };
        let err = McpClient::connect("weather", &config).await.unwrap_err();
        assert!(matches!(err, VettError::Config(_)));
    }
}
