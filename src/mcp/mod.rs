//! Tool protocol for Vett (MCP-style JSON-RPC 2.0).
//!
//! Each capability (search, transcript, weather, database) is exposed as a
//! tool server speaking JSON-RPC 2.0, either over stdio (one JSON line per
//! message) or over HTTP (POST /mcp). The agent side connects with
//! [`Toolbox`], which aggregates the tools every configured server
//! advertises and routes calls to the owning server.

mod client;
mod http;
pub mod protocol;
mod server;

pub use client::{McpClient, Toolbox};
pub use http::serve_http;
pub use server::{dispatch, run_stdio};
