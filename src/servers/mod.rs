//! Tool servers for Vett.
//!
//! Each server exposes one external capability (web search, YouTube
//! transcripts, weather lookup, local database) as a set of tools behind
//! the tool protocol. Servers are transport-agnostic: the same
//! [`ToolServer`] runs over stdio (`vett mcp <server>`) or HTTP
//! (`vett serve`).

mod database;
mod search;
mod transcript;
mod weather;

pub use database::DatabaseServer;
pub use search::SearchServer;
pub use transcript::TranscriptServer;
pub use weather::WeatherServer;

use crate::config::Settings;
use crate::error::Result;
use crate::mcp::protocol::{Tool, ToolCallResult};
use async_trait::async_trait;
use serde_json::Value;

/// A tool server: advertises tools and executes calls against them.
///
/// Tool failures are reported through `ToolCallResult::error`, not `Err`,
/// so they reach the model as conversational text it can react to.
#[async_trait]
pub trait ToolServer: Send + Sync {
    /// Server name used in the initialize handshake.
    fn name(&self) -> &str;

    /// The tools this server advertises.
    fn tools(&self) -> Vec<Tool>;

    /// Execute a tool call.
    async fn call(&self, name: &str, args: Option<Value>) -> ToolCallResult;
}

/// The bundled tool servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerKind {
    Search,
    Transcript,
    Weather,
    Database,
}

impl std::str::FromStr for ServerKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "search" => Ok(ServerKind::Search),
            "transcript" => Ok(ServerKind::Transcript),
            "weather" => Ok(ServerKind::Weather),
            "database" | "db" => Ok(ServerKind::Database),
            _ => Err(format!(
                "Unknown server '{}'. Expected one of: search, transcript, weather, database",
                s
            )),
        }
    }
}

impl std::fmt::Display for ServerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerKind::Search => write!(f, "search"),
            ServerKind::Transcript => write!(f, "transcript"),
            ServerKind::Weather => write!(f, "weather"),
            ServerKind::Database => write!(f, "database"),
        }
    }
}

/// Build a tool server from the configuration.
pub fn build_server(kind: ServerKind, settings: &Settings) -> Result<Box<dyn ToolServer>> {
    Ok(match kind {
        ServerKind::Search => Box::new(SearchServer::new(&settings.search)),
        ServerKind::Transcript => Box::new(TranscriptServer::new(&settings.transcript)),
        ServerKind::Weather => Box::new(WeatherServer::new(&settings.weather)),
        ServerKind::Database => Box::new(DatabaseServer::open(&settings.sqlite_path())?),
    })
}

/// Extract a string argument.
pub(crate) fn arg_str<'a>(args: &'a Option<Value>, key: &str) -> Option<&'a str> {
    args.as_ref()?.get(key)?.as_str()
}

/// Extract an integer argument.
pub(crate) fn arg_u64(args: &Option<Value>, key: &str) -> Option<u64> {
    args.as_ref()?.get(key)?.as_u64()
}

/// Extract a signed integer argument.
pub(crate) fn arg_i64(args: &Option<Value>, key: &str) -> Option<i64> {
    args.as_ref()?.get(key)?.as_i64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_kind_from_str() {
        assert_eq!("search".parse::<ServerKind>().unwrap(), ServerKind::Search);
        assert_eq!("DB".parse::<ServerKind>().unwrap(), ServerKind::Database);
        assert!("math".parse::<ServerKind>().is_err());
    }

    #[test]
    fn test_arg_helpers() {
        let args = Some(json!({"query": "oslo", "limit": 3}));
        assert_eq!(arg_str(&args, "query"), Some("oslo"));
        assert_eq!(arg_u64(&args, "limit"), Some(3));
        assert_eq!(arg_str(&args, "missing"), None);
        assert_eq!(arg_str(&None, "query"), None);
    }
}
