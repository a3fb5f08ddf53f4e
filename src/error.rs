//! Error types for Vett.

use thiserror::Error;

/// Library-level error type for Vett operations.
#[derive(Error, Debug)]
pub enum VettError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tool protocol error: {0}")]
    Mcp(String),

    #[error("Tool server '{server}' error: {message}")]
    ToolServer { server: String, message: String },

    #[error("Search error: {0}")]
    Search(String),

    #[error("Transcript error: {0}")]
    Transcript(String),

    #[error("No transcript available for video: {0}")]
    TranscriptNotFound(String),

    #[error("Weather error: {0}")]
    Weather(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Agent error: {0}")]
    Agent(String),
}

impl VettError {
    /// Wrap a message as a tool server error.
    pub fn tool_server(server: &str, message: impl std::fmt::Display) -> Self {
        VettError::ToolServer {
            server: server.to_string(),
            message: message.to_string(),
        }
    }
}

/// Result type alias for Vett operations.
pub type Result<T> = std::result::Result<T, VettError>;
