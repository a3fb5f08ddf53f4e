//! Configuration settings for Vett.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub agent: AgentSettings,
    pub database: DatabaseSettings,
    pub search: SearchSettings,
    pub transcript: TranscriptSettings,
    pub weather: WeatherSettings,
    pub servers: ServerSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.vett".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Agent loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Chat model used for the agent loop.
    pub model: String,
    /// Maximum LLM round-trips per user message.
    pub max_iterations: usize,
    /// Maximum messages kept in conversation history (system prompt included).
    pub max_history_messages: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            max_iterations: 10,
            max_history_messages: 10,
        }
    }
}

/// Database server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Path to the SQLite database file.
    pub sqlite_path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            sqlite_path: "~/.vett/assistant.db".to_string(),
        }
    }
}

/// Web search (Tavily) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Search API endpoint.
    pub api_url: String,
    /// Default number of results per query.
    pub max_results: u32,
    /// Search depth (basic, advanced).
    pub search_depth: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.tavily.com/search".to_string(),
            max_results: 5,
            search_depth: "basic".to_string(),
        }
    }
}

/// Transcript retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Preferred caption languages, in order.
    pub languages: Vec<String>,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
        }
    }
}

/// Weather lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    /// Geocoding API endpoint (location name to coordinates).
    pub geocoding_url: String,
    /// Forecast API endpoint.
    pub forecast_url: String,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            geocoding_url: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
        }
    }
}

/// Transport used to reach a tool server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Spawn the server as a child process and speak JSON lines over stdio.
    #[default]
    Stdio,
    /// POST JSON-RPC requests to a running HTTP server.
    Http,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Stdio => write!(f, "stdio"),
            Transport::Http => write!(f, "http"),
        }
    }
}

/// How to reach one tool server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Whether the agent connects to this server at all.
    pub enabled: bool,
    /// Transport (stdio or http).
    pub transport: Transport,
    /// Command to spawn for stdio transport. Defaults to the current executable.
    pub command: Option<String>,
    /// Arguments for the spawned command.
    pub args: Vec<String>,
    /// Endpoint URL for http transport.
    pub url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            transport: Transport::Stdio,
            command: None,
            args: Vec::new(),
            url: None,
        }
    }
}

impl ServerConfig {
    /// Stdio config spawning this binary with `vett mcp <name>`.
    fn self_hosted(name: &str) -> Self {
        Self {
            args: vec!["mcp".to_string(), name.to_string()],
            ..Self::default()
        }
    }
}

/// Tool server connection map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub search: ServerConfig,
    pub transcript: ServerConfig,
    pub weather: ServerConfig,
    pub database: ServerConfig,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            search: ServerConfig::self_hosted("search"),
            transcript: ServerConfig::self_hosted("transcript"),
            weather: ServerConfig {
                transport: Transport::Http,
                url: Some("http://127.0.0.1:8000/mcp".to_string()),
                ..ServerConfig::default()
            },
            database: ServerConfig::self_hosted("database"),
        }
    }
}

impl ServerSettings {
    /// Iterate over (name, config) pairs in a stable order.
    pub fn entries(&self) -> Vec<(&'static str, &ServerConfig)> {
        vec![
            ("search", &self.search),
            ("transcript", &self.transcript),
            ("weather", &self.weather),
            ("database", &self.database),
        ]
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::VettError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vett")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.database.sqlite_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_map() {
        let settings = Settings::default();
        assert_eq!(settings.servers.search.transport, Transport::Stdio);
        assert_eq!(settings.servers.weather.transport, Transport::Http);
        assert_eq!(
            settings.servers.database.args,
            vec!["mcp".to_string(), "database".to_string()]
        );
        assert_eq!(settings.servers.entries().len(), 4);
    }

    #[test]
    fn test_settings_toml_roundtrip() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.agent.model, settings.agent.model);
        assert_eq!(parsed.servers.weather.url, settings.servers.weather.url);
    }
}
