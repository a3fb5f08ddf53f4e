//! Configuration management for Vett.

mod settings;

pub use settings::{
    AgentSettings, DatabaseSettings, GeneralSettings, SearchSettings, ServerConfig,
    ServerSettings, Settings, TranscriptSettings, Transport, WeatherSettings,
};
