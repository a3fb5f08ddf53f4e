//! Vett - Conversational Knowledge Assistant
//!
//! A CLI assistant that answers questions by routing tool calls to small
//! tool servers over a JSON-RPC tool protocol.
//!
//! The name "Vett" comes from the Norwegian word for "sense" or "wits."
//!
//! # Overview
//!
//! Vett lets you:
//! - Chat with an assistant that can search the web, fetch YouTube
//!   transcripts, look up the weather, and keep notes and tables in a
//!   local SQLite database
//! - Run each capability as a standalone tool server (stdio or HTTP)
//! - Persist whatever the assistant learns across sessions
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `mcp` - Tool protocol (JSON-RPC 2.0): client transports and server loops
//! - `servers` - The four tool servers (search, transcript, weather, database)
//! - `db` - SQLite store backing the database server
//! - `agent` - Tool-calling agent loop on the OpenAI chat API
//! - `cli` - Command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use vett::agent::Agent;
//! use vett::config::Settings;
//! use vett::mcp::Toolbox;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let toolbox = Toolbox::connect(&settings).await?;
//!     let agent = Agent::new(toolbox, &settings.agent);
//!
//!     let response = agent.run(&[], "What's the weather in Oslo?").await?;
//!     println!("{}", response.content);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod servers;

pub use error::{Result, VettError};
