//! CLI module for Vett.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::servers::ServerKind;
use clap::{Parser, Subcommand};

/// Vett - Conversational Knowledge Assistant
///
/// A CLI assistant that answers questions using tool servers for web search,
/// YouTube transcripts, weather, and a local database. The name "Vett" comes
/// from the Norwegian word for "sense" or "wits."
#[derive(Parser, Debug)]
#[command(name = "vett")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Vett and verify system requirements
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Start an interactive chat session
    Chat {
        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Ask a single question and print the answer
    Ask {
        /// The question to ask
        question: String,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List the tools advertised by the configured servers
    Tools,

    /// Run a tool server over stdio (used by the chat session)
    Mcp {
        /// Which server to run (search, transcript, weather, database)
        server: ServerKind,
    },

    /// Host the weather tool server over HTTP
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
