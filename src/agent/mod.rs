//! Conversational agent with tool calling.
//!
//! The agent wires an OpenAI chat model to the tools advertised by the
//! connected tool servers, looping until the model answers without
//! requesting another tool call.

mod runner;

pub use runner::{Agent, AgentResponse, ChatTurn, ToolCallRecord};
