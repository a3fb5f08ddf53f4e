//! Agent runner with tool calling loop.

use crate::config::AgentSettings;
use crate::error::{Result, VettError};
use crate::mcp::Toolbox;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionObject,
};
use serde_json::Value;
use tracing::{debug, info};

/// Default system prompt for the agent.
const DEFAULT_SYSTEM_PROMPT: &str = r#"You have access to multiple tools that can help answer queries. Use them dynamically and efficiently based on the user's request.

You can use the database tools to store and retrieve persistent information:
- Key-Value operations: store_value, get_value, list_keys
- Notes operations: add_note, get_note, search_notes
- Table operations: create_table, list_tables, describe_table, insert_record, query_table, delete_table
- Record operations: update_record, delete_records

For custom tables, you can:
1. Create tables with create_table(table_name, schema)
2. Insert data with insert_record(table_name, fields, values)
3. Query data with query_table(table_name, conditions, limit)
4. Update data with update_record(table_name, set_clause, where_clause)
5. Delete records with delete_records(table_name, where_clause)

You are a helpful knowledge assistant. Maintain context across the conversation."#;

/// One completed user/assistant exchange.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub user: String,
    pub assistant: String,
}

/// Request timeout for the chat API. A tool-heavy turn can run long, but
/// a hung call should not stall the session forever.
const API_TIMEOUT_SECS: u64 = 120;

/// Chat API client with a request timeout applied.
fn create_client() -> async_openai::Client<OpenAIConfig> {
    let http_client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(API_TIMEOUT_SECS))
        .build()
        .expect("Failed to create HTTP client");

    async_openai::Client::with_config(OpenAIConfig::default()).with_http_client(http_client)
}

/// Agent that answers questions using the connected tool servers.
pub struct Agent {
    client: async_openai::Client<OpenAIConfig>,
    model: String,
    toolbox: Toolbox,
    max_iterations: usize,
    max_history_messages: usize,
    system_prompt: String,
}

impl Agent {
    /// Create a new agent over a set of connected servers.
    pub fn new(toolbox: Toolbox, settings: &AgentSettings) -> Self {
        Self {
            client: create_client(),
            model: settings.model.clone(),
            toolbox,
            max_iterations: settings.max_iterations,
            max_history_messages: settings.max_history_messages,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Set a custom system prompt.
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    /// Override the model from the configuration.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// The connected servers backing this agent.
    pub fn toolbox(&self) -> &Toolbox {
        &self.toolbox
    }

    /// Run the agent on a user message with prior conversation turns.
    pub async fn run(&self, history: &[ChatTurn], message: &str) -> Result<AgentResponse> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_prompt.clone())
                .build()
                .map_err(|e| VettError::Agent(e.to_string()))?
                .into(),
        ];

        for turn in history_window(history, self.max_history_messages) {
            messages.push(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(turn.user.clone())
                    .build()
                    .map_err(|e| VettError::Agent(e.to_string()))?
                    .into(),
            );
            messages.push(
                ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.assistant.clone())
                    .build()
                    .map_err(|e| VettError::Agent(e.to_string()))?
                    .into(),
            );
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(message.to_string())
                .build()
                .map_err(|e| VettError::Agent(e.to_string()))?
                .into(),
        );

        let tools = self.completion_tools();

        let mut iterations = 0;
        let mut tool_calls_made = Vec::new();

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(VettError::Agent(format!(
                    "Agent exceeded maximum iterations ({})",
                    self.max_iterations
                )));
            }

            debug!("Agent iteration {}", iterations);

            let mut request = CreateChatCompletionRequestArgs::default();
            request.model(&self.model).messages(messages.clone());
            if !tools.is_empty() {
                request.tools(tools.clone());
            }
            let request = request
                .build()
                .map_err(|e| VettError::Agent(e.to_string()))?;

            let response = self
                .client
                .chat()
                .create(request)
                .await
                .map_err(|e| VettError::OpenAI(format!("Agent API error: {}", e)))?;

            let choice = response
                .choices
                .first()
                .ok_or_else(|| VettError::Agent("No response from model".to_string()))?;

            let Some(tool_calls) = choice
                .message
                .tool_calls
                .as_ref()
                .filter(|calls| !calls.is_empty())
            else {
                return build_response(&choice.message.content, tool_calls_made, iterations);
            };

            // Add assistant message with tool calls to history
            let assistant_msg = ChatCompletionRequestAssistantMessageArgs::default()
                .tool_calls(tool_calls.clone())
                .build()
                .map_err(|e| VettError::Agent(e.to_string()))?;
            messages.push(assistant_msg.into());

            for tool_call in tool_calls {
                let record = self.execute_tool_call(tool_call).await;

                let tool_msg = ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(&tool_call.id)
                    .content(record.result.clone())
                    .build()
                    .map_err(|e| VettError::Agent(e.to_string()))?;
                messages.push(tool_msg.into());

                tool_calls_made.push(record);
            }
        }
    }

    /// Tool declarations for the chat completion request.
    fn completion_tools(&self) -> Vec<ChatCompletionTool> {
        self.toolbox
            .tools()
            .into_iter()
            .map(|tool| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: tool.name.clone(),
                    description: Some(tool.description.clone()),
                    parameters: Some(tool.input_schema.clone()),
                    strict: None,
                },
            })
            .collect()
    }

    /// Execute a single tool call and return a record of it.
    async fn execute_tool_call(&self, tool_call: &ChatCompletionMessageToolCall) -> ToolCallRecord {
        let name = &tool_call.function.name;
        let arguments = &tool_call.function.arguments;

        info!("Agent calling tool: {} with args: {}", name, arguments);

        let result = match parse_arguments(arguments) {
            Ok(args) => match self.toolbox.call(name, args).await {
                Ok(output) => output,
                Err(e) => format!("Tool error: {}", e),
            },
            Err(e) => format!("Failed to parse tool arguments: {}", e),
        };

        ToolCallRecord {
            name: name.clone(),
            arguments: arguments.clone(),
            result,
        }
    }
}

/// Parse the model's argument string, treating an empty string as no
/// arguments.
fn parse_arguments(arguments: &str) -> Result<Value> {
    if arguments.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    Ok(serde_json::from_str(arguments)?)
}

/// The most recent turns fitting the message cap.
///
/// The cap counts individual messages including the system prompt, so a
/// cap of 10 keeps the last four full turns.
fn history_window(history: &[ChatTurn], max_messages: usize) -> &[ChatTurn] {
    let max_turns = max_messages.saturating_sub(1) / 2;
    let skip = history.len().saturating_sub(max_turns);
    &history[skip..]
}

/// Build the final agent response.
fn build_response(
    content: &Option<String>,
    tool_calls: Vec<ToolCallRecord>,
    iterations: usize,
) -> Result<AgentResponse> {
    Ok(AgentResponse {
        content: content.clone().unwrap_or_default(),
        tool_calls,
        iterations,
    })
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final response content from the agent.
    pub content: String,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of iterations (LLM calls) used.
    pub iterations: usize,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(n: usize) -> ChatTurn {
        ChatTurn {
            user: format!("question {}", n),
            assistant: format!("answer {}", n),
        }
    }

    #[test]
    fn test_history_window() {
        let history: Vec<ChatTurn> = (0..8).map(turn).collect();

        // Cap of 10 messages: system + 4 turns
        let window = history_window(&history, 10);
        assert_eq!(window.len(), 4);
        assert_eq!(window[0].user, "question 4");
        assert_eq!(window[3].user, "question 7");

        // Short history fits entirely
        let window = history_window(&history[..2], 10);
        assert_eq!(window.len(), 2);

        assert!(history_window(&history, 1).is_empty());
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(
            parse_arguments(r#"{"location": "Oslo"}"#).unwrap(),
            serde_json::json!({"location": "Oslo"})
        );
        assert_eq!(
            parse_arguments("").unwrap(),
            serde_json::json!({})
        );
        assert!(parse_arguments("not json").is_err());
    }

    #[test]
    fn test_tool_call_record_display() {
        let record = ToolCallRecord {
            name: "get_weather".to_string(),
            arguments: r#"{"location": "Oslo"}"#.to_string(),
            result: "Clear sky".to_string(),
        };
        assert_eq!(format!("{}", record), r#"get_weather({"location": "Oslo"})"#);
    }
}
