//! Web search tool server (Tavily).

use super::{arg_str, arg_u64, ToolServer};
use crate::config::SearchSettings;
use crate::mcp::protocol::{Tool, ToolCallResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

const SERVER_NAME: &str = "search";

/// Tool server forwarding search queries to the Tavily API.
pub struct SearchServer {
    client: reqwest::Client,
    settings: SearchSettings,
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    include_answer: bool,
    max_results: u32,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    title: String,
    url: String,
    content: String,
    #[serde(default)]
    score: f64,
}

impl SearchServer {
    pub fn new(settings: &SearchSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings: settings.clone(),
        }
    }

    async fn tool_web_search(&self, args: Option<Value>) -> ToolCallResult {
        let Some(query) = arg_str(&args, "query") else {
            return ToolCallResult::error("Missing 'query' argument".to_string());
        };
        let max_results = arg_u64(&args, "max_results")
            .map(|n| n as u32)
            .unwrap_or(self.settings.max_results);

        let api_key = match std::env::var("TAVILY_API_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => {
                return ToolCallResult::error(
                    "TAVILY_API_KEY not set. Set it with: export TAVILY_API_KEY='tvly-...'"
                        .to_string(),
                )
            }
        };

        debug!("Searching for: {}", query);

        let request = TavilyRequest {
            api_key: &api_key,
            query,
            search_depth: &self.settings.search_depth,
            include_answer: true,
            max_results,
        };

        let response = match self
            .client
            .post(&self.settings.api_url)
            .json(&request)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return ToolCallResult::error(format!("Search request failed: {}", e)),
        };

        if !response.status().is_success() {
            return ToolCallResult::error(format!(
                "Search API returned status {}",
                response.status()
            ));
        }

        match response.json::<TavilyResponse>().await {
            Ok(body) => ToolCallResult::text(format_search_results(query, &body)),
            Err(e) => ToolCallResult::error(format!("Failed to parse search response: {}", e)),
        }
    }
}

#[async_trait]
impl ToolServer for SearchServer {
    fn name(&self) -> &str {
        SERVER_NAME
    }

    fn tools(&self) -> Vec<Tool> {
        vec![Tool {
            name: "web_search".to_string(),
            description: "Search the web for current information. \
                Use this for facts, news, and anything not in the conversation."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    },
                    "max_results": {
                        "type": "integer",
                        "description": "Maximum number of results (default: 5)"
                    }
                },
                "required": ["query"]
            }),
        }]
    }

    async fn call(&self, name: &str, args: Option<Value>) -> ToolCallResult {
        match name {
            "web_search" => self.tool_web_search(args).await,
            _ => ToolCallResult::error(format!("Unknown tool: {}", name)),
        }
    }
}

/// Render search results as readable text for the model.
fn format_search_results(query: &str, response: &TavilyResponse) -> String {
    if response.results.is_empty() && response.answer.is_none() {
        return format!("No results found for '{}'.", query);
    }

    let mut output = String::new();

    if let Some(answer) = &response.answer {
        if !answer.is_empty() {
            output.push_str(&format!("Answer: {}\n\n", answer));
        }
    }

    if !response.results.is_empty() {
        output.push_str(&format!("Results for '{}':\n\n", query));
        for (i, result) in response.results.iter().enumerate() {
            output.push_str(&format!(
                "{}. {} (score: {:.2})\n   {}\n   {}\n\n",
                i + 1,
                result.title,
                result.score,
                result.url,
                truncate(&result.content, 300)
            ));
        }
    }

    output.trim_end().to_string()
}

/// Truncate text with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchSettings;

    #[tokio::test]
    async fn test_missing_query_argument() {
        let server = SearchServer::new(&SearchSettings::default());
        let result = server.call("web_search", None).await;
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let server = SearchServer::new(&SearchSettings::default());
        let result = server.call("image_search", None).await;
        assert_eq!(result.is_error, Some(true));
        assert!(result.joined_text().contains("Unknown tool"));
    }

    #[test]
    fn test_format_search_results() {
        let response = TavilyResponse {
            answer: Some("Oslo is the capital of Norway.".to_string()),
            results: vec![TavilyResult {
                title: "Oslo - Wikipedia".to_string(),
                url: "https://en.wikipedia.org/wiki/Oslo".to_string(),
                content: "Oslo is the capital and most populous city of Norway.".to_string(),
                score: 0.97,
            }],
        };

        let text = format_search_results("capital of norway", &response);
        assert!(text.starts_with("Answer: Oslo is the capital"));
        assert!(text.contains("1. Oslo - Wikipedia"));
        assert!(text.contains("wikipedia.org"));
    }

    #[test]
    fn test_format_empty_results() {
        let response = TavilyResponse {
            answer: None,
            results: vec![],
        };
        let text = format_search_results("xyzzy", &response);
        assert!(text.contains("No results"));
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("blåbærsyltetøy", 6), "blåbær...");
        assert_eq!(truncate("kort", 10), "kort");
    }
}
