use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::spec::ToolSpec;

pub const TAVILY_API_BASE: &str = "https://api.tavily.com";
pub const WEB_SEARCH_TOOL: &str = "web_search";
const DEFAULT_MAX_RESULTS: u32 = 3;

/// Web search backed by the Tavily search API
pub struct WebSearchTool {
    http_client: reqwest::Client,
    base_url: String,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

impl WebSearchTool {
    pub fn new(api_key: &str) -> Result<Self, ToolError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| ToolError::execution(WEB_SEARCH_TOOL, format!("Invalid API key format: {}", e)))?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ToolError::execution(WEB_SEARCH_TOOL, e))?;

        Ok(Self {
            http_client,
            base_url: TAVILY_API_BASE.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    fn format_results(results: &[SearchResult]) -> String {
        if results.is_empty() {
            return "No results found.".to_string();
        }

        results
            .iter()
            .map(|r| format!("•Title: {}\n•URL: {}\n•Content: {}", r.title, r.url, r.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[async_trait]
impl ToolSpec for WebSearchTool {
    fn name(&self) -> &str {
        WEB_SEARCH_TOOL
    }

    fn description(&self) -> &str {
        "Search the web for up-to-date information. Returns the top results with title, URL and content."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query to look up on the web"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<String, ToolError> {
        let query = arguments["query"]
            .as_str()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ToolError::invalid_arguments(WEB_SEARCH_TOOL, "missing 'query'"))?;

        tracing::debug!(query = %query, "web search");

        let response = self
            .http_client
            .post(format!("{}/search", self.base_url))
            .json(&json!({
                "query": query,
                "max_results": self.max_results,
                "search_depth": "basic",
            }))
            .send()
            .await
            .map_err(|e| ToolError::execution(WEB_SEARCH_TOOL, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ToolError::execution(
                WEB_SEARCH_TOOL,
                format!("Tavily API error ({}): {}", status, text),
            ));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ToolError::execution(WEB_SEARCH_TOOL, e))?;

        let limit = self.max_results as usize;
        Ok(Self::format_results(&body.results[..body.results.len().min(limit)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_results() {
        let results = vec![
            SearchResult {
                title: "Rust".into(),
                url: "https://rust-lang.org".into(),
                content: "A language".into(),
            },
            SearchResult {
                title: "Tokio".into(),
                url: "https://tokio.rs".into(),
                content: "A runtime".into(),
            },
        ];

        let text = WebSearchTool::format_results(&results);
        assert!(text.starts_with("•Title: Rust\n•URL: https://rust-lang.org"));
        assert!(text.contains("\n\n•Title: Tokio"));
        assert_eq!(WebSearchTool::format_results(&[]), "No results found.");
    }

    #[test]
    fn test_definition() {
        let tool = WebSearchTool::new("tvly-test").unwrap();
        let def = tool.definition();
        assert_eq!(def.name(), "web_search");
        assert_eq!(def.function.parameters["required"][0], "query");
    }
}
