// Chat Completions transport shared by the OpenAI and DeepSeek families

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Map, Value};

use super::wire::{ChatCompletionsParser, CompletionResponse};
use crate::buffer_utils::parse_sse_stream;
use crate::config::ModelId;
use crate::traits::{ChatOptions, ChatRequest, ChatResponse, EventStream, ModelBackend};
use crate::types::{Content, ContentBlock, Message};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Message encoding differences between Chat Completions providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    OpenAI,
    /// Text-only content, no tools for the reasoner
    DeepSeek,
}

/// Chat Completions backend (HTTP direct, no SDK)
pub struct ChatCompletionsBackend {
    http_client: reqwest::Client,
    base_url: String,
    model: ModelId,
    dialect: Dialect,
}

impl ChatCompletionsBackend {
    /// OpenAI backend bound to `model`
    pub fn openai(model: ModelId, api_key: &str) -> Result<Self> {
        Self::new(model, api_key, OPENAI_API_BASE, Dialect::OpenAI)
    }

    pub fn new(model: ModelId, api_key: &str, base_url: &str, dialect: Dialect) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key)).context("Invalid API key format")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            dialect,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn provider_label(&self) -> &'static str {
        match self.dialect {
            Dialect::OpenAI => "OpenAI",
            Dialect::DeepSeek => "DeepSeek",
        }
    }

    /// Build chat completion request payload
    pub(crate) fn build_payload(&self, messages: &[Message], options: &ChatOptions, stream: bool) -> Result<Value> {
        let converted: Vec<Value> = messages
            .iter()
            .map(|msg| self.convert_message(msg))
            .collect::<Result<Vec<_>>>()?;

        let mut obj = Map::new();
        obj.insert("model".to_string(), json!(self.model.as_str()));
        obj.insert("messages".to_string(), Value::Array(converted));
        obj.insert("stream".to_string(), json!(stream));

        let reasoning = self.model.is_reasoning_openai();

        if let Some(temp) = options.temperature {
            if !reasoning {
                obj.insert("temperature".to_string(), json!(temp));
            }
        }
        if let Some(max_tokens) = options.max_tokens {
            let field = if reasoning { "max_completion_tokens" } else { "max_tokens" };
            obj.insert(field.to_string(), json!(max_tokens));
        }
        if self.model.supports_tools() {
            if let Some(tools) = options.active_tools() {
                obj.insert("tools".to_string(), serde_json::to_value(tools)?);
                if let Some(choice) = &options.tool_choice {
                    obj.insert("tool_choice".to_string(), json!(choice.as_str()));
                }
            }
        }

        Ok(Value::Object(obj))
    }

    fn convert_message(&self, message: &Message) -> Result<Value> {
        match message {
            Message::System { content, .. } => Ok(json!({
                "role": "system",
                "content": content.to_plain_text(),
            })),
            Message::Human { content, .. } => Ok(json!({
                "role": "user",
                "content": self.convert_content(content),
            })),
            Message::AIResponse(ai) | Message::AIResponseChunk(ai) => {
                let mut obj = Map::new();
                obj.insert("role".to_string(), json!("assistant"));

                let text = ai.content.to_plain_text();
                if ai.tool_calls.is_empty() || !text.is_empty() {
                    obj.insert("content".to_string(), json!(text));
                } else {
                    obj.insert("content".to_string(), Value::Null);
                }
                if !ai.tool_calls.is_empty() {
                    obj.insert("tool_calls".to_string(), serde_json::to_value(&ai.tool_calls)?);
                }

                Ok(Value::Object(obj))
            }
            Message::ToolResult {
                tool_call_id, content, ..
            } => Ok(json!({
                "role": "tool",
                "tool_call_id": tool_call_id,
                "content": content.to_plain_text(),
            })),
        }
    }

    /// Convert Content to the wire format (string or array of parts)
    fn convert_content(&self, content: &Content) -> Value {
        if self.dialect == Dialect::DeepSeek {
            return json!(content.to_plain_text());
        }

        match content {
            Content::Text(s) => json!(s),
            Content::Blocks(blocks) => {
                let parts: Vec<Value> = blocks
                    .iter()
                    .map(|block| match block {
                        ContentBlock::Text { text } | ContentBlock::File { text, .. } => json!({
                            "type": "text",
                            "text": text,
                        }),
                        ContentBlock::ImageUrl { image_url } => json!({
                            "type": "image_url",
                            "image_url": { "url": image_url.url },
                        }),
                    })
                    .collect();
                Value::Array(parts)
            }
        }
    }

    async fn post(&self, payload: &Value) -> Result<reqwest::Response> {
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .json(payload)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("{} API error ({}): {}", self.provider_label(), status, error_text);
        }

        Ok(response)
    }
}

#[async_trait]
impl ModelBackend for ChatCompletionsBackend {
    fn model(&self) -> ModelId {
        self.model
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = self.build_payload(&request.messages, &request.options, false)?;
        tracing::debug!(model = %self.model, "chat completion request");

        let response = self.post(&payload).await?;
        let raw: Value = response.json().await.context("Failed to parse response")?;
        let parsed: CompletionResponse =
            serde_json::from_value(raw.clone()).context("Unexpected response shape")?;

        let choice = parsed.choices.into_iter().next();
        let (content, tool_calls, finish_reason) = match choice {
            Some(choice) => (
                choice.message.content,
                choice.message.tool_calls.filter(|calls| !calls.is_empty()),
                choice.finish_reason,
            ),
            None => (None, None, None),
        };

        Ok(ChatResponse {
            id: parsed.id,
            content,
            tool_calls,
            usage: parsed.usage.map(Into::into),
            finish_reason,
            model: parsed.model,
            raw,
        })
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream> {
        let payload = self.build_payload(&request.messages, &request.options, true)?;
        tracing::debug!(model = %self.model, "chat completion stream request");

        let response = self.post(&payload).await?;
        Ok(parse_sse_stream(response, ChatCompletionsParser))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Tool, ToolCall};

    fn backend(model: ModelId) -> ChatCompletionsBackend {
        ChatCompletionsBackend::openai(model, "sk-test").unwrap()
    }

    #[test]
    fn test_payload_basic() {
        let options = ChatOptions::new().temperature(0.2).max_tokens(100);
        let payload = backend(ModelId::Gpt4oMini)
            .build_payload(&[Message::system("sys"), Message::human("hi")], &options, true)
            .unwrap();

        assert_eq!(payload["model"], "gpt-4o-mini");
        assert_eq!(payload["stream"], true);
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["role"], "user");
        assert_eq!(payload["messages"][1]["content"], "hi");
        assert_eq!(payload["max_tokens"], 100);
        assert!(payload.get("temperature").is_some());
    }

    #[test]
    fn test_payload_gpt5_parameters() {
        let options = ChatOptions::new().temperature(0.2).max_tokens(100);
        let payload = backend(ModelId::Gpt5).build_payload(&[Message::human("hi")], &options, false).unwrap();

        assert!(payload.get("temperature").is_none());
        assert!(payload.get("max_tokens").is_none());
        assert_eq!(payload["max_completion_tokens"], 100);
    }

    #[test]
    fn test_payload_tool_exchange() {
        let call = ToolCall::new("call_1", "web_search", r#"{"query":"rust"}"#);
        let messages = vec![
            Message::human("search"),
            Message::ai_with_tools("", vec![call]),
            Message::tool_result("call_1", "web_search", "results"),
        ];
        let options = ChatOptions::new().tools(vec![Tool::new("web_search", "search", json!({"type": "object"}))]);

        let payload = backend(ModelId::Gpt4o).build_payload(&messages, &options, false).unwrap();

        assert_eq!(payload["messages"][1]["content"], Value::Null);
        assert_eq!(payload["messages"][1]["tool_calls"][0]["id"], "call_1");
        assert_eq!(payload["messages"][2]["role"], "tool");
        assert_eq!(payload["messages"][2]["tool_call_id"], "call_1");
        assert_eq!(payload["tools"][0]["function"]["name"], "web_search");
    }

    #[test]
    fn test_payload_image_blocks() {
        let content = Content::blocks(vec![
            ContentBlock::text("look"),
            ContentBlock::image_url("data:image/png;base64,AAAA"),
        ]);
        let payload = backend(ModelId::Gpt4o)
            .build_payload(&[Message::human(content)], &ChatOptions::default(), false)
            .unwrap();

        let parts = &payload["messages"][0]["content"];
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/png;base64,AAAA");
    }
}
