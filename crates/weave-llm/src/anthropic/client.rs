// Anthropic Messages API backend

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::{json, Map, Value};

use super::parser::MessagesStreamParser;
use crate::buffer_utils::parse_sse_stream;
use crate::config::{ModelId, ProviderFamily};
use crate::traits::{ChatOptions, ChatRequest, ChatResponse, EventStream, ModelBackend, TokenUsage};
use crate::types::{Content, ContentBlock, Message, ToolCall, ToolChoice};

pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

pub struct AnthropicBackend {
    http_client: reqwest::Client,
    base_url: String,
    model: ModelId,
}

impl AnthropicBackend {
    pub fn new(model: ModelId, api_key: &str) -> Result<Self> {
        if model.family() != ProviderFamily::Anthropic {
            anyhow::bail!("{} is not an Anthropic model", model);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_str(api_key).context("Invalid API key format")?,
        );
        headers.insert(
            HeaderName::from_static("anthropic-version"),
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: ANTHROPIC_API_BASE.to_string(),
            model,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub(crate) fn build_payload(&self, request: &ChatRequest, stream: bool) -> Result<Value> {
        let mut obj = Map::new();
        obj.insert("model".to_string(), json!(self.model.as_str()));
        obj.insert("messages".to_string(), Value::Array(convert_messages(&request.messages)?));
        obj.insert(
            "max_tokens".to_string(),
            json!(request.options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)),
        );
        obj.insert("stream".to_string(), json!(stream));

        if let Some(system) = request.system_prompt() {
            obj.insert("system".to_string(), json!(system));
        }
        if let Some(temp) = request.options.temperature {
            obj.insert("temperature".to_string(), json!(temp));
        }
        insert_tools(&mut obj, &request.options);

        Ok(Value::Object(obj))
    }

    async fn post(&self, payload: &Value) -> Result<reqwest::Response> {
        let response = self
            .http_client
            .post(format!("{}/messages", self.base_url))
            .json(payload)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API error ({}): {}", status, error_text);
        }

        Ok(response)
    }
}

fn insert_tools(obj: &mut Map<String, Value>, options: &ChatOptions) {
    let Some(tools) = options.active_tools() else {
        return;
    };

    let converted: Vec<Value> = tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.function.name,
                "description": tool.function.description.clone().unwrap_or_default(),
                "input_schema": tool.function.parameters,
            })
        })
        .collect();
    obj.insert("tools".to_string(), Value::Array(converted));

    if let Some(choice) = options.tool_choice {
        let kind = match choice {
            ToolChoice::Auto => "auto",
            ToolChoice::Required => "any",
            ToolChoice::None => "none",
        };
        obj.insert("tool_choice".to_string(), json!({ "type": kind }));
    }
}

/// Convert history to Messages API turns
///
/// System messages go to the top-level `system` field. Tool results ride in a
/// user turn, and consecutive turns of the same role are merged because the
/// API requires alternation.
fn convert_messages(messages: &[Message]) -> Result<Vec<Value>> {
    let mut turns: Vec<(&'static str, Vec<Value>)> = Vec::new();

    for message in messages {
        let (role, blocks) = match message {
            Message::System { .. } => continue,
            Message::Human { content, .. } => ("user", content_blocks(content)?),
            Message::AIResponse(ai) | Message::AIResponseChunk(ai) => {
                let mut blocks = content_blocks(&ai.content)?;
                for call in &ai.tool_calls {
                    blocks.push(json!({
                        "type": "tool_use",
                        "id": call.id,
                        "name": call.function.name,
                        "input": call.arguments_value().unwrap_or_else(|_| json!({})),
                    }));
                }
                ("assistant", blocks)
            }
            Message::ToolResult {
                tool_call_id, content, ..
            } => (
                "user",
                vec![json!({
                    "type": "tool_result",
                    "tool_use_id": tool_call_id,
                    "content": content.to_plain_text(),
                })],
            ),
        };

        if blocks.is_empty() {
            continue;
        }

        match turns.last_mut() {
            Some((last_role, last_blocks)) if *last_role == role => last_blocks.extend(blocks),
            _ => turns.push((role, blocks)),
        }
    }

    Ok(turns
        .into_iter()
        .map(|(role, content)| json!({ "role": role, "content": content }))
        .collect())
}

fn content_blocks(content: &Content) -> Result<Vec<Value>> {
    let text_block = |text: &str| json!({ "type": "text", "text": text });

    match content {
        Content::Text(text) if text.is_empty() => Ok(Vec::new()),
        Content::Text(text) => Ok(vec![text_block(text)]),
        Content::Blocks(blocks) => {
            let mut converted = Vec::with_capacity(blocks.len());
            for block in blocks {
                match block {
                    ContentBlock::Text { text } | ContentBlock::File { text, .. } => {
                        if !text.is_empty() {
                            converted.push(text_block(text));
                        }
                    }
                    ContentBlock::ImageUrl { image_url } => converted.push(image_block(&image_url.url)?),
                }
            }
            Ok(converted)
        }
    }
}

/// `data:<mime>;base64,<payload>` becomes a base64 source; anything else a URL source
fn image_block(url: &str) -> Result<Value> {
    let Some(rest) = url.strip_prefix("data:") else {
        return Ok(json!({
            "type": "image",
            "source": { "type": "url", "url": url },
        }));
    };

    let (meta, data) = rest.split_once(',').context("Invalid data URL")?;
    let media_type = meta.split(';').next().filter(|m| !m.is_empty()).unwrap_or("image/png");

    Ok(json!({
        "type": "image",
        "source": {
            "type": "base64",
            "media_type": media_type,
            "data": data,
        },
    }))
}

fn parse_response(raw: Value) -> ChatResponse {
    let mut text = String::new();
    let mut tool_calls = Vec::new();

    for block in raw["content"].as_array().into_iter().flatten() {
        match block["type"].as_str() {
            Some("text") => text.push_str(block["text"].as_str().unwrap_or_default()),
            Some("tool_use") => tool_calls.push(ToolCall::new(
                block["id"].as_str().unwrap_or_default(),
                block["name"].as_str().unwrap_or_default(),
                block["input"].to_string(),
            )),
            _ => {}
        }
    }

    let usage = raw["usage"].as_object().map(|u| {
        TokenUsage::new(
            u.get("input_tokens").and_then(Value::as_u64).unwrap_or(0) as u32,
            u.get("output_tokens").and_then(Value::as_u64).unwrap_or(0) as u32,
        )
    });

    ChatResponse {
        id: raw["id"].as_str().map(str::to_string),
        content: Some(text),
        tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
        usage,
        finish_reason: raw["stop_reason"].as_str().map(str::to_string),
        model: raw["model"].as_str().map(str::to_string),
        raw,
    }
}

#[async_trait]
impl ModelBackend for AnthropicBackend {
    fn model(&self) -> ModelId {
        self.model
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = self.build_payload(&request, false)?;
        tracing::debug!(model = %self.model, "anthropic messages request");

        let response = self.post(&payload).await?;
        let raw: Value = response.json().await.context("Failed to parse response")?;
        Ok(parse_response(raw))
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream> {
        let payload = self.build_payload(&request, true)?;
        tracing::debug!(model = %self.model, "anthropic messages stream request");

        let response = self.post(&payload).await?;
        Ok(parse_sse_stream(response, MessagesStreamParser))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tool;

    fn backend() -> AnthropicBackend {
        AnthropicBackend::new(ModelId::ClaudeSonnet45, "test-key").unwrap()
    }

    #[test]
    fn test_system_goes_to_top_level() {
        let request = ChatRequest::new("ignored", vec![Message::system("be brief"), Message::human("hi")]);
        let payload = backend().build_payload(&request, false).unwrap();

        assert_eq!(payload["system"], "be brief");
        assert_eq!(payload["max_tokens"], 4096);
        assert_eq!(payload["messages"].as_array().unwrap().len(), 1);
        assert_eq!(payload["messages"][0]["role"], "user");
        assert_eq!(payload["messages"][0]["content"][0]["text"], "hi");
    }

    #[test]
    fn test_tool_exchange_shape() {
        let call = ToolCall::new("toolu_1", "web_search", r#"{"query":"rust"}"#);
        let request = ChatRequest::new(
            "ignored",
            vec![
                Message::human("search"),
                Message::ai_with_tools("", vec![call]),
                Message::tool_result("toolu_1", "web_search", "found"),
            ],
        )
        .with_options(ChatOptions::new().tools(vec![Tool::new("web_search", "search", json!({"type": "object"}))]));

        let payload = backend().build_payload(&request, true).unwrap();
        let messages = payload["messages"].as_array().unwrap();

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[1]["content"][0]["type"], "tool_use");
        assert_eq!(messages[1]["content"][0]["input"]["query"], "rust");
        assert_eq!(messages[2]["role"], "user");
        assert_eq!(messages[2]["content"][0]["type"], "tool_result");
        assert_eq!(messages[2]["content"][0]["tool_use_id"], "toolu_1");
        assert_eq!(payload["tools"][0]["input_schema"]["type"], "object");
    }

    #[test]
    fn test_consecutive_user_turns_merge() {
        let request = ChatRequest::new("ignored", vec![Message::human("one"), Message::human("two")]);
        let payload = backend().build_payload(&request, false).unwrap();
        let messages = payload["messages"].as_array().unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["content"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_data_url_image() {
        let block = image_block("data:image/jpeg;base64,/9j/AAA").unwrap();
        assert_eq!(block["source"]["type"], "base64");
        assert_eq!(block["source"]["media_type"], "image/jpeg");
        assert_eq!(block["source"]["data"], "/9j/AAA");

        assert!(image_block("data:broken").is_err());
    }

    #[test]
    fn test_parse_response_with_tool_use() {
        let raw = json!({
            "id": "msg_1",
            "model": "claude-sonnet-4-5-20250929",
            "content": [
                {"type": "text", "text": "Let me look."},
                {"type": "tool_use", "id": "toolu_1", "name": "web_search", "input": {"query": "x"}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 10, "output_tokens": 4}
        });

        let response = parse_response(raw);
        assert_eq!(response.id.as_deref(), Some("msg_1"));
        assert_eq!(response.content.as_deref(), Some("Let me look."));
        let calls = response.tool_calls.unwrap();
        assert_eq!(calls[0].name(), "web_search");
        assert_eq!(calls[0].arguments_value().unwrap()["query"], "x");
        assert_eq!(response.usage.unwrap().total_tokens, 14);
    }

    #[test]
    fn test_rejects_other_families() {
        assert!(AnthropicBackend::new(ModelId::Gpt4o, "key").is_err());
    }
}
