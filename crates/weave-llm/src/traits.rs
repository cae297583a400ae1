use crate::config::{ModelId, ProviderFamily};
use crate::streaming::StreamEvent;
use crate::types::{new_message_id, AiMessage, Message, ResponseMetadata, Tool, ToolCall, ToolChoice};
use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// Uniform interface to one model on one provider family
///
/// Implementations keep no state between calls beyond their own identity and
/// never retry; failures carry the original cause.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Model this backend is bound to
    fn model(&self) -> ModelId;

    fn family(&self) -> ProviderFamily {
        self.model().family()
    }

    /// Whether the backend delivers incremental deltas
    fn supports_streaming(&self) -> bool {
        self.model().supports_streaming()
    }

    /// Non-streaming completion
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Streaming completion, terminated by a `Done` event
    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream>;
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    /// Concatenated text of all system messages
    pub fn system_prompt(&self) -> Option<String> {
        let parts: Vec<String> = self
            .messages
            .iter()
            .filter(|m| matches!(m, Message::System { .. }))
            .map(|m| m.content().to_plain_text())
            .filter(|t| !t.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub tools: Option<Vec<Tool>>,
    pub tool_choice: Option<ToolChoice>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    /// Tools to send, `None` when the list is absent or empty
    pub fn active_tools(&self) -> Option<&[Tool]> {
        self.tools.as_deref().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Provider-assigned message id
    pub id: Option<String>,
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
    pub model: Option<String>,
    pub raw: serde_json::Value,
}

impl ChatResponse {
    /// Convert into a complete AI message, generating an id when the provider sent none
    pub fn into_message(self) -> Message {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| new_message_id("msg"));

        let metadata = ResponseMetadata {
            model: self.model,
            finish_reason: self.finish_reason,
            usage: self.usage,
        };

        Message::AIResponse(
            AiMessage::new(id, self.content.unwrap_or_default())
                .with_tool_calls(self.tool_calls.unwrap_or_default())
                .with_metadata(metadata),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}
