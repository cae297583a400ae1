use serde::{Deserialize, Serialize};
use std::fmt;

use super::content::Content;
use super::tool::ToolCall;
use crate::traits::TokenUsage;

/// Discriminant of a [`Message`], also used as the wire `role` string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    System,
    Human,
    AIResponse,
    AIResponseChunk,
    ToolResult,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "System",
            Self::Human => "Human",
            Self::AIResponse => "AIResponse",
            Self::AIResponseChunk => "AIResponseChunk",
            Self::ToolResult => "ToolResult",
        }
    }

    pub fn is_ai(&self) -> bool {
        matches!(self, Self::AIResponse | Self::AIResponseChunk)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conversation message (provider-agnostic)
///
/// `AIResponseChunk` marks an AI turn that was assembled from a native token
/// stream; it is otherwise identical to `AIResponse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Message {
    System {
        id: String,
        content: Content,
    },

    Human {
        id: String,
        content: Content,
    },

    AIResponse(AiMessage),

    AIResponseChunk(AiMessage),

    ToolResult {
        id: String,
        tool_call_id: String,
        name: String,
        content: Content,
    },
}

/// Body shared by both AI message kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiMessage {
    pub id: String,

    #[serde(default)]
    pub content: Content,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

/// Generate a message id with the given prefix (`msg`, `human`, `tool`, ...)
pub fn new_message_id(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}

impl AiMessage {
    pub fn new(id: impl Into<String>, content: impl Into<Content>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            tool_calls: Vec::new(),
            metadata: None,
        }
    }

    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    pub fn with_metadata(mut self, metadata: ResponseMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl Message {
    /// Create system message
    pub fn system(content: impl Into<Content>) -> Self {
        Self::System {
            id: new_message_id("sys"),
            content: content.into(),
        }
    }

    /// Create human message
    pub fn human(content: impl Into<Content>) -> Self {
        Self::Human {
            id: new_message_id("human"),
            content: content.into(),
        }
    }

    /// Create a complete AI message with text
    pub fn ai(content: impl Into<Content>) -> Self {
        Self::AIResponse(AiMessage::new(new_message_id("msg"), content))
    }

    /// Create a complete AI message requesting tool calls
    pub fn ai_with_tools(content: impl Into<Content>, tool_calls: Vec<ToolCall>) -> Self {
        Self::AIResponse(AiMessage::new(new_message_id("msg"), content).with_tool_calls(tool_calls))
    }

    /// Create tool result message correlated to `tool_call_id`
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<Content>,
    ) -> Self {
        Self::ToolResult {
            id: new_message_id("tool"),
            tool_call_id: tool_call_id.into(),
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Self::System { .. } => MessageKind::System,
            Self::Human { .. } => MessageKind::Human,
            Self::AIResponse(_) => MessageKind::AIResponse,
            Self::AIResponseChunk(_) => MessageKind::AIResponseChunk,
            Self::ToolResult { .. } => MessageKind::ToolResult,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::System { id, .. } | Self::Human { id, .. } | Self::ToolResult { id, .. } => id,
            Self::AIResponse(ai) | Self::AIResponseChunk(ai) => &ai.id,
        }
    }

    pub fn content(&self) -> &Content {
        match self {
            Self::System { content, .. }
            | Self::Human { content, .. }
            | Self::ToolResult { content, .. } => content,
            Self::AIResponse(ai) | Self::AIResponseChunk(ai) => &ai.content,
        }
    }

    pub fn as_ai(&self) -> Option<&AiMessage> {
        match self {
            Self::AIResponse(ai) | Self::AIResponseChunk(ai) => Some(ai),
            _ => None,
        }
    }

    pub fn is_ai(&self) -> bool {
        self.kind().is_ai()
    }

    /// Tool calls requested by this message (empty for non-AI messages)
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.as_ai().map(|ai| ai.tool_calls.as_slice()).unwrap_or(&[])
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls().is_empty()
    }

    /// Role string exposed on the wire
    pub fn role(&self) -> &'static str {
        self.kind().as_str()
    }
}
