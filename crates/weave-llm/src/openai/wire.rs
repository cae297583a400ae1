// Chat Completions response and stream chunk shapes

use anyhow::Result;
use serde::Deserialize;

use crate::buffer_utils::SseLineParser;
use crate::streaming::StreamEvent;
use crate::traits::TokenUsage;
use crate::types::ToolCall;

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<CompletionChoice>,
    #[serde(default)]
    pub usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionChoice {
    pub message: CompletionMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// DeepSeek reasoner only
    #[serde(default)]
    pub reasoning_content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl From<CompletionUsage> for TokenUsage {
    fn from(usage: CompletionUsage) -> Self {
        Self {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamChunk {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamChoice {
    #[serde(default)]
    pub delta: Delta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Delta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolCallDelta {
    pub index: u32,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<FunctionDelta>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FunctionDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

impl StreamChunk {
    fn to_stream_events(&self) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        let Some(choice) = self.choices.first() else {
            return events;
        };

        if choice.delta.role.is_some() {
            if let Some(id) = self.id.as_ref().filter(|id| !id.is_empty()) {
                events.push(StreamEvent::Start { id: id.clone() });
            }
        }

        if let Some(reasoning) = choice.delta.reasoning_content.as_ref().filter(|r| !r.is_empty()) {
            events.push(StreamEvent::Reasoning {
                content: reasoning.clone(),
            });
        }

        if let Some(content) = choice.delta.content.as_ref().filter(|c| !c.is_empty()) {
            events.push(StreamEvent::Message {
                content: content.clone(),
            });
        }

        for tc in choice.delta.tool_calls.iter().flatten() {
            events.push(StreamEvent::ToolCall {
                index: tc.index,
                id: tc.id.clone(),
                name: tc.function.as_ref().and_then(|f| f.name.clone()),
                arguments: tc.function.as_ref().and_then(|f| f.arguments.clone()),
            });
        }

        if let Some(finish_reason) = &choice.finish_reason {
            events.push(StreamEvent::Done {
                finish_reason: Some(finish_reason.clone()),
            });
        }

        events
    }
}

/// [`SseLineParser`] for Chat Completions streams (OpenAI and DeepSeek)
pub struct ChatCompletionsParser;

impl SseLineParser for ChatCompletionsParser {
    fn parse_data_line(&self, data: &str) -> Result<Vec<StreamEvent>> {
        let chunk: StreamChunk = serde_json::from_str(data)
            .map_err(|e| anyhow::anyhow!("Failed to parse chat chunk: {}", e))?;
        Ok(chunk.to_stream_events())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_chunk_carries_id() {
        let data = r#"{"id":"chatcmpl-1","choices":[{"index":0,"delta":{"role":"assistant","content":""},"finish_reason":null}]}"#;
        let events = ChatCompletionsParser.parse_data_line(data).unwrap();
        assert_eq!(events, vec![StreamEvent::Start { id: "chatcmpl-1".to_string() }]);
    }

    #[test]
    fn test_content_and_finish() {
        let data = r#"{"id":"chatcmpl-1","choices":[{"index":0,"delta":{"content":"Hi"},"finish_reason":"stop"}]}"#;
        let events = ChatCompletionsParser.parse_data_line(data).unwrap();
        assert_eq!(
            events,
            vec![
                StreamEvent::Message { content: "Hi".to_string() },
                StreamEvent::Done { finish_reason: Some("stop".to_string()) },
            ]
        );
    }

    #[test]
    fn test_tool_call_delta() {
        let data = r#"{"id":"c","choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"id":"call_1","type":"function","function":{"name":"web_search","arguments":"{\"q"}}]}}]}"#;
        let events = ChatCompletionsParser.parse_data_line(data).unwrap();
        assert_eq!(
            events,
            vec![StreamEvent::ToolCall {
                index: 0,
                id: Some("call_1".to_string()),
                name: Some("web_search".to_string()),
                arguments: Some("{\"q".to_string()),
            }]
        );
    }

    #[test]
    fn test_reasoning_delta() {
        let data = r#"{"id":"c","choices":[{"index":0,"delta":{"reasoning_content":"thinking"}}]}"#;
        let events = ChatCompletionsParser.parse_data_line(data).unwrap();
        assert_eq!(events, vec![StreamEvent::Reasoning { content: "thinking".to_string() }]);
    }

    #[test]
    fn test_usage_only_chunk_is_silent() {
        let data = r#"{"id":"c","choices":[],"usage":{"prompt_tokens":1,"completion_tokens":2,"total_tokens":3}}"#;
        assert!(ChatCompletionsParser.parse_data_line(data).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_chunk() {
        assert!(ChatCompletionsParser.parse_data_line("{not json").is_err());
    }
}
