use anyhow::Result;
use serde_json::Value;

use crate::buffer_utils::SseLineParser;
use crate::streaming::StreamEvent;

/// [`SseLineParser`] for the Messages stream
///
/// Tool calls are keyed by their content block index, which stays stable for
/// the lifetime of the block.
pub struct MessagesStreamParser;

impl SseLineParser for MessagesStreamParser {
    fn parse_data_line(&self, data: &str) -> Result<Vec<StreamEvent>> {
        let json: Value = serde_json::from_str(data)
            .map_err(|e| anyhow::anyhow!("Failed to parse Anthropic event: {}", e))?;
        parse_event(&json)
    }
}

fn parse_event(json: &Value) -> Result<Vec<StreamEvent>> {
    let event_type = json["type"].as_str().unwrap_or_default();
    let index = json["index"].as_u64().unwrap_or(0) as u32;

    let event = match event_type {
        "message_start" => json["message"]["id"]
            .as_str()
            .filter(|id| !id.is_empty())
            .map(|id| StreamEvent::Start { id: id.to_string() }),

        "content_block_start" => {
            let block = &json["content_block"];
            match block["type"].as_str() {
                Some("tool_use") => Some(StreamEvent::ToolCall {
                    index,
                    id: block["id"].as_str().map(str::to_string),
                    name: block["name"].as_str().map(str::to_string),
                    arguments: None,
                }),
                Some("text") => block["text"]
                    .as_str()
                    .filter(|t| !t.is_empty())
                    .map(|t| StreamEvent::Message { content: t.to_string() }),
                _ => None,
            }
        }

        "content_block_delta" => {
            let delta = &json["delta"];
            match delta["type"].as_str() {
                Some("text_delta") => delta["text"]
                    .as_str()
                    .filter(|t| !t.is_empty())
                    .map(|t| StreamEvent::Message { content: t.to_string() }),
                Some("thinking_delta") => delta["thinking"]
                    .as_str()
                    .map(|t| StreamEvent::Reasoning { content: t.to_string() }),
                Some("input_json_delta") => delta["partial_json"]
                    .as_str()
                    .filter(|p| !p.is_empty())
                    .map(|p| StreamEvent::ToolCall {
                        index,
                        id: None,
                        name: None,
                        arguments: Some(p.to_string()),
                    }),
                _ => None,
            }
        }

        "message_delta" => json["delta"]["stop_reason"]
            .as_str()
            .map(|reason| StreamEvent::Done {
                finish_reason: Some(reason.to_string()),
            }),

        "message_stop" => Some(StreamEvent::Done { finish_reason: None }),

        "error" => {
            let message = json["error"]["message"].as_str().unwrap_or("unknown error");
            anyhow::bail!("Anthropic stream error: {}", message);
        }

        _ => None,
    };

    Ok(event.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &str) -> Vec<StreamEvent> {
        MessagesStreamParser.parse_data_line(data).unwrap()
    }

    #[test]
    fn test_message_start() {
        let events = parse(r#"{"type":"message_start","message":{"id":"msg_01","role":"assistant","content":[]}}"#);
        assert_eq!(events, vec![StreamEvent::Start { id: "msg_01".to_string() }]);
    }

    #[test]
    fn test_text_delta() {
        let events = parse(r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hello"}}"#);
        assert_eq!(events, vec![StreamEvent::Message { content: "Hello".to_string() }]);
    }

    #[test]
    fn test_tool_use_block() {
        let start = parse(
            r#"{"type":"content_block_start","index":1,"content_block":{"type":"tool_use","id":"toolu_1","name":"web_search","input":{}}}"#,
        );
        assert_eq!(
            start,
            vec![StreamEvent::ToolCall {
                index: 1,
                id: Some("toolu_1".to_string()),
                name: Some("web_search".to_string()),
                arguments: None,
            }]
        );

        let delta = parse(
            r#"{"type":"content_block_delta","index":1,"delta":{"type":"input_json_delta","partial_json":"{\"query\":"}}"#,
        );
        assert_eq!(
            delta,
            vec![StreamEvent::ToolCall {
                index: 1,
                id: None,
                name: None,
                arguments: Some("{\"query\":".to_string()),
            }]
        );
    }

    #[test]
    fn test_stop_reason() {
        let events = parse(r#"{"type":"message_delta","delta":{"stop_reason":"end_turn"},"usage":{"output_tokens":5}}"#);
        assert_eq!(
            events,
            vec![StreamEvent::Done {
                finish_reason: Some("end_turn".to_string())
            }]
        );
    }

    #[test]
    fn test_ping_is_ignored() {
        assert!(parse(r#"{"type":"ping"}"#).is_empty());
    }

    #[test]
    fn test_error_event() {
        let err = MessagesStreamParser
            .parse_data_line(r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("Overloaded"));
    }
}
