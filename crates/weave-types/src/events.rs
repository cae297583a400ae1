use serde::{Deserialize, Serialize};
use weave_llm::MessageKind;

/// Event delivered to the consumer of a turn
///
/// Per turn the order is: at most one `ThreadId` (new threads only), zero or
/// more `Chunk` / `ToolResult`, then exactly one terminal `Done` or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    ThreadId {
        thread_id: String,
    },

    /// Incremental piece of the assistant reply
    Chunk {
        content: String,
        role: MessageKind,
        id: String,
        thread_id: String,
    },

    /// Tool execution finished (not forwarded to HTTP clients)
    ToolResult {
        tool_call_id: String,
        name: String,
        duration_ms: u64,
    },

    Done {
        thread_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        chat_name: Option<String>,
    },

    Error {
        error: String,
    },
}

impl TurnEvent {
    pub fn chunk(content: impl Into<String>, id: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self::Chunk {
            content: content.into(),
            role: MessageKind::AIResponseChunk,
            id: id.into(),
            thread_id: thread_id.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }

    /// Whether HTTP consumers see this event
    pub fn is_client_visible(&self) -> bool {
        !matches!(self, Self::ToolResult { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_wire_shape() {
        let json = serde_json::to_value(TurnEvent::chunk("Hi", "msg_1", "t1")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "chunk",
                "content": "Hi",
                "role": "AIResponseChunk",
                "id": "msg_1",
                "thread_id": "t1"
            })
        );
    }

    #[test]
    fn test_done_omits_missing_name() {
        let json = serde_json::to_value(TurnEvent::Done {
            thread_id: "t1".to_string(),
            chat_name: None,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"type": "done", "thread_id": "t1"}));
    }

    #[test]
    fn test_terminal() {
        assert!(TurnEvent::Error { error: "x".into() }.is_terminal());
        assert!(!TurnEvent::ThreadId { thread_id: "t".into() }.is_terminal());
    }
}
