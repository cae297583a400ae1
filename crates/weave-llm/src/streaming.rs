use serde::{Deserialize, Serialize};

/// Provider-neutral delta emitted by [`crate::ModelBackend::chat_stream`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// First event of a stream, carries the provider-assigned message id
    Start {
        id: String,
    },

    Reasoning {
        content: String,
    },

    Message {
        content: String,
    },

    ToolCall {
        index: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        arguments: Option<String>,
    },

    Done {
        #[serde(skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
    },
}

impl StreamEvent {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }
}
