use crate::config::LLMConfig;
use serde::{Deserialize, Serialize};
use weave_llm::{Message, ToolCall};

/// Working state of one turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphState {
    pub thread_id: String,
    pub run_id: String,
    /// Persisted history plus everything appended during this turn
    pub messages: Vec<Message>,
    pub llm_config: LLMConfig,
}

impl GraphState {
    pub fn new(thread_id: impl Into<String>, messages: Vec<Message>, llm_config: LLMConfig) -> Self {
        Self {
            thread_id: thread_id.into(),
            run_id: uuid::Uuid::new_v4().to_string(),
            messages,
            llm_config,
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Most recent AI message, if it is the tail of the history
    pub fn last_ai_message(&self) -> Option<&Message> {
        self.last_message().filter(|m| m.is_ai())
    }

    pub fn has_pending_tool_calls(&self) -> bool {
        self.last_message().is_some_and(Message::has_tool_calls)
    }

    pub fn pending_tool_calls(&self) -> Vec<ToolCall> {
        self.last_message()
            .map(|m| m.tool_calls().to_vec())
            .unwrap_or_default()
    }
}

/// How the caller wants the assistant reply delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Ordered chunk events, native or emulated
    Stream,
    /// One complete message
    Complete,
}

impl Delivery {
    pub fn from_flag(stream: bool) -> Self {
        if stream {
            Self::Stream
        } else {
            Self::Complete
        }
    }
}

/// Input of one turn
#[derive(Debug, Clone)]
pub struct TurnInput {
    /// `None` starts a new thread
    pub thread_id: Option<String>,
    /// Composed human message
    pub message: Message,
    pub llm_config: LLMConfig,
    pub delivery: Delivery,
}

impl TurnInput {
    pub fn new(message: Message, llm_config: LLMConfig, delivery: Delivery) -> Self {
        Self {
            thread_id: None,
            message,
            llm_config,
            delivery,
        }
    }

    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }
}

/// Result of a committed turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub thread_id: String,
    /// Final AI message of the turn
    pub message: Message,
    /// Set when this turn named a new thread
    pub chat_name: Option<String>,
    pub is_new_thread: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_tool_calls() {
        let mut state = GraphState::new("t1", vec![Message::human("hi")], LLMConfig::default());
        assert!(!state.has_pending_tool_calls());
        assert!(state.last_ai_message().is_none());

        state.add_message(Message::ai_with_tools("", vec![ToolCall::new("c1", "web_search", "{}")]));
        assert!(state.has_pending_tool_calls());
        assert_eq!(state.pending_tool_calls()[0].id, "c1");

        state.add_message(Message::tool_result("c1", "web_search", "ok"));
        assert!(!state.has_pending_tool_calls());
    }

    #[test]
    fn test_delivery_flag() {
        assert_eq!(Delivery::from_flag(true), Delivery::Stream);
        assert_eq!(Delivery::from_flag(false), Delivery::Complete);
    }
}
