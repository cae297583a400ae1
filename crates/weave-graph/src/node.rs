use async_trait::async_trait;
use weave_types::GraphState;

use crate::error::Result;
use crate::streaming::EventSink;

/// Unit of work in the turn graph
#[async_trait]
pub trait Node: Send + Sync {
    /// Run against the turn state, appending messages and emitting events
    async fn execute(&self, state: &mut GraphState, events: &EventSink) -> Result<()>;

    fn node_type(&self) -> NodeType;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    LLM,
    Tool,
}
