use async_trait::async_trait;
use futures::future::join_all;
use std::time::Instant;
use weave_llm::Message;
use weave_tools::ToolRegistry;
use weave_types::{GraphState, TurnEvent};

use crate::error::Result;
use crate::node::{Node, NodeType};
use crate::streaming::EventSink;

/// Runs every tool call requested by the last AI message
///
/// Calls run concurrently; results are appended in request order. Any failure
/// fails the turn before a single result is appended.
pub struct ToolNode {
    registry: ToolRegistry,
}

impl ToolNode {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Node for ToolNode {
    async fn execute(&self, state: &mut GraphState, events: &EventSink) -> Result<()> {
        let tool_calls = state.pending_tool_calls();
        if tool_calls.is_empty() {
            return Ok(());
        }

        let runs = tool_calls.iter().map(|call| async move {
            let start = Instant::now();
            let result = self.registry.execute(call).await;
            (result, start.elapsed().as_millis() as u64)
        });
        let outcomes = join_all(runs).await;

        let mut results = Vec::with_capacity(outcomes.len());
        for (call, (result, duration_ms)) in tool_calls.iter().zip(outcomes) {
            match result {
                Ok(output) => results.push((call, output, duration_ms)),
                Err(e) => {
                    tracing::error!(tool = %call.name(), error = %e, "tool execution failed");
                    return Err(e.into());
                }
            }
        }

        for (call, output, duration_ms) in results {
            tracing::debug!(tool = %call.name(), duration_ms, "tool finished");
            state.add_message(Message::tool_result(call.id.as_str(), call.name(), output));
            events
                .send(TurnEvent::ToolResult {
                    tool_call_id: call.id.clone(),
                    name: call.name().to_string(),
                    duration_ms,
                })
                .await;
        }

        Ok(())
    }

    fn node_type(&self) -> NodeType {
        NodeType::Tool
    }
}
