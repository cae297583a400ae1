use futures::StreamExt;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use weave_llm::{new_message_id, AiMessage, EventStream, ResponseMetadata, StreamEvent, ToolCall};
use weave_types::TurnEvent;

use crate::error::{GraphError, Result};

/// Outbound side of a turn's event channel
///
/// The first failed send (receiver dropped) latches the sink closed; every
/// later send is a no-op, so nothing is ever written to a gone consumer.
#[derive(Clone)]
pub struct EventSink {
    tx: Option<mpsc::Sender<TurnEvent>>,
    closed: Arc<AtomicBool>,
}

impl EventSink {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<TurnEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let sink = Self {
            tx: Some(tx),
            closed: Arc::new(AtomicBool::new(false)),
        };
        (sink, rx)
    }

    /// Sink for callers that only want the final result
    pub fn discard() -> Self {
        Self {
            tx: None,
            closed: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Returns whether the event was delivered
    pub async fn send(&self, event: TurnEvent) -> bool {
        if self.is_closed() {
            return false;
        }
        let Some(tx) = &self.tx else {
            return false;
        };

        if tx.send(event).await.is_err() {
            if !self.closed.swap(true, Ordering::AcqRel) {
                tracing::debug!("event consumer disconnected");
            }
            return false;
        }
        true
    }
}

#[derive(Default)]
struct ToolCallBuffer {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

/// Forward a native token stream as chunk events and assemble the AI message
///
/// Reasoning deltas are dropped. Every chunk carries the provider message id
/// (or a generated one when the provider sends none before its first delta).
/// The stream is drained even after the consumer leaves so the turn can still
/// be persisted.
pub async fn normalize_native(
    mut stream: EventStream,
    sink: &EventSink,
    thread_id: &str,
    model: &str,
) -> Result<AiMessage> {
    let mut id: Option<String> = None;
    let mut content = String::new();
    let mut tool_calls: BTreeMap<u32, ToolCallBuffer> = BTreeMap::new();
    let mut finish_reason = None;

    while let Some(event) = stream.next().await {
        match event.map_err(GraphError::provider)? {
            StreamEvent::Start { id: provider_id } => {
                if id.is_none() && !provider_id.is_empty() {
                    id = Some(provider_id);
                }
            }
            StreamEvent::Reasoning { .. } => {}
            StreamEvent::Message { content: delta } => {
                if delta.is_empty() {
                    continue;
                }
                let message_id = id.get_or_insert_with(|| new_message_id("msg")).clone();
                content.push_str(&delta);
                sink.send(TurnEvent::chunk(delta, message_id, thread_id)).await;
            }
            StreamEvent::ToolCall {
                index,
                id: call_id,
                name,
                arguments,
            } => {
                let buffer = tool_calls.entry(index).or_default();
                if let Some(call_id) = call_id {
                    buffer.id = Some(call_id);
                }
                if let Some(name) = name {
                    buffer.name = Some(name);
                }
                if let Some(arguments) = arguments {
                    buffer.arguments.push_str(&arguments);
                }
            }
            StreamEvent::Done { finish_reason: reason } => {
                finish_reason = reason;
                break;
            }
        }
    }

    let tool_calls: Vec<ToolCall> = tool_calls
        .into_values()
        .filter_map(|buffer| match (buffer.id, buffer.name) {
            (Some(id), Some(name)) => Some(ToolCall::new(id, name, buffer.arguments)),
            _ => {
                tracing::warn!("dropping incomplete streamed tool call");
                None
            }
        })
        .collect();

    let metadata = ResponseMetadata {
        model: Some(model.to_string()),
        finish_reason,
        usage: None,
    };

    Ok(AiMessage::new(id.unwrap_or_else(|| new_message_id("msg")), content)
        .with_tool_calls(tool_calls)
        .with_metadata(metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn events(items: Vec<StreamEvent>) -> EventStream {
        Box::pin(stream::iter(items.into_iter().map(Ok)))
    }

    #[tokio::test]
    async fn test_chunks_share_provider_id() {
        let (sink, mut rx) = EventSink::channel(16);
        let stream = events(vec![
            StreamEvent::Start { id: "chatcmpl-1".into() },
            StreamEvent::Reasoning { content: "thinking".into() },
            StreamEvent::Message { content: "Hel".into() },
            StreamEvent::Message { content: "lo".into() },
            StreamEvent::Done { finish_reason: Some("stop".into()) },
        ]);

        let message = normalize_native(stream, &sink, "t1", "gpt-4o").await.unwrap();
        drop(sink);

        assert_eq!(message.id, "chatcmpl-1");
        assert_eq!(message.content.to_plain_text(), "Hello");

        let mut chunks = Vec::new();
        while let Some(event) = rx.recv().await {
            chunks.push(event);
        }
        assert_eq!(
            chunks,
            vec![
                TurnEvent::chunk("Hel", "chatcmpl-1", "t1"),
                TurnEvent::chunk("lo", "chatcmpl-1", "t1"),
            ]
        );
    }

    #[tokio::test]
    async fn test_tool_call_fragments_assembled_in_index_order() {
        let sink = EventSink::discard();
        let stream = events(vec![
            StreamEvent::ToolCall {
                index: 1,
                id: Some("call_b".into()),
                name: Some("web_search".into()),
                arguments: Some("{\"query\":".into()),
            },
            StreamEvent::ToolCall {
                index: 0,
                id: Some("call_a".into()),
                name: Some("web_search".into()),
                arguments: Some("{}".into()),
            },
            StreamEvent::ToolCall {
                index: 1,
                id: None,
                name: None,
                arguments: Some("\"rust\"}".into()),
            },
            StreamEvent::Done { finish_reason: Some("tool_calls".into()) },
        ]);

        let message = normalize_native(stream, &sink, "t1", "gpt-4o").await.unwrap();

        assert_eq!(message.tool_calls.len(), 2);
        assert_eq!(message.tool_calls[0].id, "call_a");
        assert_eq!(message.tool_calls[1].function.arguments, "{\"query\":\"rust\"}");
        assert!(message.id.starts_with("msg_"));
    }

    #[tokio::test]
    async fn test_closed_sink_latches() {
        let (sink, rx) = EventSink::channel(4);
        drop(rx);

        assert!(!sink.send(TurnEvent::chunk("a", "m", "t")).await);
        assert!(sink.is_closed());
        assert!(!sink.send(TurnEvent::chunk("b", "m", "t")).await);
        assert!(EventSink::discard().is_closed());
    }

    #[tokio::test]
    async fn test_stream_error_is_provider_error() {
        let sink = EventSink::discard();
        let stream: EventStream = Box::pin(stream::iter(vec![
            Ok(StreamEvent::Message { content: "partial".into() }),
            Err(anyhow::anyhow!("connection reset")),
        ]));

        let err = normalize_native(stream, &sink, "t1", "gpt-4o").await.unwrap_err();
        assert!(matches!(err, GraphError::Provider { ref message, .. } if message.contains("connection reset")));
    }
}
