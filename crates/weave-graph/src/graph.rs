use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use weave_context::{HistoryTrimmer, MessageCost};
use weave_llm::{Content, ContentBlock, ModelId};
use weave_persist::{DeleteReport, ThreadStore};
use weave_tools::ToolRegistry;
use weave_types::{ChatMode, Delivery, GraphConfig, GraphState, MetadataPatch, TurnEvent, TurnInput, TurnOutcome};

use crate::backend::BackendProvider;
use crate::builder::GraphBuilder;
use crate::emulation::ChunkEmulator;
use crate::error::{GraphError, Result};
use crate::locks::ThreadLocks;
use crate::machine::{transition, Effect, Signal, TurnState};
use crate::naming::ChatNamer;
use crate::node::Node;
use crate::nodes::{LLMNode, ToolNode};
use crate::streaming::EventSink;

const EVENT_BUFFER: usize = 256;

/// Conversation graph for one mode
///
/// Cheap to clone; clones share the store, the backends and the thread locks.
#[derive(Clone)]
pub struct Graph {
    pub(crate) mode: ChatMode,
    pub(crate) system_prompt: Arc<str>,
    pub(crate) tools: ToolRegistry,
    pub(crate) backends: Arc<dyn BackendProvider>,
    pub(crate) store: Arc<dyn ThreadStore>,
    pub(crate) locks: Arc<ThreadLocks>,
    pub(crate) config: GraphConfig,
    pub(crate) cost: Arc<dyn MessageCost>,
    pub(crate) naming_model: Option<ModelId>,
}

impl Graph {
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ThreadStore> {
        &self.store
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Fail fast when `model` has no usable backend
    ///
    /// Lets callers reject a turn before opening an event stream.
    pub fn check_model(&self, model: ModelId) -> Result<()> {
        self.backends.backend(model).map(|_| ())
    }

    /// Run a turn in the background and return its event stream
    ///
    /// A new thread's stream opens with `ThreadId`, even when the turn fails,
    /// and always ends with exactly one `Done` or `Error`. Dropping the
    /// receiver stops event delivery; the turn itself still completes and is
    /// persisted.
    pub fn spawn_run(&self, input: TurnInput) -> mpsc::Receiver<TurnEvent> {
        let (sink, rx) = EventSink::channel(EVENT_BUFFER);
        let graph = self.clone();

        tokio::spawn(async move {
            if let Err(e) = graph.run_with_sink(input, &sink).await {
                tracing::error!(mode = %graph.mode, error = %e, "turn failed");
                sink.send(TurnEvent::Error { error: e.to_string() }).await;
            }
        });

        rx
    }

    /// Delete a thread once no turn holds its lock
    ///
    /// A turn in progress commits first; its checkpoint and metadata are then
    /// removed together.
    pub async fn delete_thread(&self, thread_id: &str) -> Result<DeleteReport> {
        let _guard = self.locks.acquire(thread_id).await;
        Ok(self.store.delete_thread(thread_id).await?)
    }

    /// Run a turn to completion without emitting events
    pub async fn run(&self, input: TurnInput) -> Result<TurnOutcome> {
        self.run_with_sink(input, &EventSink::discard()).await
    }

    /// Run a turn, emitting `ThreadId` (new threads), chunks and a final `Done`
    ///
    /// Errors are returned, not emitted.
    pub async fn run_with_sink(&self, input: TurnInput, events: &EventSink) -> Result<TurnOutcome> {
        let started = Instant::now();

        let is_new_thread = input.thread_id.is_none();
        let thread_id = input
            .thread_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        if is_new_thread {
            events
                .send(TurnEvent::ThreadId {
                    thread_id: thread_id.clone(),
                })
                .await;
        }

        let backend = self.backends.backend(input.llm_config.model)?;
        let streaming = input.delivery == Delivery::Stream;
        let trimmer = HistoryTrimmer::new(self.config.history_budget, Arc::clone(&self.cost));
        let llm_node = LLMNode::new(backend, self.system_prompt.as_ref(), trimmer)
            .with_tools(self.tools.definitions())
            .with_timeout(self.config.model_timeout)
            .with_streaming(streaming);
        let tool_node = ToolNode::new(self.tools.clone());
        let user_text = first_text(input.message.content());

        tracing::info!(
            mode = %self.mode,
            thread_id = %thread_id,
            model = %input.llm_config.model.as_str(),
            new_thread = is_new_thread,
            native_streaming = llm_node.streams_natively(),
            "turn started"
        );

        let state = {
            let _guard = self.locks.acquire(&thread_id).await;

            let history = self
                .store
                .load_latest_checkpoint(&thread_id)
                .await?
                .map(|checkpoint| checkpoint.messages)
                .unwrap_or_default();

            let mut state = GraphState::new(thread_id.clone(), history, input.llm_config.clone());
            state.add_message(input.message);

            self.drive(&mut state, &llm_node, &tool_node, events).await?;

            self.store.save_checkpoint(&thread_id, state.messages.clone()).await?;
            self.store.upsert_metadata(&thread_id, MetadataPatch::turn()).await?;
            state
        };

        let reply = state
            .last_ai_message()
            .cloned()
            .ok_or_else(|| GraphError::InvalidTransition("turn ended without an AI reply".to_string()))?;
        let reply_text = reply.content().to_plain_text();

        if streaming && !llm_node.streams_natively() {
            ChunkEmulator::new(self.config.chunk_words, self.config.chunk_delay)
                .play(&reply_text, reply.id(), &thread_id, events)
                .await;
        }

        let chat_name = if is_new_thread {
            self.name_thread(&thread_id, &user_text, &reply_text).await
        } else {
            None
        };

        events
            .send(TurnEvent::Done {
                thread_id: thread_id.clone(),
                chat_name: chat_name.clone(),
            })
            .await;

        tracing::info!(
            mode = %self.mode,
            thread_id = %thread_id,
            messages = state.messages.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "turn completed"
        );

        Ok(TurnOutcome {
            thread_id,
            message: reply,
            chat_name,
            is_new_thread,
        })
    }

    /// Run the state machine until it commits
    async fn drive(&self, state: &mut GraphState, llm: &LLMNode, tools: &ToolNode, events: &EventSink) -> Result<()> {
        let mut machine = TurnState::Start;
        let mut signal = Signal::Begin;

        loop {
            let (next, effect) = transition(machine, signal, self.config.max_iterations)?;
            machine = next;

            signal = match effect {
                Effect::InvokeModel => {
                    llm.execute(state, events).await?;
                    Signal::ModelReplied {
                        tool_calls: state.has_pending_tool_calls(),
                    }
                }
                Effect::ExecuteTools => {
                    tools.execute(state, events).await?;
                    Signal::ToolsFinished
                }
                Effect::Commit => return Ok(()),
            };
        }
    }

    /// Title a new thread; a failed metadata write leaves it as "New Chat"
    async fn name_thread(&self, thread_id: &str, user_text: &str, reply_text: &str) -> Option<String> {
        let backend = self.naming_model.and_then(|model| match self.backends.backend(model) {
            Ok(backend) => Some(backend),
            Err(e) => {
                tracing::warn!(error = %e, "naming model unavailable, using fallback titles");
                None
            }
        });

        let name = ChatNamer::new(backend, self.config.model_timeout)
            .name(user_text, Some(reply_text))
            .await;

        // Never inserts: a thread deleted while naming stays deleted
        match self.store.rename_thread(thread_id, &name).await {
            Ok(Some(_)) => Some(name),
            Ok(None) => {
                tracing::debug!(thread_id = %thread_id, "thread deleted before it was named");
                None
            }
            Err(e) => {
                tracing::warn!(thread_id = %thread_id, error = %e, "failed to store chat name");
                None
            }
        }
    }
}

/// Text the user typed, without attachment blocks
fn first_text(content: &Content) -> String {
    match content {
        Content::Text(text) => text.clone(),
        Content::Blocks(blocks) => blocks
            .iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } => Some(text.clone()),
                _ => None,
            })
            .unwrap_or_default(),
    }
}
