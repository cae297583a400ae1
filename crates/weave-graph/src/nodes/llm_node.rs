use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use weave_context::HistoryTrimmer;
use weave_llm::{ChatOptions, ChatRequest, Message, ModelBackend, Tool, ToolChoice};
use weave_types::GraphState;

use crate::error::{GraphError, Result};
use crate::node::{Node, NodeType};
use crate::streaming::{normalize_native, EventSink};

/// Invokes the model once and appends its reply
///
/// With native streaming the reply deltas are forwarded as chunks while they
/// arrive and the reply is stored as `AIResponseChunk`; otherwise the complete
/// reply is stored as `AIResponse` and nothing is emitted here.
pub struct LLMNode {
    backend: Arc<dyn ModelBackend>,
    system_prompt: String,
    tools: Vec<Tool>,
    trimmer: HistoryTrimmer,
    timeout: Duration,
    native_streaming: bool,
}

impl LLMNode {
    pub fn new(backend: Arc<dyn ModelBackend>, system_prompt: impl Into<String>, trimmer: HistoryTrimmer) -> Self {
        Self {
            backend,
            system_prompt: system_prompt.into(),
            tools: Vec::new(),
            trimmer,
            timeout: Duration::from_secs(120),
            native_streaming: false,
        }
    }

    /// Tool definitions are dropped for models that reject them
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = if self.backend.model().supports_tools() {
            tools
        } else {
            Vec::new()
        };
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Stream natively when the caller wants chunks and the backend can
    pub fn with_streaming(mut self, requested: bool) -> Self {
        self.native_streaming = requested && self.backend.supports_streaming();
        self
    }

    pub fn streams_natively(&self) -> bool {
        self.native_streaming
    }

    /// System prompt + history, trimmed to the budget
    fn build_request(&self, state: &GraphState) -> ChatRequest {
        let mut messages = Vec::with_capacity(state.messages.len() + 1);
        if !self.system_prompt.is_empty() {
            messages.push(Message::system(self.system_prompt.as_str()));
        }
        messages.extend(state.messages.iter().cloned());
        let messages = self.trimmer.trim(&messages);

        let mut options = ChatOptions::new();
        if !self.tools.is_empty() {
            options = options.tools(self.tools.clone()).tool_choice(ToolChoice::Auto);
        }
        if let Some(temperature) = state.llm_config.temperature {
            options = options.temperature(temperature);
        }
        if let Some(max_tokens) = state.llm_config.max_tokens {
            options = options.max_tokens(max_tokens);
        }

        ChatRequest::new(self.backend.model().as_str(), messages).with_options(options)
    }

    async fn invoke(&self, request: ChatRequest, state: &GraphState, events: &EventSink) -> Result<Message> {
        if self.native_streaming {
            let stream = self
                .backend
                .chat_stream(request)
                .await
                .map_err(GraphError::provider)?;
            let reply = normalize_native(stream, events, &state.thread_id, self.backend.model().as_str()).await?;
            Ok(Message::AIResponseChunk(reply))
        } else {
            let response = self.backend.chat(request).await.map_err(GraphError::provider)?;
            Ok(response.into_message())
        }
    }
}

#[async_trait]
impl Node for LLMNode {
    async fn execute(&self, state: &mut GraphState, events: &EventSink) -> Result<()> {
        let request = self.build_request(state);

        tracing::debug!(
            thread_id = %state.thread_id,
            model = %self.backend.model().as_str(),
            messages = request.messages.len(),
            tools = self.tools.len(),
            native_streaming = self.native_streaming,
            "invoking model"
        );

        let reply = tokio::time::timeout(self.timeout, self.invoke(request, state, events))
            .await
            .map_err(|_| GraphError::ModelTimeout(self.timeout))??;

        tracing::debug!(
            thread_id = %state.thread_id,
            message_id = %reply.id(),
            tool_calls = reply.tool_calls().len(),
            "model replied"
        );

        state.add_message(reply);
        Ok(())
    }

    fn node_type(&self) -> NodeType {
        NodeType::LLM
    }
}
