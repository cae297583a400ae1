use std::sync::Arc;
use weave_llm::ModelId;
use weave_persist::ThreadStore;
use weave_tools::ToolRegistry;
use weave_types::{ChatMode, GraphConfig};

use crate::backend::BackendProvider;
use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::locks::ThreadLocks;

/// Fluent construction of a [`Graph`]; mode, backends and store are bound once
pub struct GraphBuilder {
    mode: ChatMode,
    system_prompt: Option<String>,
    tools: ToolRegistry,
    backends: Option<Arc<dyn BackendProvider>>,
    store: Option<Arc<dyn ThreadStore>>,
    locks: Option<Arc<ThreadLocks>>,
    config: GraphConfig,
    naming_model: Option<ModelId>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            mode: ChatMode::Chat,
            system_prompt: None,
            tools: ToolRegistry::empty(),
            backends: None,
            store: None,
            locks: None,
            config: GraphConfig::default(),
            naming_model: Some(ModelId::Gpt35Turbo),
        }
    }

    pub fn mode(mut self, mode: ChatMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the mode's default system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn backends(mut self, backends: Arc<dyn BackendProvider>) -> Self {
        self.backends = Some(backends);
        self
    }

    pub fn store(mut self, store: Arc<dyn ThreadStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Share locks across graphs writing the same store
    pub fn locks(mut self, locks: Arc<ThreadLocks>) -> Self {
        self.locks = Some(locks);
        self
    }

    pub fn config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    /// `None` disables model naming; titles then come from the user message
    pub fn naming_model(mut self, model: Option<ModelId>) -> Self {
        self.naming_model = model;
        self
    }

    pub fn build(self) -> Result<Graph> {
        let backends = self
            .backends
            .ok_or_else(|| GraphError::Configuration("Graph requires a backend provider".to_string()))?;
        let store = self
            .store
            .ok_or_else(|| GraphError::Configuration("Graph requires a thread store".to_string()))?;

        let cost = weave_context::cost_function(self.config.cost_function)
            .map_err(|e| GraphError::Configuration(format!("{:#}", e)))?;

        let tools = if self.mode.uses_tools() || self.tools.is_empty() {
            self.tools
        } else {
            tracing::warn!(mode = %self.mode, tools = ?self.tools.names(), "mode does not use tools, ignoring them");
            ToolRegistry::empty()
        };

        let system_prompt = self
            .system_prompt
            .unwrap_or_else(|| weave_context::system_prompt(self.mode).to_string());

        tracing::debug!(
            mode = %self.mode,
            tools = tools.len(),
            max_iterations = self.config.max_iterations,
            history_budget = self.config.history_budget,
            "graph built"
        );

        Ok(Graph {
            mode: self.mode,
            system_prompt: Arc::from(system_prompt),
            tools,
            backends,
            store,
            locks: self.locks.unwrap_or_default(),
            config: self.config,
            cost,
            naming_model: self.naming_model,
        })
    }
}
