use std::sync::Arc;
use weave_graph::Graph;
use weave_input::HumanInputComposer;
use weave_llm::ModelId;
use weave_persist::ThreadStore;
use weave_types::{ChatMode, LLMConfig};

use crate::config::{Config, LlmSettings};

/// Everything one mode's routes need
///
/// The graph is built once at startup and shared by every request of the mode.
pub struct ModeRuntime {
    pub graph: Graph,
    pub composer: HumanInputComposer,
    pub llm: LlmSettings,
}

impl ModeRuntime {
    pub fn new(graph: Graph, composer: HumanInputComposer, llm: LlmSettings) -> Self {
        Self { graph, composer, llm }
    }

    pub fn mode(&self) -> ChatMode {
        self.graph.mode()
    }

    pub fn store(&self) -> &Arc<dyn ThreadStore> {
        self.graph.store()
    }

    /// Per-request model settings; `model` falls back to the configured default
    pub fn llm_config(&self, model: Option<ModelId>) -> LLMConfig {
        let mut config = LLMConfig::new(model.unwrap_or(self.llm.default_model));
        if let Some(temperature) = self.llm.temperature {
            config = config.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.llm.max_tokens {
            config = config.with_max_tokens(max_tokens);
        }
        config
    }
}

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub chat: Arc<ModeRuntime>,
    pub project: Arc<ModeRuntime>,
}

impl AppState {
    pub fn new(config: Config, chat: ModeRuntime, project: ModeRuntime) -> Self {
        Self {
            config: Arc::new(config),
            chat: Arc::new(chat),
            project: Arc::new(project),
        }
    }

    pub fn modes(&self) -> [&Arc<ModeRuntime>; 2] {
        [&self.chat, &self.project]
    }
}
