use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use weave_llm::ModelId;

/// How a message is priced against the history budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostFunction {
    /// cl100k_base token count
    #[default]
    Tokens,
    /// every message costs one
    Messages,
}

impl FromStr for CostFunction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tokens" => Ok(Self::Tokens),
            "messages" => Ok(Self::Messages),
            other => Err(format!("unknown cost function: {}", other)),
        }
    }
}

/// Turn-loop limits and delivery pacing, shared by every turn of a graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Model invocations allowed per turn before `ToolLoopExceeded`
    pub max_iterations: usize,
    pub model_timeout: Duration,
    pub history_budget: usize,
    pub cost_function: CostFunction,
    /// Words per emulated chunk
    pub chunk_words: usize,
    pub chunk_delay: Duration,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            model_timeout: Duration::from_secs(120),
            history_budget: 10_000,
            cost_function: CostFunction::Tokens,
            chunk_words: 5,
            chunk_delay: Duration::from_millis(100),
        }
    }
}

impl GraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    pub fn with_history_budget(mut self, budget: usize, cost: CostFunction) -> Self {
        self.history_budget = budget;
        self.cost_function = cost;
        self
    }

    pub fn with_chunking(mut self, words: usize, delay: Duration) -> Self {
        self.chunk_words = words.max(1);
        self.chunk_delay = delay;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    pub model: ModelId,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl LLMConfig {
    pub fn new(model: ModelId) -> Self {
        Self {
            model,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self::new(ModelId::default())
    }
}

/// Conversation mode, bound to a graph at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Natural conversation, markdown answers
    Chat,
    /// Every answer is a complete project file tree as JSON
    Project,
}

impl ChatMode {
    /// Store namespace; collections are `{namespace}-checkpoints` and `{namespace}-metadata`
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Chat => "user-chat",
            Self::Project => "user-project",
        }
    }

    /// Delivery used when the request does not say
    pub fn streams_by_default(&self) -> bool {
        matches!(self, Self::Chat)
    }

    /// Whether tools are bound in this mode
    pub fn uses_tools(&self) -> bool {
        matches!(self, Self::Chat)
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}
