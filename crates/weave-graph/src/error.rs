use std::time::Duration;
use thiserror::Error;
use weave_llm::LlmError;
use weave_persist::PersistError;
use weave_tools::ToolError;

#[derive(Debug, Error)]
pub enum GraphError {
    /// Unknown model or missing provider credentials; raised before any work
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Upstream model call failed
    #[error("Provider error: {message}")]
    Provider {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Model call timed out after {}s", .0.as_secs())]
    ModelTimeout(Duration),

    #[error("Tool loop exceeded {0} model invocations")]
    ToolLoopExceeded(usize),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool execution failed: {0}")]
    ToolExecution(String),

    #[error(transparent)]
    Store(#[from] PersistError),

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),
}

impl GraphError {
    /// Wrap an adapter failure, keeping the full context chain in the message
    pub fn provider(err: anyhow::Error) -> Self {
        Self::Provider {
            message: format!("{:#}", err),
            source: err.into(),
        }
    }

    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_unavailable())
    }
}

impl From<LlmError> for GraphError {
    fn from(e: LlmError) -> Self {
        Self::Configuration(e.to_string())
    }
}

impl From<ToolError> for GraphError {
    fn from(e: ToolError) -> Self {
        match e {
            ToolError::UnknownTool(name) => Self::UnknownTool(name),
            other => Self::ToolExecution(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
