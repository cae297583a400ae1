use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Tool '{tool}' failed: {message}")]
    Execution { tool: String, message: String },
}

impl ToolError {
    pub fn execution(tool: impl Into<String>, message: impl ToString) -> Self {
        Self::Execution {
            tool: tool.into(),
            message: message.to_string(),
        }
    }

    pub fn invalid_arguments(tool: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            message: message.to_string(),
        }
    }
}
