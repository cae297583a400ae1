use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use weave_llm::Tool;

use crate::error::ToolError;

/// A named, schema-described capability the model may invoke
#[async_trait]
pub trait ToolSpec: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the arguments object
    fn input_schema(&self) -> Value;

    /// Run the tool; the returned text becomes the `ToolResult` content
    async fn execute(&self, arguments: Value) -> Result<String, ToolError>;

    /// Definition advertised to the model
    fn definition(&self) -> Tool {
        Tool::new(self.name(), self.description(), self.input_schema())
    }
}

type ToolFn = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<String, ToolError>> + Send + Sync>;

/// Tool backed by an async closure
pub struct FnTool {
    name: String,
    description: String,
    schema: Value,
    func: ToolFn,
}

impl FnTool {
    pub fn new<F, Fut>(name: impl Into<String>, description: impl Into<String>, schema: Value, func: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            func: Arc::new(move |args| Box::pin(func(args))),
        }
    }
}

#[async_trait]
impl ToolSpec for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.schema.clone()
    }

    async fn execute(&self, arguments: Value) -> Result<String, ToolError> {
        (self.func)(arguments).await
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool").field("name", &self.name).finish_non_exhaustive()
    }
}
