use std::collections::HashMap;
use std::sync::Arc;
use weave_llm::{Tool, ToolCall};

use crate::error::ToolError;
use crate::spec::ToolSpec;

/// Immutable set of tools bound to one graph
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolSpec>>,
    /// Registration order, used for the advertised definitions
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from a list; a later tool with the same name replaces the earlier one
    pub fn new(tools: Vec<Arc<dyn ToolSpec>>) -> Self {
        let mut registry = Self::default();
        for tool in tools {
            let name = tool.name().to_string();
            if registry.tools.insert(name.clone(), tool).is_some() {
                tracing::warn!(tool = %name, "duplicate tool registration, keeping the last one");
            } else {
                registry.order.push(name);
            }
        }
        registry
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolSpec>> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Definitions sent to the model, in registration order
    pub fn definitions(&self) -> Vec<Tool> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.definition())
            .collect()
    }

    /// Resolve and run one requested invocation
    pub async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let tool = self
            .get(call.name())
            .ok_or_else(|| ToolError::UnknownTool(call.name().to_string()))?;

        let arguments = call
            .arguments_value()
            .map_err(|e| ToolError::invalid_arguments(call.name(), e))?;

        tool.execute(arguments).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.order).finish()
    }
}
