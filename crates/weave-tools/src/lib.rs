mod error;
mod registry;
mod spec;
mod web_search;

pub use error::ToolError;
pub use registry::ToolRegistry;
pub use spec::{FnTool, ToolSpec};
pub use web_search::{WebSearchTool, TAVILY_API_BASE, WEB_SEARCH_TOOL};
