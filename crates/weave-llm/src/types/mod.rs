pub mod content;
pub mod message;
pub mod tool;

pub use content::{Content, ContentBlock, ImageUrl};
pub use message::{new_message_id, AiMessage, Message, MessageKind, ResponseMetadata};
pub use tool::{FunctionCall, FunctionDefinition, Tool, ToolCall, ToolChoice};
