pub mod anthropic;
pub mod buffer_utils;
pub mod config;
pub mod deepseek;
pub mod error;
pub mod openai;
pub mod streaming;
pub mod traits;
pub mod types;

pub use traits::{ChatOptions, ChatRequest, ChatResponse, EventStream, ModelBackend, TokenUsage};

pub use anthropic::AnthropicBackend;
pub use buffer_utils::CircularLineBuffer;
pub use config::{BackendFactory, ModelId, ProviderCredentials, ProviderFamily};
pub use error::{LlmError, LlmResult};
pub use openai::ChatCompletionsBackend;
pub use streaming::StreamEvent;
pub use types::{
    new_message_id, AiMessage, Content, ContentBlock, Message, MessageKind, ResponseMetadata, Tool, ToolCall,
    ToolChoice,
};
