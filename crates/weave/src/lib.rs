//! # Weave - LLM chat and project generation for Rust
//!
//! Weave runs multi-turn conversations against OpenAI, Anthropic and DeepSeek
//! models with:
//! - **Streaming** (native provider streams, or emulated chunking for models that can't)
//! - **Tool calls** (bounded tool loop, web search built in)
//! - **Thread persistence** (checkpoints plus chat metadata, in memory or MongoDB)
//! - **History trimming** (token or message budgets, tool exchanges kept whole)
//! - **Attachments** (images inline, PDF/Word/CSV/TXT/JSON extracted to text)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use weave::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let agent = AgentBuilder::new()
//!         .openai_key(std::env::var("OPENAI_API_KEY")?)
//!         .model(ModelId::Gpt4oMini)
//!         .build()
//!         .await?;
//!
//!     let reply = agent.chat("What is 2+2?").await?;
//!     println!("{}", reply.message.content().to_plain_text());
//!
//!     // Same thread, next turn
//!     let reply = agent.chat_in_thread(&reply.thread_id, "And times 3?").await?;
//!     println!("{}", reply.message.content().to_plain_text());
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming
//!
//! ```rust,no_run
//! use weave::prelude::*;
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let agent = AgentBuilder::new()
//!         .openai_key(std::env::var("OPENAI_API_KEY")?)
//!         .build()
//!         .await?;
//!
//!     let mut events = agent.chat_stream(None, "Explain Rust ownership").await;
//!     while let Some(event) = events.next().await {
//!         match event {
//!             TurnEvent::Chunk { content, .. } => print!("{}", content),
//!             TurnEvent::Error { error } => eprintln!("\n{}", error),
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **weave-llm**: message model and provider backends
//! - **weave-types**: turn events, graph state and configuration
//! - **weave-context**: system prompts and the history trimmer
//! - **weave-tools**: tool registry and web search
//! - **weave-persist**: thread store (in-memory, MongoDB)
//! - **weave-input**: human message composition from text and files
//! - **weave-graph**: conversation state machine and turn runner
//!
//! The HTTP server lives in the `weave-api` crate.
//!
//! ## Features
//!
//! - `full` (default): everything below
//! - `mongodb`: MongoDB thread store, [`AgentBuilder::mongodb`]

pub use weave_context as context;
pub use weave_graph as graph;
pub use weave_input as input;
pub use weave_llm as llm;
pub use weave_persist as persist;
pub use weave_tools as tools;
pub use weave_types as types;

pub use weave_graph::{Graph, GraphError};
pub use weave_input::{Attachment, HumanInputComposer};
pub use weave_llm::{Content, Message, ModelId, ProviderCredentials};
pub use weave_persist::{InMemoryThreadStore, ThreadStore};
pub use weave_types::{ChatMode, GraphConfig, LLMConfig, TurnEvent, TurnOutcome};

/// High-level builder for configured agents
pub mod builder;

pub use builder::{Agent, AgentBuilder};

pub mod prelude {
    pub use crate::builder::{Agent, AgentBuilder};
    pub use crate::input::Attachment;
    pub use crate::llm::{Content, Message, ModelId};
    pub use crate::types::{ChatMode, GraphConfig, LLMConfig, TurnEvent, TurnOutcome};
    pub use anyhow::Result;
}
