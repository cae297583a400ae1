pub mod backend;
pub mod builder;
pub mod emulation;
pub mod error;
pub mod graph;
pub mod locks;
pub mod machine;
pub mod naming;
pub mod node;
pub mod nodes;
pub mod streaming;

pub use backend::{BackendProvider, CredentialBackends};
pub use builder::GraphBuilder;
pub use emulation::{split_chunks, ChunkEmulator};
pub use error::{GraphError, Result};
pub use graph::Graph;
pub use locks::ThreadLocks;
pub use machine::{transition, Effect, Signal, TurnState};
pub use naming::{clean_title, fallback_title, ChatNamer};
pub use node::{Node, NodeType};
pub use nodes::{LLMNode, ToolNode};
pub use streaming::{normalize_native, EventSink};

// Re-export key types from weave-types
pub use weave_types::{
    ChatMode, Delivery, GraphConfig, GraphState, LLMConfig, TurnEvent, TurnInput, TurnOutcome,
};
