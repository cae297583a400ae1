pub mod config;
pub mod events;
pub mod metadata;
pub mod state;

pub use config::{ChatMode, CostFunction, GraphConfig, LLMConfig};
pub use events::TurnEvent;
pub use metadata::{ChatMetadata, MetadataPatch, DEFAULT_CHAT_NAME};
pub use state::{Delivery, GraphState, TurnInput, TurnOutcome};
