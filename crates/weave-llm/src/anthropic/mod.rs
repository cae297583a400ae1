mod client;
mod parser;

pub use client::{AnthropicBackend, ANTHROPIC_API_BASE, ANTHROPIC_VERSION};
pub use parser::MessagesStreamParser;
