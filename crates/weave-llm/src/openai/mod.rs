mod client;
mod wire;

pub use client::{ChatCompletionsBackend, Dialect, OPENAI_API_BASE};
pub use wire::ChatCompletionsParser;
