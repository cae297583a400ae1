mod cost;
mod prompts;
mod trimmer;

pub use cost::{cost_function, MessageCost, MessageCount, TokenCount};
pub use prompts::{
    naming_prompt, system_prompt, CHAT_SYSTEM_PROMPT, NAMING_SYSTEM_PROMPT, PROJECT_SYSTEM_PROMPT,
};
pub use trimmer::HistoryTrimmer;
