use anyhow::Result;
use std::sync::Arc;
use tiktoken_rs::{cl100k_base, CoreBPE};
use weave_llm::{Content, ContentBlock, Message};
use weave_types::CostFunction;

/// Price of one message against the history budget
pub trait MessageCost: Send + Sync {
    fn cost(&self, message: &Message) -> usize;
}

/// Every message costs one unit
pub struct MessageCount;

impl MessageCost for MessageCount {
    fn cost(&self, _message: &Message) -> usize {
        1
    }
}

/// Role/framing overhead added to every message
const MESSAGE_OVERHEAD: usize = 4;
/// Flat price of an image block
const IMAGE_TOKENS: usize = 85;

/// cl100k_base token count of the textual payload
pub struct TokenCount {
    bpe: CoreBPE,
}

impl TokenCount {
    pub fn new() -> Result<Self> {
        let bpe = cl100k_base().map_err(|e| anyhow::anyhow!("Tokenizer error: {}", e))?;
        Ok(Self { bpe })
    }

    pub fn count_text(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_with_special_tokens(text).len()
    }

    fn count_content(&self, content: &Content) -> usize {
        match content {
            Content::Text(text) => self.count_text(text),
            Content::Blocks(blocks) => blocks
                .iter()
                .map(|block| match block {
                    ContentBlock::Text { text } | ContentBlock::File { text, .. } => self.count_text(text),
                    ContentBlock::ImageUrl { .. } => IMAGE_TOKENS,
                })
                .sum(),
        }
    }
}

impl MessageCost for TokenCount {
    fn cost(&self, message: &Message) -> usize {
        let calls: usize = message
            .tool_calls()
            .iter()
            .map(|call| self.count_text(call.name()) + self.count_text(&call.function.arguments))
            .sum();

        MESSAGE_OVERHEAD + self.count_content(message.content()) + calls
    }
}

/// Build the configured cost function
pub fn cost_function(kind: CostFunction) -> Result<Arc<dyn MessageCost>> {
    Ok(match kind {
        CostFunction::Tokens => Arc::new(TokenCount::new()?),
        CostFunction::Messages => Arc::new(MessageCount),
    })
}
