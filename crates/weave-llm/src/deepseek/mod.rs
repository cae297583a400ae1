// DeepSeek speaks Chat Completions with text-only content

use anyhow::Result;

use crate::config::{ModelId, ProviderFamily};
use crate::openai::{ChatCompletionsBackend, Dialect};

pub const DEEPSEEK_API_BASE: &str = "https://api.deepseek.com/v1";

/// Create a DeepSeek backend bound to `model`
pub fn backend(model: ModelId, api_key: &str) -> Result<ChatCompletionsBackend> {
    if model.family() != ProviderFamily::DeepSeek {
        anyhow::bail!("{} is not a DeepSeek model", model);
    }
    ChatCompletionsBackend::new(model, api_key, DEEPSEEK_API_BASE, Dialect::DeepSeek)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ChatOptions;
    use crate::types::{Content, ContentBlock, Message, Tool};

    #[test]
    fn test_content_is_flattened() {
        let content = Content::blocks(vec![
            ContentBlock::text("summarize"),
            ContentBlock::file("a.txt", "--- Content of a.txt ---\nhello"),
            ContentBlock::image_url("data:image/png;base64,AAAA"),
        ]);
        let backend = backend(ModelId::DeepSeekChat, "key").unwrap();
        let payload = backend
            .build_payload(&[Message::human(content)], &ChatOptions::default(), false)
            .unwrap();

        assert_eq!(
            payload["messages"][0]["content"],
            "summarize\n\n--- Content of a.txt ---\nhello"
        );
    }

    #[test]
    fn test_reasoner_drops_tools() {
        let options = ChatOptions::new().tools(vec![Tool::new("web_search", "search", serde_json::json!({}))]);

        let reasoner = backend(ModelId::DeepSeekReasoner, "key").unwrap();
        let payload = reasoner.build_payload(&[Message::human("hi")], &options, true).unwrap();
        assert!(payload.get("tools").is_none());

        let chat = backend(ModelId::DeepSeekChat, "key").unwrap();
        let payload = chat.build_payload(&[Message::human("hi")], &options, true).unwrap();
        assert!(payload.get("tools").is_some());
    }

    #[test]
    fn test_rejects_other_families() {
        assert!(backend(ModelId::Gpt4o, "key").is_err());
    }
}
