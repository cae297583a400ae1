use std::sync::Arc;
use std::time::Duration;
use weave_context::{naming_prompt, NAMING_SYSTEM_PROMPT};
use weave_llm::{ChatOptions, ChatRequest, Message, ModelBackend};
use weave_types::DEFAULT_CHAT_NAME;

const MAX_TITLE_CHARS: usize = 60;
const MAX_TITLE_WORDS: usize = 5;
const FALLBACK_WORDS: usize = 4;

/// Generates the title of a new thread after its first turn
#[derive(Clone)]
pub struct ChatNamer {
    backend: Option<Arc<dyn ModelBackend>>,
    timeout: Duration,
}

impl ChatNamer {
    pub fn new(backend: Option<Arc<dyn ModelBackend>>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Namer that always uses the word fallback
    pub fn fallback_only() -> Self {
        Self::new(None, Duration::ZERO)
    }

    /// Never fails; model problems fall back to the opening words of `user_text`
    pub async fn name(&self, user_text: &str, ai_text: Option<&str>) -> String {
        let Some(backend) = &self.backend else {
            return fallback_title(user_text);
        };

        let request = ChatRequest::new(
            backend.model().as_str(),
            vec![
                Message::system(NAMING_SYSTEM_PROMPT),
                Message::human(naming_prompt(user_text, ai_text)),
            ],
        )
        .with_options(ChatOptions::new().temperature(0.3).max_tokens(20));

        match tokio::time::timeout(self.timeout, backend.chat(request)).await {
            Ok(Ok(response)) => match response.content.as_deref().and_then(clean_title) {
                Some(title) => title,
                None => {
                    tracing::warn!("naming model returned an empty title");
                    fallback_title(user_text)
                }
            },
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "chat naming failed");
                fallback_title(user_text)
            }
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "chat naming timed out");
                fallback_title(user_text)
            }
        }
    }
}

/// Strip quotes, keep at most five words and 60 characters
pub fn clean_title(raw: &str) -> Option<String> {
    let unquoted: String = raw
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '`' | '\u{201c}' | '\u{201d}' | '\u{2018}' | '\u{2019}'))
        .collect();

    let words: Vec<&str> = unquoted.split_whitespace().take(MAX_TITLE_WORDS).collect();
    let title = truncate(&words.join(" "));
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

/// First four words of the user message, or `"New Chat"`
pub fn fallback_title(user_text: &str) -> String {
    let words: Vec<&str> = user_text.split_whitespace().take(FALLBACK_WORDS).collect();
    if words.is_empty() {
        return DEFAULT_CHAT_NAME.to_string();
    }
    truncate(&words.join(" "))
}

fn truncate(title: &str) -> String {
    title.chars().take(MAX_TITLE_CHARS).collect::<String>().trim_end().to_string()
}
