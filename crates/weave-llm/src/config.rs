// Validated model identifiers and the backend factory keyed by them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::anthropic::AnthropicBackend;
use crate::deepseek;
use crate::error::{LlmError, LlmResult};
use crate::openai::ChatCompletionsBackend;
use crate::traits::ModelBackend;

/// Wire protocol family a model belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderFamily {
    OpenAI,
    Anthropic,
    DeepSeek,
}

impl ProviderFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
            Self::DeepSeek => "deepseek",
        }
    }

    /// Environment variable holding the family's API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }
}

impl fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every model the service can route to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModelId {
    Gpt5,
    Gpt5Mini,
    Gpt5Nano,
    Gpt4,
    Gpt4o,
    #[default]
    Gpt4oMini,
    Gpt35Turbo,
    CodexMiniLatest,
    DeepSeekChat,
    DeepSeekReasoner,
    ClaudeSonnet45,
    ClaudeSonnet4,
    Claude37Sonnet,
    ClaudeOpus4,
    Claude35Haiku,
}

/// Models that never stream, whatever the request asks for
const NON_STREAMING: &[ModelId] = &[ModelId::Gpt5, ModelId::Gpt5Mini];

impl ModelId {
    pub const ALL: [ModelId; 15] = [
        Self::Gpt5,
        Self::Gpt5Mini,
        Self::Gpt5Nano,
        Self::Gpt4,
        Self::Gpt4o,
        Self::Gpt4oMini,
        Self::Gpt35Turbo,
        Self::CodexMiniLatest,
        Self::DeepSeekChat,
        Self::DeepSeekReasoner,
        Self::ClaudeSonnet45,
        Self::ClaudeSonnet4,
        Self::Claude37Sonnet,
        Self::ClaudeOpus4,
        Self::Claude35Haiku,
    ];

    /// Identifier sent to the provider
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gpt5 => "gpt-5",
            Self::Gpt5Mini => "gpt-5-mini",
            Self::Gpt5Nano => "gpt-5-nano",
            Self::Gpt4 => "gpt-4",
            Self::Gpt4o => "gpt-4o",
            Self::Gpt4oMini => "gpt-4o-mini",
            Self::Gpt35Turbo => "gpt-3.5-turbo",
            Self::CodexMiniLatest => "codex-mini-latest",
            Self::DeepSeekChat => "deepseek-chat",
            Self::DeepSeekReasoner => "deepseek-reasoner",
            Self::ClaudeSonnet45 => "claude-sonnet-4-5-20250929",
            Self::ClaudeSonnet4 => "claude-sonnet-4-20250514",
            Self::Claude37Sonnet => "claude-3-7-sonnet-20250219",
            Self::ClaudeOpus4 => "claude-opus-4-20250514",
            Self::Claude35Haiku => "claude-3-5-haiku-20241022",
        }
    }

    pub fn family(&self) -> ProviderFamily {
        match self {
            Self::DeepSeekChat | Self::DeepSeekReasoner => ProviderFamily::DeepSeek,
            Self::ClaudeSonnet45
            | Self::ClaudeSonnet4
            | Self::Claude37Sonnet
            | Self::ClaudeOpus4
            | Self::Claude35Haiku => ProviderFamily::Anthropic,
            _ => ProviderFamily::OpenAI,
        }
    }

    pub fn supports_streaming(&self) -> bool {
        !NON_STREAMING.contains(self)
    }

    /// GPT-5 family rejects `temperature` and wants `max_completion_tokens`
    pub fn is_reasoning_openai(&self) -> bool {
        matches!(self, Self::Gpt5 | Self::Gpt5Mini | Self::Gpt5Nano)
    }

    /// Models that reject tool definitions
    pub fn supports_tools(&self) -> bool {
        !matches!(self, Self::DeepSeekReasoner)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| LlmError::UnknownModel(s.to_string()))
    }
}

impl TryFrom<String> for ModelId {
    type Error = LlmError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModelId> for String {
    fn from(value: ModelId) -> Self {
        value.as_str().to_string()
    }
}

/// API keys and optional endpoint overrides per provider family
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub deepseek_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub anthropic_base_url: Option<String>,
    pub deepseek_base_url: Option<String>,
}

impl ProviderCredentials {
    /// Read keys from `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `DEEPSEEK_API_KEY`
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            openai_api_key: read(ProviderFamily::OpenAI.api_key_env()),
            anthropic_api_key: read(ProviderFamily::Anthropic.api_key_env()),
            deepseek_api_key: read(ProviderFamily::DeepSeek.api_key_env()),
            ..Default::default()
        }
    }

    pub fn api_key(&self, family: ProviderFamily) -> Option<&str> {
        match family {
            ProviderFamily::OpenAI => self.openai_api_key.as_deref(),
            ProviderFamily::Anthropic => self.anthropic_api_key.as_deref(),
            ProviderFamily::DeepSeek => self.deepseek_api_key.as_deref(),
        }
    }

    pub fn base_url(&self, family: ProviderFamily) -> Option<&str> {
        match family {
            ProviderFamily::OpenAI => self.openai_base_url.as_deref(),
            ProviderFamily::Anthropic => self.anthropic_base_url.as_deref(),
            ProviderFamily::DeepSeek => self.deepseek_base_url.as_deref(),
        }
    }

    pub fn has_key(&self, family: ProviderFamily) -> bool {
        self.api_key(family).is_some()
    }
}

/// Factory for creating model backends
pub struct BackendFactory;

impl BackendFactory {
    /// Create the backend for a validated model
    pub fn create(model: ModelId, credentials: &ProviderCredentials) -> LlmResult<Arc<dyn ModelBackend>> {
        let family = model.family();
        let api_key = credentials
            .api_key(family)
            .ok_or(LlmError::MissingApiKey(family))?;
        let base_url = credentials.base_url(family);

        let backend: Arc<dyn ModelBackend> = match family {
            ProviderFamily::OpenAI => {
                let mut backend = ChatCompletionsBackend::openai(model, api_key)
                    .map_err(|e| LlmError::client_init(family, e))?;
                if let Some(url) = base_url {
                    backend = backend.with_base_url(url);
                }
                Arc::new(backend)
            }
            ProviderFamily::DeepSeek => {
                let mut backend = deepseek::backend(model, api_key)
                    .map_err(|e| LlmError::client_init(family, e))?;
                if let Some(url) = base_url {
                    backend = backend.with_base_url(url);
                }
                Arc::new(backend)
            }
            ProviderFamily::Anthropic => {
                let mut backend = AnthropicBackend::new(model, api_key)
                    .map_err(|e| LlmError::client_init(family, e))?;
                if let Some(url) = base_url {
                    backend = backend.with_base_url(url);
                }
                Arc::new(backend)
            }
        };

        Ok(backend)
    }

    /// Parse a model selector and create its backend
    pub fn from_name(name: &str, credentials: &ProviderCredentials) -> LlmResult<Arc<dyn ModelBackend>> {
        Self::create(name.parse()?, credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_models() {
        for model in ModelId::ALL {
            assert_eq!(model.as_str().parse::<ModelId>().unwrap(), model);
        }
    }

    #[test]
    fn test_unknown_model_is_configuration_error() {
        let err = "llama-3".parse::<ModelId>().unwrap_err();
        assert!(matches!(err, LlmError::UnknownModel(ref name) if name == "llama-3"));
    }

    #[test]
    fn test_families() {
        assert_eq!(ModelId::Gpt4oMini.family(), ProviderFamily::OpenAI);
        assert_eq!(ModelId::CodexMiniLatest.family(), ProviderFamily::OpenAI);
        assert_eq!(ModelId::DeepSeekReasoner.family(), ProviderFamily::DeepSeek);
        assert_eq!(ModelId::Claude35Haiku.family(), ProviderFamily::Anthropic);
    }

    #[test]
    fn test_streaming_deny_list() {
        assert!(!ModelId::Gpt5.supports_streaming());
        assert!(!ModelId::Gpt5Mini.supports_streaming());
        assert!(ModelId::Gpt5Nano.supports_streaming());
        assert!(ModelId::ClaudeSonnet45.supports_streaming());
        assert_eq!(ModelId::default(), ModelId::Gpt4oMini);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&ModelId::DeepSeekChat).unwrap();
        assert_eq!(json, "\"deepseek-chat\"");
        let parsed: ModelId = serde_json::from_str("\"gpt-4o\"").unwrap();
        assert_eq!(parsed, ModelId::Gpt4o);
        assert!(serde_json::from_str::<ModelId>("\"nope\"").is_err());
    }

    #[test]
    fn test_factory_requires_key() {
        let credentials = ProviderCredentials {
            openai_api_key: Some("sk-test".to_string()),
            ..Default::default()
        };

        let backend = BackendFactory::create(ModelId::Gpt4o, &credentials).unwrap();
        assert_eq!(backend.model(), ModelId::Gpt4o);

        let err = BackendFactory::create(ModelId::ClaudeOpus4, &credentials).err().unwrap();
        assert!(matches!(err, LlmError::MissingApiKey(ProviderFamily::Anthropic)));
    }

    #[test]
    fn test_factory_rejects_unknown_name() {
        let credentials = ProviderCredentials::default();
        let err = BackendFactory::from_name("gpt-9", &credentials).err().unwrap();
        assert!(matches!(err, LlmError::UnknownModel(_)));
    }
}
