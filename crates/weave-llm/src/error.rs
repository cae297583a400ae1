use thiserror::Error;

use crate::config::ProviderFamily;

/// Backend selection failures (the configuration class of errors)
///
/// Failures of an actual model call are reported through `anyhow` by the
/// backends and keep their original cause.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Missing API key for {0} (set {env})", env = .0.api_key_env())]
    MissingApiKey(ProviderFamily),

    #[error("Failed to initialize {family} client: {source}")]
    ClientInit {
        family: ProviderFamily,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl LlmError {
    pub(crate) fn client_init(family: ProviderFamily, source: anyhow::Error) -> Self {
        Self::ClientInit {
            family,
            source: source.into(),
        }
    }
}

pub type LlmResult<T> = std::result::Result<T, LlmError>;
