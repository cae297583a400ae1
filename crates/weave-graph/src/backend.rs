use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use weave_llm::{BackendFactory, ModelBackend, ModelId, ProviderCredentials};

use crate::error::Result;

/// Resolves a validated model id to a backend
pub trait BackendProvider: Send + Sync {
    fn backend(&self, model: ModelId) -> Result<Arc<dyn ModelBackend>>;
}

/// Builds backends from provider credentials, one per model, on first use
pub struct CredentialBackends {
    credentials: ProviderCredentials,
    cache: Mutex<HashMap<ModelId, Arc<dyn ModelBackend>>>,
}

impl CredentialBackends {
    pub fn new(credentials: ProviderCredentials) -> Self {
        Self {
            credentials,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_env() -> Self {
        Self::new(ProviderCredentials::from_env())
    }

    pub fn credentials(&self) -> &ProviderCredentials {
        &self.credentials
    }
}

impl BackendProvider for CredentialBackends {
    fn backend(&self, model: ModelId) -> Result<Arc<dyn ModelBackend>> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(backend) = cache.get(&model) {
            return Ok(Arc::clone(backend));
        }

        let backend = BackendFactory::create(model, &self.credentials)?;
        tracing::debug!(model = %model.as_str(), "backend created");
        cache.insert(model, Arc::clone(&backend));
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GraphError;

    #[test]
    fn test_missing_key_is_configuration_error() {
        let backends = CredentialBackends::new(ProviderCredentials::default());
        let err = backends.backend(ModelId::Gpt4oMini).err().unwrap();
        assert!(matches!(err, GraphError::Configuration(_)));
    }

    #[test]
    fn test_backends_cached() {
        let credentials = ProviderCredentials {
            openai_api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let backends = CredentialBackends::new(credentials);

        let a = backends.backend(ModelId::Gpt4o).unwrap();
        let b = backends.backend(ModelId::Gpt4o).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.model(), ModelId::Gpt4o);
    }
}
