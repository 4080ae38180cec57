//! Provider client factory.
//!
//! Owns one cached provider instance, rebuilt only when the API key
//! changes. The factory is an explicit value injected where it is needed;
//! there is no module-level singleton.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use chatarbor_config::ApiConfig;
use chatarbor_core::error::ProviderError;
use chatarbor_core::provider::Provider;

use crate::openai_compat::OpenAiCompatProvider;

/// Builds and caches the chat-completion client.
pub struct ProviderFactory {
    base_url: String,
    cached: Mutex<Option<(String, Arc<OpenAiCompatProvider>)>>,
}

impl ProviderFactory {
    /// Create a factory for the configured endpoint.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            cached: Mutex::new(None),
        }
    }

    /// Create a factory from the API configuration section.
    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.base_url.clone())
    }

    /// Get a provider for the given API key, reusing the cached client
    /// unless the key changed since the last call.
    pub async fn provider(
        &self,
        api_key: &str,
    ) -> std::result::Result<Arc<dyn Provider>, ProviderError> {
        if api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "No API key configured — set api.api_key or CHATARBOR_API_KEY".into(),
            ));
        }

        let mut cached = self.cached.lock().await;
        match cached.as_ref() {
            Some((key, provider)) if key == api_key => Ok(provider.clone()),
            _ => {
                debug!(base_url = %self.base_url, "Building chat-completion client");
                let provider = Arc::new(OpenAiCompatProvider::new(
                    "openai-compat",
                    self.base_url.clone(),
                    api_key,
                ));
                *cached = Some((api_key.to_string(), provider.clone()));
                Ok(provider)
            }
        }
    }
}
