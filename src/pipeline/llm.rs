//! Generation client: send one prompt to the hosted model, get text back.
//!
//! The retry loop in [`crate::generate`] only ever talks to the
//! [`GenerationClient`] trait, so tests can script failures and the real
//! provider is just one implementation among several. Errors leave this
//! module already classified as retryable or not (see
//! [`GenerationError::from_message`]).

use crate::config::GenerationConfig;
use crate::error::GenerationError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Provider name handed to the edgequake-llm factory.
pub const PROVIDER_NAME: &str = "gemini";

/// Environment variable holding the provider credential.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Produces generated text for a prompt.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// [`GenerationClient`] backed by an edgequake-llm provider.
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &GenerationConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
        }
    }
}

impl fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderClient")
            .field("provider", &"<dyn LLMProvider>")
            .finish()
    }
}

#[async_trait]
impl GenerationClient for ProviderClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let messages = vec![ChatMessage::user(prompt)];
        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| GenerationError::from_message(e.to_string()))?;

        debug!(
            "Generation: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// Stand-in used when no provider could be constructed at startup.
///
/// Every call fails non-retryably, so requests go straight to the fallback
/// plan instead of crashing the process.
#[derive(Debug, Clone)]
pub struct UnconfiguredClient {
    reason: String,
}

impl UnconfiguredClient {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl GenerationClient for UnconfiguredClient {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::NonRetryable {
            message: format!("LLM provider '{PROVIDER_NAME}' is not configured: {}", self.reason),
        })
    }
}

/// Build the generation client once at startup.
///
/// A missing credential is logged, never fatal: the returned client then
/// fails every call and the orchestrator serves fallback plans.
pub fn resolve_client(config: &GenerationConfig) -> Arc<dyn GenerationClient> {
    let key_present = std::env::var(API_KEY_VAR)
        .map(|k| !k.trim().is_empty())
        .unwrap_or(false);
    if !key_present {
        error!("{API_KEY_VAR} is not set in environment variables");
    }

    match ProviderFactory::create_llm_provider(PROVIDER_NAME, &config.model) {
        Ok(provider) => {
            info!("Using provider '{}' with model '{}'", PROVIDER_NAME, config.model);
            Arc::new(ProviderClient::new(provider, config))
        }
        Err(e) => {
            error!("Failed to initialise provider '{}': {}", PROVIDER_NAME, e);
            Arc::new(UnconfiguredClient::new(e.to_string()))
        }
    }
}

/// Build `CompletionOptions` from the generation config.
fn build_options(config: &GenerationConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let config = GenerationConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.7));
        assert_eq!(opts.max_tokens, Some(2048));
    }

    #[tokio::test]
    async fn unconfigured_client_fails_non_retryably() {
        let client = UnconfiguredClient::new("missing API key");
        let err = client.generate("hello").await.unwrap_err();
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("missing API key"));
    }
}
