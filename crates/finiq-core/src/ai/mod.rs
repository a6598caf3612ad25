//! Pluggable AI backend abstraction
//!
//! The engine works without any model. When one is configured it is consulted
//! for two things only: bucket lookups for categories the built-in table does
//! not know, and the wording of coaching messages.
//!
//! # Architecture
//!
//! - `AIBackend` trait: the interface every backend implements
//! - `AIClient` enum: Clone + static dispatch over the concrete backends
//! - Backends: `OllamaBackend`, `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: ollama (default), openai_compatible or mock
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama)
//! - `OLLAMA_MODEL`: default model (default: llama3.2)
//! - `OPENAI_COMPATIBLE_HOST`: server URL (required for openai_compatible)
//! - `OPENAI_COMPATIBLE_MODEL`: model name (default: gpt-3.5-turbo)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key, if the server wants one

mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;
pub mod types;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use types::*;

use async_trait::async_trait;

use crate::coach::CoachingRequest;
use crate::error::Result;
use crate::models::CoachingMessages;

#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Ask the model which bucket a category/description belongs to
    async fn classify_bucket(
        &self,
        category: &str,
        description: &str,
    ) -> Result<BucketClassification>;

    /// Write daily/weekly/monthly coaching text for an evaluated day
    ///
    /// Only transport problems are errors; a malformed answer still produces
    /// messages (see `parsing::parse_coaching_messages`).
    async fn generate_coaching(&self, request: &CoachingRequest) -> Result<CoachingMessages>;

    async fn health_check(&self) -> bool;

    fn model(&self) -> &str;

    fn host(&self) -> &str;

    fn router_info(&self) -> RouterInfo;
}

#[derive(Clone)]
pub enum AIClient {
    Ollama(OllamaBackend),
    /// Any server speaking the OpenAI chat completions API (vLLM, LocalAI, llama-server, ...)
    OpenAICompatible(OpenAICompatibleBackend),
    Mock(MockBackend),
}

impl AIClient {
    /// Build a client from `AI_BACKEND` and the backend's own variables
    ///
    /// Returns None when the selected backend's host is not configured.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "ollama".to_string());

        match backend.to_lowercase().as_str() {
            "ollama" => OllamaBackend::from_env().map(AIClient::Ollama),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to ollama");
                OllamaBackend::from_env().map(AIClient::Ollama)
            }
        }
    }

    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Same backend, different default model
    pub fn with_model(&self, model: &str) -> Self {
        match self {
            AIClient::Ollama(b) => AIClient::Ollama(b.with_model(model)),
            AIClient::OpenAICompatible(b) => AIClient::OpenAICompatible(b.with_model(model)),
            AIClient::Mock(b) => AIClient::Mock(b.with_model(model)),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            AIClient::Ollama(_) => "ollama",
            AIClient::OpenAICompatible(_) => "openai_compatible",
            AIClient::Mock(_) => "mock",
        }
    }
}

#[async_trait]
impl AIBackend for AIClient {
    async fn classify_bucket(
        &self,
        category: &str,
        description: &str,
    ) -> Result<BucketClassification> {
        match self {
            AIClient::Ollama(b) => b.classify_bucket(category, description).await,
            AIClient::OpenAICompatible(b) => b.classify_bucket(category, description).await,
            AIClient::Mock(b) => b.classify_bucket(category, description).await,
        }
    }

    async fn generate_coaching(&self, request: &CoachingRequest) -> Result<CoachingMessages> {
        match self {
            AIClient::Ollama(b) => b.generate_coaching(request).await,
            AIClient::OpenAICompatible(b) => b.generate_coaching(request).await,
            AIClient::Mock(b) => b.generate_coaching(request).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }

    fn router_info(&self) -> RouterInfo {
        match self {
            AIClient::Ollama(b) => b.router_info(),
            AIClient::OpenAICompatible(b) => b.router_info(),
            AIClient::Mock(b) => b.router_info(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_client_mock() {
        let client = AIClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
        assert_eq!(client.backend_name(), "mock");
    }

    #[test]
    fn test_with_model_keeps_backend() {
        let client = AIClient::ollama("http://localhost:11434/", "gemma3");
        let other = client.with_model("qwen2.5");
        assert_eq!(other.backend_name(), "ollama");
        assert_eq!(other.model(), "qwen2.5");
        assert_eq!(other.host(), "http://localhost:11434");
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        assert!(AIClient::mock().health_check().await);
    }

    #[tokio::test]
    async fn test_mock_classify_bucket() {
        let client = AIClient::mock();
        let result = client
            .classify_bucket("takeout", "Swiggy order")
            .await
            .unwrap();
        assert_eq!(result.bucket, "fun");
    }
}
