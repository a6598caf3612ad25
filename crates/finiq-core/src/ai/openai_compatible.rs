//! OpenAI-compatible backend
//!
//! Works with any server implementing `/v1/chat/completions`: vLLM, LocalAI,
//! llama-server, Docker Model Runner, text-generation-inference.
//!
//! Environment variables:
//! - `OPENAI_COMPATIBLE_HOST`: server URL (required)
//! - `OPENAI_COMPATIBLE_MODEL`: model name (default: gpt-3.5-turbo)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key, if required

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::coach::CoachingRequest;
use crate::error::{Error, Result};
use crate::model_router::{ModelRouter, TaskType};
use crate::models::CoachingMessages;
use crate::prompts::{PromptId, PromptLibrary};

use super::parsing::{parse_bucket_classification, parse_coaching_messages};
use super::types::{BucketClassification, RouterInfo};
use super::AIBackend;

#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    router: Arc<RwLock<ModelRouter>>,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl OpenAICompatibleBackend {
    pub fn new(base_url: &str, model: &str) -> Self {
        let mut router = ModelRouter::default();
        router.set_default_model(model);
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
            router: Arc::new(RwLock::new(router)),
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    pub fn with_api_key(base_url: &str, model: &str, api_key: &str) -> Self {
        let mut backend = Self::new(base_url, model);
        backend.api_key = Some(api_key.to_string());
        backend
    }

    /// Same server, different default model (fresh health state)
    pub fn with_model(&self, model: &str) -> Self {
        let mut router = match self.router.read() {
            Ok(r) => ModelRouter::with_config(r.config().clone()),
            Err(_) => ModelRouter::default(),
        };
        router.set_default_model(model);

        Self {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            model: model.to_string(),
            api_key: self.api_key.clone(),
            router: Arc::new(RwLock::new(router)),
            prompts: self.prompts.clone(),
        }
    }

    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OPENAI_COMPATIBLE_HOST").ok()?;
        let model = std::env::var("OPENAI_COMPATIBLE_MODEL")
            .unwrap_or_else(|_| "gpt-3.5-turbo".to_string());

        let mut backend = Self::new(&host, &model);
        backend.api_key = std::env::var("OPENAI_COMPATIBLE_API_KEY").ok();
        Some(backend)
    }

    fn render(&self, id: PromptId, vars: &HashMap<&str, &str>) -> Result<Vec<ChatMessage>> {
        let mut prompts = self
            .prompts
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
        let template = prompts.get(id)?;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = template.system_section() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: template.render_user(vars),
        });
        Ok(messages)
    }

    /// Run one chat completion for `task`, reporting the outcome to the router
    async fn chat_completion(&self, task: TaskType, messages: Vec<ChatMessage>) -> Result<String> {
        let (model, timeout) = {
            let router = self
                .router
                .read()
                .map_err(|_| Error::InvalidData("Failed to acquire router lock".into()))?;
            (
                router.model_for_task(task).to_string(),
                router.timeout_for_task(task),
            )
        };

        let request = ChatCompletionRequest {
            model: model.clone(),
            messages,
            temperature: Some(0.1),
            max_tokens: None,
            stream: false,
        };

        let result = self.send(&request, timeout).await;

        if let Ok(mut router) = self.router.write() {
            match &result {
                Ok(_) => router.record_success(&model),
                Err(e) => {
                    warn!(model = %model, task = task.as_str(), "Chat completion failed: {}", e);
                    router.record_failure(&model);
                }
            }
        }

        result
    }

    async fn send(&self, request: &ChatCompletionRequest, timeout: Duration) -> Result<String> {
        let mut req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .timeout(timeout)
            .json(request);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.bearer_auth(api_key);
        }

        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::InvalidData(format!(
                "OpenAI API error {}: {}",
                status, body
            )));
        }

        let chat_response: ChatCompletionResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::InvalidData("No response from OpenAI API".into()))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[async_trait]
impl AIBackend for OpenAICompatibleBackend {
    async fn classify_bucket(
        &self,
        category: &str,
        description: &str,
    ) -> Result<BucketClassification> {
        let mut vars = HashMap::new();
        vars.insert("category", category);
        vars.insert("description", description);
        let messages = self.render(PromptId::ClassifyBucket, &vars)?;

        let response = self
            .chat_completion(TaskType::FastClassification, messages)
            .await?;
        debug!("OpenAI-compatible bucket response: {}", response);

        parse_bucket_classification(&response)
    }

    async fn generate_coaching(&self, request: &CoachingRequest) -> Result<CoachingMessages> {
        let owned = request.prompt_vars();
        let vars: HashMap<&str, &str> = owned.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let messages = self.render(PromptId::CoachingMessages, &vars)?;

        let response = self.chat_completion(TaskType::Narrative, messages).await?;
        debug!("OpenAI-compatible coaching response: {}", response);

        Ok(parse_coaching_messages(&response))
    }

    async fn health_check(&self) -> bool {
        let mut req_builder = self
            .http_client
            .get(format!("{}/v1/models", self.base_url));

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.bearer_auth(api_key);
        }

        match req_builder.send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }

    fn router_info(&self) -> RouterInfo {
        let mut task_models = Vec::new();
        let mut default_model = self.model.clone();
        let mut fallback_model = None;

        if let Ok(router) = self.router.read() {
            default_model = router.config().default_model.clone();
            fallback_model = router.config().fallback_model.clone();

            for task in TaskType::all() {
                let model = router.model_for_task(*task);
                if model != default_model {
                    task_models.push((task.as_str().to_string(), model.to_string()));
                }
            }
        }

        RouterInfo {
            default_model,
            fallback_model,
            task_models,
        }
    }
}
