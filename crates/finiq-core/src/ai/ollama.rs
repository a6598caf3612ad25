//! Ollama backend
//!
//! Talks to `/api/generate`. The model and timeout for each call come from the
//! model router; successes and failures are fed back into it so a broken
//! model is skipped in favour of the fallback.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

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

/// Ollama backend with model router integration
///
/// Routing is configured in `<data_local_dir>/finiq/config/models.toml`:
///
/// ```toml
/// [defaults]
/// model = "gemma3"
///
/// [models.narrative]
/// model = "qwen2.5:7b"
/// timeout_secs = 90
/// ```
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    router: Arc<RwLock<ModelRouter>>,
    default_model: String,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl OllamaBackend {
    pub fn new(base_url: &str, default_model: &str) -> Self {
        let mut router = ModelRouter::default();
        router.set_default_model(default_model);
        Self::with_router(base_url, default_model, router)
    }

    pub fn with_router(base_url: &str, default_model: &str, router: ModelRouter) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            router: Arc::new(RwLock::new(router)),
            default_model: default_model.to_string(),
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
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
            router: Arc::new(RwLock::new(router)),
            default_model: model.to_string(),
            prompts: self.prompts.clone(),
        }
    }

    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        Some(Self::new(&host, &model))
    }

    /// Render a prompt's system and user sections
    fn render(&self, id: PromptId, vars: &HashMap<&str, &str>) -> Result<(Option<String>, String)> {
        let mut prompts = self
            .prompts
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
        let template = prompts.get(id)?;
        Ok((
            template.system_section().map(str::to_string),
            template.render_user(vars),
        ))
    }

    /// Run one generation for `task`, reporting the outcome to the router
    async fn generate(
        &self,
        task: TaskType,
        system: Option<String>,
        prompt: String,
    ) -> Result<String> {
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

        let request = OllamaRequest {
            model: model.clone(),
            prompt,
            system,
            stream: false,
        };

        let result = self.send(&request, timeout).await;

        if let Ok(mut router) = self.router.write() {
            match &result {
                Ok(_) => router.record_success(&model),
                Err(e) => {
                    warn!(model = %model, task = task.as_str(), "Ollama call failed: {}", e);
                    router.record_failure(&model);
                }
            }
        }

        result
    }

    async fn send(&self, request: &OllamaRequest, timeout: std::time::Duration) -> Result<String> {
        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(timeout)
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        let ollama_response: OllamaResponse = response.json().await?;
        Ok(ollama_response.response)
    }
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl AIBackend for OllamaBackend {
    async fn classify_bucket(
        &self,
        category: &str,
        description: &str,
    ) -> Result<BucketClassification> {
        let mut vars = HashMap::new();
        vars.insert("category", category);
        vars.insert("description", description);
        let (system, prompt) = self.render(PromptId::ClassifyBucket, &vars)?;

        let response = self
            .generate(TaskType::FastClassification, system, prompt)
            .await?;
        debug!("Ollama bucket response: {}", response);

        parse_bucket_classification(&response)
    }

    async fn generate_coaching(&self, request: &CoachingRequest) -> Result<CoachingMessages> {
        let owned = request.prompt_vars();
        let vars: HashMap<&str, &str> = owned.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let (system, prompt) = self.render(PromptId::CoachingMessages, &vars)?;

        let response = self.generate(TaskType::Narrative, system, prompt).await?;
        debug!("Ollama coaching response: {}", response);

        Ok(parse_coaching_messages(&response))
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.default_model
    }

    fn host(&self) -> &str {
        &self.base_url
    }

    fn router_info(&self) -> RouterInfo {
        let mut task_models = Vec::new();
        let mut default_model = self.default_model.clone();
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
