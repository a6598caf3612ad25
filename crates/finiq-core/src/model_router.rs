//! Task-based model selection for the AI backends
//!
//! Bucket lookups want a small fast model with a short timeout; coaching text
//! can afford a larger one. The router picks a model per task, tracks
//! consecutive failures per model and falls back when a model goes unhealthy.
//!
//! Config resolution:
//! 1. `<data_local_dir>/finiq/config/models.toml` (or an explicit path)
//! 2. the embedded `config/models.toml`

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};

const DEFAULT_CONFIG: &str = include_str!("../../../config/models.toml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    /// Category → bucket lookups
    FastClassification,
    /// Coaching messages
    Narrative,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FastClassification => "fast_classification",
            Self::Narrative => "narrative",
        }
    }

    pub fn all() -> &'static [TaskType] {
        &[Self::FastClassification, Self::Narrative]
    }
}

impl std::str::FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "fast_classification" => Ok(Self::FastClassification),
            "narrative" => Ok(Self::Narrative),
            _ => Err(format!("Unknown task type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskConfig {
    /// None means "use the default model"
    pub model: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Default)]
struct ModelHealth {
    consecutive_failures: u32,
    unhealthy_since: Option<Instant>,
}

#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub default_model: String,
    pub default_timeout: Duration,
    pub fallback_model: Option<String>,
    pub tasks: HashMap<TaskType, TaskConfig>,
    /// Consecutive failures before a model is skipped
    pub failure_threshold: u32,
    /// How long an unhealthy model is skipped before it gets another try
    pub recovery_wait: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_model: "gemma3".to_string(),
            default_timeout: Duration::from_secs(30),
            fallback_model: Some("llama3.2".to_string()),
            tasks: HashMap::new(),
            failure_threshold: 3,
            recovery_wait: Duration::from_secs(300),
        }
    }
}

pub struct ModelRouter {
    config: RouterConfig,
    health: HashMap<String, ModelHealth>,
    config_path: Option<PathBuf>,
}

impl ModelRouter {
    /// Router using the override file if present, else the embedded defaults
    pub fn new() -> Result<Self> {
        let path = default_config_path();
        let config = load_config(path.as_deref())?;
        Ok(Self {
            config,
            health: HashMap::new(),
            config_path: path,
        })
    }

    pub fn with_config_path(path: PathBuf) -> Result<Self> {
        let config = load_config(Some(&path))?;
        Ok(Self {
            config,
            health: HashMap::new(),
            config_path: Some(path),
        })
    }

    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            config,
            health: HashMap::new(),
            config_path: None,
        }
    }

    /// Model for a task: task override, then default, then fallback
    ///
    /// If every candidate is unhealthy the default is returned anyway so the
    /// caller fails loudly instead of silently skipping the call.
    pub fn model_for_task(&self, task: TaskType) -> &str {
        if let Some(model) = self.config.tasks.get(&task).and_then(|t| t.model.as_ref()) {
            if self.is_healthy(model) {
                return model;
            }
        }

        if self.is_healthy(&self.config.default_model) {
            return &self.config.default_model;
        }

        if let Some(ref fallback) = self.config.fallback_model {
            if self.is_healthy(fallback) {
                return fallback;
            }
        }

        &self.config.default_model
    }

    /// Replace the default model, e.g. with the one named in `OLLAMA_MODEL`
    pub fn set_default_model(&mut self, model: &str) {
        self.config.default_model = model.to_string();
    }

    pub fn timeout_for_task(&self, task: TaskType) -> Duration {
        self.config
            .tasks
            .get(&task)
            .map(|c| c.timeout)
            .unwrap_or(self.config.default_timeout)
    }

    pub fn record_success(&mut self, model: &str) {
        let health = self.health.entry(model.to_string()).or_default();
        health.consecutive_failures = 0;
        health.unhealthy_since = None;
    }

    /// Record a failed call; returns true once the model crosses the threshold
    pub fn record_failure(&mut self, model: &str) -> bool {
        let threshold = self.config.failure_threshold;
        let health = self.health.entry(model.to_string()).or_default();
        health.consecutive_failures += 1;

        if health.consecutive_failures >= threshold {
            if health.unhealthy_since.is_none() {
                warn!(
                    model,
                    failures = health.consecutive_failures,
                    "Model marked unhealthy"
                );
            }
            // Restart the recovery window on every failure past the threshold
            health.unhealthy_since = Some(Instant::now());
            true
        } else {
            false
        }
    }

    pub fn is_healthy(&self, model: &str) -> bool {
        match self.health.get(model) {
            Some(h) if h.consecutive_failures >= self.config.failure_threshold => h
                .unhealthy_since
                .is_some_and(|since| since.elapsed() >= self.config.recovery_wait),
            _ => true,
        }
    }

    pub fn fallback_model(&self) -> Option<&str> {
        self.config.fallback_model.as_deref()
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }

    pub fn reload(&mut self) -> Result<()> {
        self.config = load_config(self.config_path.as_deref())?;
        debug!("Reloaded model routing config");
        Ok(())
    }
}

impl Default for ModelRouter {
    fn default() -> Self {
        Self::new().unwrap_or_else(|e| {
            warn!("Falling back to built-in model routing: {}", e);
            Self::with_config(RouterConfig::default())
        })
    }
}

/// Override location for models.toml
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("finiq").join("config").join("models.toml"))
}

fn load_config(override_path: Option<&Path>) -> Result<RouterConfig> {
    let content = match override_path {
        Some(path) if path.exists() => fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?,
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    defaults: Option<RawDefaults>,
    models: Option<HashMap<String, RawTaskConfig>>,
    health: Option<RawHealth>,
}

#[derive(Debug, Deserialize)]
struct RawDefaults {
    model: Option<String>,
    timeout_secs: Option<u64>,
    fallback_model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTaskConfig {
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawHealth {
    failure_threshold: Option<u32>,
    recovery_wait_secs: Option<u64>,
}

fn parse_config(content: &str) -> Result<RouterConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid models.toml: {}", e)))?;

    let mut config = RouterConfig::default();

    if let Some(defaults) = raw.defaults {
        if let Some(model) = defaults.model {
            config.default_model = model;
        }
        if let Some(timeout) = defaults.timeout_secs {
            config.default_timeout = Duration::from_secs(timeout);
        }
        if let Some(fallback) = defaults.fallback_model {
            config.fallback_model = Some(fallback);
        }
    }

    for (task_name, task_config) in raw.models.unwrap_or_default() {
        let Ok(task) = task_name.parse::<TaskType>() else {
            debug!("Ignoring unknown task type in models.toml: {}", task_name);
            continue;
        };

        config.tasks.insert(
            task,
            TaskConfig {
                model: task_config.model,
                timeout: task_config
                    .timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(config.default_timeout),
            },
        );
    }

    if let Some(health) = raw.health {
        if let Some(threshold) = health.failure_threshold {
            config.failure_threshold = threshold;
        }
        if let Some(wait) = health.recovery_wait_secs {
            config.recovery_wait = Duration::from_secs(wait);
        }
    }

    Ok(config)
}
