//! User settings: allocation policy, coaching defaults, classifier options
//!
//! Resolution order:
//! 1. an explicit path (`--config`)
//! 2. `<data_local_dir>/finiq/config/finiq.toml`
//! 3. the embedded `config/finiq.toml`
//!
//! Keys missing from a file keep their built-in values.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{AllocationPolicy, Language, PolicyValidation};

const DEFAULT_SETTINGS: &str = include_str!("../../../config/finiq.toml");

#[derive(Debug, Clone, PartialEq)]
pub struct CoachingSettings {
    pub language: Language,
    /// How the coach addresses the user
    pub name: String,
}

impl Default for CoachingSettings {
    fn default() -> Self {
        Self {
            language: Language::En,
            name: "friend".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierSettings {
    pub use_ai: bool,
    pub timeout: Duration,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            use_ai: true,
            timeout: crate::classify::DEFAULT_AI_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub policy: AllocationPolicy,
    pub validation: PolicyValidation,
    pub coaching: CoachingSettings,
    pub classifier: ClassifierSettings,
    /// File the settings were read from, if not the built-in defaults
    pub source: Option<PathBuf>,
}

impl Settings {
    /// Load from an explicit path, the user override, or the built-in file
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::from_file(path);
        }

        match default_settings_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Self::from_toml(DEFAULT_SETTINGS),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let mut settings = Self::from_toml(&content)?;
        debug!("Loaded settings from {}", path.display());
        settings.source = Some(path.to_path_buf());
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawSettings = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid finiq.toml: {}", e)))?;

        let mut settings = Self::default();

        if let Some(policy) = raw.policy {
            let defaults = AllocationPolicy::default();
            settings.policy = AllocationPolicy {
                essentials_pct: policy.essentials_pct.unwrap_or(defaults.essentials_pct),
                bills_pct: policy.bills_pct.unwrap_or(defaults.bills_pct),
                savings_pct: policy.savings_pct.unwrap_or(defaults.savings_pct),
                fun_pct: policy.fun_pct.unwrap_or(defaults.fun_pct),
            };
            if let Some(validation) = policy.validation {
                settings.validation = validation.parse().map_err(Error::Config)?;
            }
        }

        if let Some(coaching) = raw.coaching {
            if let Some(language) = coaching.language {
                settings.coaching.language = language.parse().map_err(Error::Config)?;
            }
            if let Some(name) = coaching.name {
                settings.coaching.name = name;
            }
        }

        if let Some(classifier) = raw.classifier {
            if let Some(use_ai) = classifier.use_ai {
                settings.classifier.use_ai = use_ai;
            }
            if let Some(secs) = classifier.timeout_secs {
                settings.classifier.timeout = Duration::from_secs(secs);
            }
        }

        Ok(settings)
    }
}

/// Override location for finiq.toml
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("finiq").join("config").join("finiq.toml"))
}

/// Default location for the saved income profile
pub fn default_profile_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("finiq").join("profile.json"))
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    policy: Option<RawPolicy>,
    coaching: Option<RawCoaching>,
    classifier: Option<RawClassifier>,
}

#[derive(Debug, Deserialize)]
struct RawPolicy {
    essentials_pct: Option<f64>,
    bills_pct: Option<f64>,
    savings_pct: Option<f64>,
    fun_pct: Option<f64>,
    validation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCoaching {
    language: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawClassifier {
    use_ai: Option<bool>,
    timeout_secs: Option<u64>,
}
