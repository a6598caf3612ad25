//! Finiq Core Library
//!
//! Budgeting engine for gig workers with irregular income:
//! - Income estimation from statement credits
//! - Bucket allocation into daily/weekly/monthly limits
//! - Daily insight: today's spend against the safe limit
//! - Expense bucket classification (fixed table, optional AI)
//! - Coaching messages through pluggable local AI backends
//! - Model router and prompt library for those backends
//! - Statement and expense CSV import

pub mod ai;
pub mod budget;
pub mod classify;
pub mod coach;
pub mod config;
pub mod daily;
pub mod error;
pub mod import;
pub mod income;
pub mod model_router;
pub mod models;
pub mod prompts;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    AIBackend, AIClient, BucketClassification, MockBackend, OllamaBackend,
    OpenAICompatibleBackend, RouterInfo,
};
pub use budget::{budget_for_profile, compute_budget_summary, validate_policy};
pub use classify::{
    bucket_for_category, map_category_to_bucket, AssignmentSource, BucketAssignment,
    BucketClassifier,
};
pub use coach::{build_daily_report, generate_messages, CoachingRequest};
pub use config::Settings;
pub use daily::{evaluate_daily_insight, spent_on};
pub use error::{Error, Result};
pub use income::{estimate_daily_income, estimate_from_csv, IncomeEstimate};
pub use model_router::{ModelRouter, RouterConfig, TaskConfig, TaskType};
pub use models::*;
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
