//! AI backend response types

use serde::{Deserialize, Serialize};

use crate::models::Bucket;

/// Router configuration, for display
#[derive(Debug, Clone)]
pub struct RouterInfo {
    pub default_model: String,
    pub fallback_model: Option<String>,
    /// Task-specific models that differ from the default
    pub task_models: Vec<(String, String)>,
}

/// Raw bucket answer from a model: `{"bucket": "fun"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketClassification {
    pub bucket: String,
}

impl BucketClassification {
    /// The answer as a known bucket, if it is one
    pub fn to_bucket(&self) -> Option<Bucket> {
        self.bucket.parse().ok()
    }
}
