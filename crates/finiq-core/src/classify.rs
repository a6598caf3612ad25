//! Expense bucket classification
//!
//! A fixed category table decides first. Categories it doesn't know may be
//! sent to the AI backend, bounded by a timeout; anything that goes wrong on
//! that path lands in `other`. Classification never fails.
//!
//! AI answers are cached per classifier, so one classifier per import batch
//! asks about each distinct category/description pair at most once.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::ai::{AIBackend, AIClient};
use crate::models::{Bucket, ExpenseRecord, NewExpense};

/// Default bound on a single AI bucket lookup
pub const DEFAULT_AI_TIMEOUT: Duration = Duration::from_secs(10);

/// Which step produced a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentSource {
    Table,
    Ai,
    Fallback,
}

impl AssignmentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Ai => "ai",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BucketAssignment {
    pub bucket: Bucket,
    pub source: AssignmentSource,
}

impl BucketAssignment {
    fn fallback() -> Self {
        Self {
            bucket: Bucket::Other,
            source: AssignmentSource::Fallback,
        }
    }
}

/// Lowercase, trim, and turn spaces/hyphens into underscores
///
/// `"Food Delivery"`, `" food-delivery "` and `"FOOD_DELIVERY"` all become
/// `"food_delivery"`.
pub fn normalize_category(category: &str) -> String {
    category
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Look a category up in the fixed table
///
/// Returns None for categories the table doesn't know (an explicit `other`
/// is known and maps to `Bucket::Other`).
pub fn map_category_to_bucket(category: &str) -> Option<Bucket> {
    match normalize_category(category).as_str() {
        "food_delivery" | "eating_out" => Some(Bucket::Fun),
        "transport" | "groceries" | "medical" | "rent" => Some(Bucket::Essentials),
        "utilities" => Some(Bucket::Bills),
        "other" => Some(Bucket::Other),
        _ => None,
    }
}

/// Table-only classification: total, deterministic, no I/O
pub fn bucket_for_category(category: &str) -> Bucket {
    map_category_to_bucket(category).unwrap_or(Bucket::Other)
}

pub struct BucketClassifier {
    ai: Option<AIClient>,
    ai_timeout: Duration,
    /// (normalized category, description) -> answer, failures included
    ai_cache: Mutex<HashMap<(String, String), BucketAssignment>>,
}

impl BucketClassifier {
    pub fn new(ai: Option<AIClient>) -> Self {
        Self {
            ai,
            ai_timeout: DEFAULT_AI_TIMEOUT,
            ai_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Classifier that only uses the table
    pub fn table_only() -> Self {
        Self::new(None)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.ai_timeout = timeout;
        self
    }

    pub fn has_ai(&self) -> bool {
        self.ai.is_some()
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<(String, String), BucketAssignment>> {
        self.ai_cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bucket for a category/description pair
    pub async fn classify(&self, category: &str, description: &str) -> BucketAssignment {
        if let Some(bucket) = map_category_to_bucket(category) {
            debug!("Table matched '{}': {}", category, bucket);
            return BucketAssignment {
                bucket,
                source: AssignmentSource::Table,
            };
        }

        let Some(ai) = self.ai.as_ref() else {
            debug!("No table entry for '{}' and no AI backend, using other", category);
            return BucketAssignment::fallback();
        };

        let key = (normalize_category(category), description.trim().to_string());
        let cached = self.cache().get(&key).copied();
        if let Some(cached) = cached {
            debug!("AI cache hit for '{}'", category);
            return cached;
        }

        let assignment = self.ask_ai(ai, category, description).await;
        self.cache().insert(key, assignment);
        assignment
    }

    async fn ask_ai(&self, ai: &AIClient, category: &str, description: &str) -> BucketAssignment {
        let call = ai.classify_bucket(category, description);

        match tokio::time::timeout(self.ai_timeout, call).await {
            Ok(Ok(answer)) => match answer.to_bucket() {
                Some(bucket) => {
                    debug!("AI classified '{}' as {}", category, bucket);
                    BucketAssignment {
                        bucket,
                        source: AssignmentSource::Ai,
                    }
                }
                None => {
                    warn!(
                        "AI returned unknown bucket '{}' for '{}', using other",
                        answer.bucket, category
                    );
                    BucketAssignment::fallback()
                }
            },
            Ok(Err(e)) => {
                warn!("AI bucket lookup failed for '{}': {}", category, e);
                BucketAssignment::fallback()
            }
            Err(_) => {
                warn!(
                    "AI bucket lookup for '{}' timed out after {:?}",
                    category, self.ai_timeout
                );
                BucketAssignment::fallback()
            }
        }
    }

    /// Tag a new expense with its bucket
    pub async fn record_expense(&self, expense: NewExpense) -> ExpenseRecord {
        let category = expense.category.as_deref().unwrap_or("");
        let assignment = self.classify(category, &expense.description).await;

        ExpenseRecord {
            date: expense.date,
            amount: expense.amount,
            description: expense.description,
            category: expense.category,
            bucket: Some(assignment.bucket),
        }
    }

    /// Tag a batch of expenses, in order
    pub async fn classify_records(&self, expenses: Vec<NewExpense>) -> Vec<ExpenseRecord> {
        let mut records = Vec::with_capacity(expenses.len());
        for expense in expenses {
            records.push(self.record_expense(expense).await);
        }
        records
    }
}

impl Default for BucketClassifier {
    fn default() -> Self {
        Self::table_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use chrono::NaiveDate;

    #[test]
    fn test_table() {
        assert_eq!(map_category_to_bucket("utilities"), Some(Bucket::Bills));
        assert_eq!(map_category_to_bucket("food_delivery"), Some(Bucket::Fun));
        assert_eq!(map_category_to_bucket("eating_out"), Some(Bucket::Fun));
        assert_eq!(map_category_to_bucket("transport"), Some(Bucket::Essentials));
        assert_eq!(map_category_to_bucket("groceries"), Some(Bucket::Essentials));
        assert_eq!(map_category_to_bucket("medical"), Some(Bucket::Essentials));
        assert_eq!(map_category_to_bucket("rent"), Some(Bucket::Essentials));
        assert_eq!(map_category_to_bucket("other"), Some(Bucket::Other));
        assert_eq!(map_category_to_bucket("unknown_cat"), None);
        assert_eq!(bucket_for_category("unknown_cat"), Bucket::Other);
    }

    #[test]
    fn test_normalization() {
        assert_eq!(normalize_category("  Food Delivery "), "food_delivery");
        assert_eq!(normalize_category("EATING-OUT"), "eating_out");
        assert_eq!(map_category_to_bucket(" Utilities "), Some(Bucket::Bills));
        assert_eq!(map_category_to_bucket(""), None);
    }

    #[tokio::test]
    async fn test_table_wins_over_ai() {
        let classifier = BucketClassifier::new(Some(AIClient::mock()));
        // The mock would say "fun" for anything mentioning Swiggy
        let result = classifier.classify("groceries", "Swiggy Instamart").await;
        assert_eq!(result.bucket, Bucket::Essentials);
        assert_eq!(result.source, AssignmentSource::Table);
    }

    #[tokio::test]
    async fn test_ai_for_unknown_category() {
        let classifier = BucketClassifier::new(Some(AIClient::mock()));
        let result = classifier.classify("phone", "Airtel recharge").await;
        assert_eq!(result.bucket, Bucket::Bills);
        assert_eq!(result.source, AssignmentSource::Ai);
    }

    #[tokio::test]
    async fn test_no_ai_falls_back_to_other() {
        let classifier = BucketClassifier::table_only();
        let result = classifier.classify("unknown_cat", "").await;
        assert_eq!(result, BucketAssignment::fallback());
    }

    #[tokio::test]
    async fn test_ai_failure_falls_back_to_other() {
        let classifier = BucketClassifier::new(Some(AIClient::Mock(MockBackend::failing())));
        let result = classifier.classify("pets", "Dog food").await;
        assert_eq!(result.bucket, Bucket::Other);
        assert_eq!(result.source, AssignmentSource::Fallback);
    }

    #[tokio::test]
    async fn test_answers_are_cached() {
        let classifier = BucketClassifier::new(Some(AIClient::mock()));
        let first = classifier.classify("Phone", "Jio recharge").await;
        let second = classifier.classify("phone ", "Jio recharge").await;
        assert_eq!(first, second);
        assert_eq!(classifier.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_record_expense_sets_bucket() {
        let classifier = BucketClassifier::table_only();
        let date = NaiveDate::from_ymd_opt(2024, 11, 5)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();

        let records = classifier
            .classify_records(vec![
                NewExpense {
                    date,
                    amount: -120.0,
                    description: "Auto".into(),
                    category: Some("transport".into()),
                },
                NewExpense::from_bill(date, 800.0, "Electricity bill", Some("utilities".into())),
                NewExpense {
                    date,
                    amount: -40.0,
                    description: "Chai".into(),
                    category: None,
                },
            ])
            .await;

        assert_eq!(records[0].bucket, Some(Bucket::Essentials));
        assert_eq!(records[1].bucket, Some(Bucket::Bills));
        assert_eq!(records[1].amount, -800.0);
        assert_eq!(records[2].bucket, Some(Bucket::Other));
    }
}
