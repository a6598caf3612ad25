//! Mock backend for tests and offline development
//!
//! Answers are deterministic: bucket lookups use a handful of keywords and
//! coaching text is a fixed sentence per status.

use async_trait::async_trait;

use crate::coach::CoachingRequest;
use crate::error::{Error, Result};
use crate::models::{CoachingMessages, InsightStatus};

use super::types::{BucketClassification, RouterInfo};
use super::AIBackend;

const FUN_KEYWORDS: &[&str] = &["swiggy", "zomato", "movie", "netflix", "party", "cafe"];
const BILLS_KEYWORDS: &[&str] = &["electric", "bill", "recharge", "wifi", "broadband", "emi"];
const ESSENTIALS_KEYWORDS: &[&str] = &[
    "uber", "ola", "rapido", "petrol", "fuel", "pharmacy", "grocery", "kirana",
];

#[derive(Clone, Default)]
pub struct MockBackend {
    pub healthy: bool,
    /// Every call returns an error
    pub failing: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            healthy: true,
            failing: false,
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            failing: false,
        }
    }

    /// Backend whose calls all fail, for exercising fallbacks
    pub fn failing() -> Self {
        Self {
            healthy: false,
            failing: true,
        }
    }

    pub fn with_model(&self, _model: &str) -> Self {
        self.clone()
    }

    fn check(&self) -> Result<()> {
        if self.failing {
            Err(Error::InvalidData("mock backend configured to fail".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn classify_bucket(
        &self,
        category: &str,
        description: &str,
    ) -> Result<BucketClassification> {
        self.check()?;

        let text = format!("{} {}", category, description).to_lowercase();
        let matches = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));

        let bucket = if matches(FUN_KEYWORDS) {
            "fun"
        } else if matches(BILLS_KEYWORDS) {
            "bills"
        } else if matches(ESSENTIALS_KEYWORDS) {
            "essentials"
        } else {
            "other"
        };

        Ok(BucketClassification {
            bucket: bucket.to_string(),
        })
    }

    async fn generate_coaching(&self, request: &CoachingRequest) -> Result<CoachingMessages> {
        self.check()?;

        let name = &request.name;
        let messages = match request.status {
            InsightStatus::NoIncomeData => CoachingMessages {
                daily_message: format!(
                    "{}, upload a bank statement so I can work out today's limit.",
                    name
                ),
                weekly_message: "Weekly planning needs your income data too.".to_string(),
                monthly_message: "Once your income is in, we can build monthly stability together."
                    .to_string(),
            },
            InsightStatus::WithinLimit => CoachingMessages {
                daily_message: format!("Nice work {}, you're within your safe daily limit.", name),
                weekly_message: "Days like this keep your week on track.".to_string(),
                monthly_message: "Keep this up and your savings will grow every month."
                    .to_string(),
            },
            InsightStatus::OverLimit => CoachingMessages {
                daily_message: format!(
                    "{}, you've gone past today's safe limit. Try to skip extras for the rest of the day.",
                    name
                ),
                weekly_message: "Spend a little less over the next few days to rebalance the week."
                    .to_string(),
                monthly_message: "One day over is a small setback; the month is still yours."
                    .to_string(),
            },
        };

        Ok(messages)
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }

    fn router_info(&self) -> RouterInfo {
        RouterInfo {
            default_model: "mock".to_string(),
            fallback_model: None,
            task_models: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;

    fn request(status: InsightStatus) -> CoachingRequest {
        CoachingRequest {
            name: "Ravi".to_string(),
            language: Language::En,
            status,
            estimated_daily_income: Some(1000.0),
            safe_daily_spend: Some(600.0),
            weekly_safe_spend: Some(4200.0),
            monthly_safe_spend: Some(18000.0),
            recommended_daily_savings: Some(200.0),
            spent_today: 700.0,
            remaining_today: -100.0,
        }
    }

    #[tokio::test]
    async fn test_keyword_buckets() {
        let mock = MockBackend::new();
        let bucket = |c: &'static str, d: &'static str| {
            let mock = mock.clone();
            async move { mock.classify_bucket(c, d).await.unwrap().bucket }
        };

        assert_eq!(bucket("misc", "Zomato dinner").await, "fun");
        assert_eq!(bucket("phone", "Jio recharge").await, "bills");
        assert_eq!(bucket("travel", "Rapido to hub").await, "essentials");
        assert_eq!(bucket("gift", "Birthday present").await, "other");
    }

    #[tokio::test]
    async fn test_coaching_per_status() {
        let mock = MockBackend::new();
        let over = mock
            .generate_coaching(&request(InsightStatus::OverLimit))
            .await
            .unwrap();
        assert!(over.daily_message.starts_with("Ravi"));
        assert!(over.daily_message.contains("past today's safe limit"));

        let within = mock
            .generate_coaching(&request(InsightStatus::WithinLimit))
            .await
            .unwrap();
        assert!(within.daily_message.contains("within your safe daily limit"));
        assert!(!within.weekly_message.is_empty());
    }

    #[tokio::test]
    async fn test_failing_backend() {
        let mock = MockBackend::failing();
        assert!(!mock.health_check().await);
        assert!(mock.classify_bucket("x", "y").await.is_err());
        assert!(mock
            .generate_coaching(&request(InsightStatus::WithinLimit))
            .await
            .is_err());
    }
}
