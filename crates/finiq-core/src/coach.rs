//! Coaching messages for an evaluated day
//!
//! The numbers come from the daily insight; the model only words them. Any
//! failure to reach the model produces three empty messages, never an error.

use tracing::warn;

use crate::ai::{AIBackend, AIClient};
use crate::models::{CoachingMessages, DailyInsight, DailyReport, InsightStatus, Language};

/// Everything the message generator is told about the day
#[derive(Debug, Clone, PartialEq)]
pub struct CoachingRequest {
    pub name: String,
    pub language: Language,
    pub status: InsightStatus,
    pub estimated_daily_income: Option<f64>,
    pub safe_daily_spend: Option<f64>,
    pub weekly_safe_spend: Option<f64>,
    pub monthly_safe_spend: Option<f64>,
    pub recommended_daily_savings: Option<f64>,
    pub spent_today: f64,
    pub remaining_today: f64,
}

impl CoachingRequest {
    pub fn from_insight(insight: &DailyInsight, name: &str, language: Language) -> Self {
        Self {
            name: name.to_string(),
            language,
            status: insight.status,
            estimated_daily_income: insight.estimated_daily_income,
            safe_daily_spend: insight.safe_daily_spend,
            weekly_safe_spend: insight.weekly_safe_spend,
            monthly_safe_spend: insight.monthly_safe_spend,
            recommended_daily_savings: insight.recommended_daily_savings,
            spent_today: insight.spent_today,
            remaining_today: insight.remaining_today,
        }
    }

    /// Template variables for the `coaching_messages` prompt
    pub fn prompt_vars(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.name.clone()),
            (
                "estimated_daily_income",
                format_optional_amount(self.estimated_daily_income),
            ),
            ("safe_daily_spend", format_optional_amount(self.safe_daily_spend)),
            ("weekly_safe_spend", format_optional_amount(self.weekly_safe_spend)),
            ("monthly_safe_spend", format_optional_amount(self.monthly_safe_spend)),
            (
                "recommended_daily_savings",
                format_optional_amount(self.recommended_daily_savings),
            ),
            ("spent_today", format_amount(self.spent_today)),
            ("remaining_today", format_amount(self.remaining_today)),
            ("status", self.status.as_str().to_string()),
            ("status_instructions", status_instructions(self.status).to_string()),
            (
                "language_instruction",
                language_instruction(self.language).to_string(),
            ),
        ]
    }
}

/// Whole currency units, half to even
pub fn format_amount(amount: f64) -> String {
    let rounded = amount.round_ties_even();
    // Avoid printing "-0"
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{:.0}", rounded)
    }
}

/// Like `format_amount`, with `unknown` for a missing figure
pub fn format_optional_amount(amount: Option<f64>) -> String {
    amount.map(format_amount).unwrap_or_else(|| "unknown".to_string())
}

fn status_instructions(status: InsightStatus) -> &'static str {
    match status {
        InsightStatus::NoIncomeData => {
            "Income data is missing. Write three short messages:\n\
             - daily_message: Explain that you can't give today's limit until they upload a bank statement.\n\
             - weekly_message: Explain that weekly planning also needs income data.\n\
             - monthly_message: Encourage them that once data is uploaded, you can help build monthly stability."
        }
        InsightStatus::WithinLimit => {
            "The user is within today's safe spending limit. Write:\n\
             - daily_message: praise them, mention they are within their safe daily limit.\n\
             - weekly_message: connect today's good behavior to staying on track for the week (safe weekly spend).\n\
             - monthly_message: connect this pattern to building long-term stability (safe monthly spend & savings)."
        }
        InsightStatus::OverLimit => {
            "The user has overspent today's limit. Write:\n\
             - daily_message: gently highlight overspending and suggest one or two simple actions today.\n\
             - weekly_message: talk about rebalancing the week's spending to stay near the safe weekly budget.\n\
             - monthly_message: frame this as a small setback and encourage better habits for the rest of the month."
        }
    }
}

fn language_instruction(language: Language) -> &'static str {
    match language {
        Language::Hi => "Respond in simple Hindi, you may mix common English money words.",
        Language::Hinglish => "Respond in Hinglish (Hindi+English mix), casual and friendly.",
        Language::En => "Respond in simple English.",
    }
}

/// Ask the backend for messages; empty messages if there is no backend or the call fails
pub async fn generate_messages(ai: Option<&AIClient>, request: &CoachingRequest) -> CoachingMessages {
    let Some(ai) = ai else {
        return CoachingMessages::default();
    };

    match ai.generate_coaching(request).await {
        Ok(messages) => messages,
        Err(e) => {
            warn!(
                backend = ai.backend_name(),
                status = %request.status,
                "Coaching message generation failed: {}",
                e
            );
            CoachingMessages::default()
        }
    }
}

/// Insight plus coaching messages, as served to the user
pub async fn build_daily_report(
    ai: Option<&AIClient>,
    insight: DailyInsight,
    name: &str,
    language: Language,
) -> DailyReport {
    let request = CoachingRequest::from_insight(&insight, name, language);
    let message = generate_messages(ai, &request).await;
    DailyReport { insight, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::daily::evaluate_daily_insight;
    use crate::models::IncomeProfile;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn insight(profile: &IncomeProfile, spent: f64) -> DailyInsight {
        evaluate_daily_insight(1, NaiveDate::from_ymd_opt(2024, 11, 5).unwrap(), profile, spent)
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(599.6), "600");
        assert_eq!(format_amount(100.5), "100");
        assert_eq!(format_amount(101.5), "102");
        assert_eq!(format_amount(-99.7), "-100");
        assert_eq!(format_amount(-0.2), "0");
        assert_eq!(format_optional_amount(None), "unknown");
    }

    #[test]
    fn test_prompt_vars_with_income() {
        let request = CoachingRequest::from_insight(
            &insight(&IncomeProfile::from_daily(1000.0), 700.0),
            "Asha",
            Language::Hinglish,
        );
        let vars: HashMap<_, _> = request.prompt_vars().into_iter().collect();

        assert_eq!(vars["name"], "Asha");
        assert_eq!(vars["safe_daily_spend"], "600");
        assert_eq!(vars["weekly_safe_spend"], "4200");
        assert_eq!(vars["monthly_safe_spend"], "18000");
        assert_eq!(vars["remaining_today"], "-100");
        assert_eq!(vars["status"], "over_limit");
        assert!(vars["status_instructions"].contains("overspent"));
        assert!(vars["language_instruction"].contains("Hinglish"));
    }

    #[test]
    fn test_prompt_vars_without_income() {
        let request = CoachingRequest::from_insight(
            &insight(&IncomeProfile::default(), 120.0),
            "Asha",
            Language::Hi,
        );
        let vars: HashMap<_, _> = request.prompt_vars().into_iter().collect();

        assert_eq!(vars["estimated_daily_income"], "unknown");
        assert_eq!(vars["safe_daily_spend"], "unknown");
        assert_eq!(vars["spent_today"], "120");
        assert_eq!(vars["remaining_today"], "0");
        assert!(vars["status_instructions"].contains("Income data is missing"));
        assert!(vars["language_instruction"].contains("Hindi"));
    }

    #[tokio::test]
    async fn test_no_backend_gives_empty_messages() {
        let report = build_daily_report(
            None,
            insight(&IncomeProfile::from_daily(1000.0), 500.0),
            "Asha",
            Language::En,
        )
        .await;
        assert_eq!(report.message, CoachingMessages::default());
        assert_eq!(report.insight.status, InsightStatus::WithinLimit);
    }

    #[tokio::test]
    async fn test_failing_backend_gives_empty_messages() {
        let ai = AIClient::Mock(MockBackend::failing());
        let report = build_daily_report(
            Some(&ai),
            insight(&IncomeProfile::from_daily(1000.0), 500.0),
            "Asha",
            Language::En,
        )
        .await;
        assert!(report.message.daily_message.is_empty());
        assert!(report.message.weekly_message.is_empty());
        assert!(report.message.monthly_message.is_empty());
    }

    #[tokio::test]
    async fn test_report_serializes_flat() {
        let ai = AIClient::mock();
        let report = build_daily_report(
            Some(&ai),
            insight(&IncomeProfile::from_daily(1000.0), 700.0),
            "Asha",
            Language::En,
        )
        .await;

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "over_limit");
        assert_eq!(json["remaining_today"], -100.0);
        assert!(json["message"]["daily_message"]
            .as_str()
            .unwrap()
            .starts_with("Asha"));
    }
}
