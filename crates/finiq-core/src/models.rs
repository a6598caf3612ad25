//! Domain models for finiq

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Coarse spending bucket used for allocation and expense tagging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Essentials,
    Bills,
    Fun,
    #[default]
    Other,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Essentials => "essentials",
            Self::Bills => "bills",
            Self::Fun => "fun",
            Self::Other => "other",
        }
    }

    pub fn all() -> &'static [Bucket] {
        &[Self::Essentials, Self::Bills, Self::Fun, Self::Other]
    }
}

impl std::str::FromStr for Bucket {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "essentials" => Ok(Self::Essentials),
            "bills" => Ok(Self::Bills),
            "fun" => Ok(Self::Fun),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown bucket: {}", s)),
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A dated income amount read from a statement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomeObservation {
    pub date: NaiveDate,
    pub amount: f64,
}

impl IncomeObservation {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }
}

/// How allocation percentages that don't sum to 1.0 are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PolicyValidation {
    /// Accept any non-negative split silently
    Permissive,
    /// Accept, but log a warning
    #[default]
    Warn,
    /// Reject with `Error::InvalidPolicy`
    Strict,
}

impl PolicyValidation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Permissive => "permissive",
            Self::Warn => "warn",
            Self::Strict => "strict",
        }
    }
}

impl std::str::FromStr for PolicyValidation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "permissive" => Ok(Self::Permissive),
            "warn" => Ok(Self::Warn),
            "strict" => Ok(Self::Strict),
            _ => Err(format!("Unknown policy validation: {}", s)),
        }
    }
}

impl std::fmt::Display for PolicyValidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fractions of monthly income assigned to each bucket
///
/// Fields missing from a config file take the 50/20/20/10 defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationPolicy {
    pub essentials_pct: f64,
    pub bills_pct: f64,
    pub savings_pct: f64,
    pub fun_pct: f64,
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self {
            essentials_pct: 0.50,
            bills_pct: 0.20,
            savings_pct: 0.20,
            fun_pct: 0.10,
        }
    }
}

impl AllocationPolicy {
    pub fn total(&self) -> f64 {
        self.essentials_pct + self.bills_pct + self.savings_pct + self.fun_pct
    }
}

/// Income rates derived from the latest statement
///
/// `estimated_daily == None` means no statement has produced an estimate yet.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IncomeProfile {
    pub estimated_daily: Option<f64>,
    pub estimated_weekly: Option<f64>,
    pub estimated_monthly: Option<f64>,
}

/// Per-period income and bucket limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub estimated_daily_income: f64,
    pub estimated_weekly_income: f64,
    pub estimated_monthly_income: f64,

    pub daily_essentials_limit: f64,
    pub daily_bills_limit: f64,
    pub daily_savings_target: f64,
    pub daily_fun_limit: f64,
    pub daily_spend_limit: f64,

    pub weekly_essentials_limit: f64,
    pub weekly_bills_limit: f64,
    pub weekly_savings_target: f64,
    pub weekly_fun_limit: f64,
    pub weekly_spend_limit: f64,

    pub monthly_essentials_limit: f64,
    pub monthly_bills_limit: f64,
    pub monthly_savings_target: f64,
    pub monthly_fun_limit: f64,
    pub monthly_spend_limit: f64,
}

/// Where today's spend stands against the safe daily limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightStatus {
    NoIncomeData,
    WithinLimit,
    OverLimit,
}

impl InsightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoIncomeData => "no_income_data",
            Self::WithinLimit => "within_limit",
            Self::OverLimit => "over_limit",
        }
    }
}

impl std::str::FromStr for InsightStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "no_income_data" => Ok(Self::NoIncomeData),
            "within_limit" => Ok(Self::WithinLimit),
            "over_limit" => Ok(Self::OverLimit),
            _ => Err(format!("Unknown insight status: {}", s)),
        }
    }
}

impl std::fmt::Display for InsightStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of evaluating one day's spend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyInsight {
    pub user_id: i64,
    pub date: NaiveDate,
    pub estimated_daily_income: Option<f64>,
    pub safe_daily_spend: Option<f64>,
    pub recommended_daily_savings: Option<f64>,
    pub spent_today: f64,
    /// Negative when overspent
    pub remaining_today: f64,
    pub status: InsightStatus,
    pub weekly_safe_spend: Option<f64>,
    pub monthly_safe_spend: Option<f64>,
}

/// Language for coaching messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Hinglish,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::Hinglish => "hinglish",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "hi" | "hindi" => Ok(Self::Hi),
            "hinglish" => Ok(Self::Hinglish),
            _ => Err(format!("Unknown language: {}", s)),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Daily, weekly and monthly coaching text
///
/// Any of the three may be empty when message generation failed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoachingMessages {
    #[serde(default)]
    pub daily_message: String,
    #[serde(default)]
    pub weekly_message: String,
    #[serde(default)]
    pub monthly_message: String,
}

/// A daily insight together with its coaching messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    #[serde(flatten)]
    pub insight: DailyInsight,
    pub message: CoachingMessages,
}

/// An expense or income transaction as read from storage or CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub date: NaiveDateTime,
    /// Positive = income, negative = expense
    pub amount: f64,
    pub description: String,
    pub category: Option<String>,
    pub bucket: Option<Bucket>,
}

impl ExpenseRecord {
    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }
}

/// An expense about to be recorded (bucket not yet assigned)
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub date: NaiveDateTime,
    pub amount: f64,
    pub description: String,
    pub category: Option<String>,
}

impl NewExpense {
    /// Build an expense from a scanned bill; bills are always outgoing money
    pub fn from_bill(
        date: NaiveDateTime,
        amount: f64,
        description: impl Into<String>,
        category: Option<String>,
    ) -> Self {
        Self {
            date,
            amount: -amount.abs(),
            description: description.into(),
            category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_round_trip_str() {
        for bucket in Bucket::all() {
            assert_eq!(bucket.as_str().parse::<Bucket>().unwrap(), *bucket);
        }
        assert!("savings".parse::<Bucket>().is_err());
    }

    #[test]
    fn test_policy_defaults() {
        let policy = AllocationPolicy::default();
        assert_eq!(policy.essentials_pct, 0.50);
        assert_eq!(policy.fun_pct, 0.10);
        assert!((policy.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_policy_uses_defaults() {
        let policy: AllocationPolicy = toml::from_str("savings_pct = 0.3").unwrap();
        assert_eq!(policy.savings_pct, 0.3);
        assert_eq!(policy.essentials_pct, 0.50);
        assert_eq!(policy.bills_pct, 0.20);
    }

    #[test]
    fn test_bill_amount_is_negative() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 29)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bill = NewExpense::from_bill(date, 450.0, "Electricity bill", None);
        assert_eq!(bill.amount, -450.0);

        let already_negative = NewExpense::from_bill(date, -120.0, "Swiggy order", None);
        assert_eq!(already_negative.amount, -120.0);
    }

    #[test]
    fn test_insight_status_serializes_snake_case() {
        let json = serde_json::to_string(&InsightStatus::NoIncomeData).unwrap();
        assert_eq!(json, "\"no_income_data\"");
    }

    #[test]
    fn test_language_parse() {
        assert_eq!("HI".parse::<Language>().unwrap(), Language::Hi);
        assert_eq!("hinglish".parse::<Language>().unwrap(), Language::Hinglish);
        assert!("fr".parse::<Language>().is_err());
    }
}
