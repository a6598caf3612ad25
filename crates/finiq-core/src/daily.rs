//! Daily insight: today's spend against the safe daily limit

use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::budget::{DAYS_PER_MONTH, SPEND_LIMIT_DAYS_PER_WEEK};
use crate::models::{DailyInsight, ExpenseRecord, IncomeProfile, InsightStatus};

/// Share of daily income considered safe to spend
pub const SAFE_SPEND_SHARE: f64 = 0.60;
/// Share of daily income recommended for savings
pub const SAVINGS_SHARE: f64 = 0.20;

/// Evaluate one day's spend for a user
///
/// Without a usable daily income rate (missing, zero, negative or not finite)
/// every derived figure is `None` and `remaining_today` is zero;
/// `spent_today` is reported as given.
pub fn evaluate_daily_insight(
    user_id: i64,
    date: NaiveDate,
    profile: &IncomeProfile,
    spent_today: f64,
) -> DailyInsight {
    let d = match profile.estimated_daily {
        Some(d) if d.is_finite() && d > 0.0 => d,
        _ => {
            debug!(user_id, %date, "No income data for daily insight");
            return DailyInsight {
                user_id,
                date,
                estimated_daily_income: None,
                safe_daily_spend: None,
                recommended_daily_savings: None,
                spent_today,
                remaining_today: 0.0,
                status: InsightStatus::NoIncomeData,
                weekly_safe_spend: None,
                monthly_safe_spend: None,
            };
        }
    };

    let safe_daily = d * SAFE_SPEND_SHARE;
    let remaining_today = safe_daily - spent_today;
    let status = if remaining_today >= 0.0 {
        InsightStatus::WithinLimit
    } else {
        InsightStatus::OverLimit
    };

    debug!(user_id, %date, safe_daily, spent_today, %status, "Evaluated daily insight");

    DailyInsight {
        user_id,
        date,
        estimated_daily_income: Some(d),
        safe_daily_spend: Some(safe_daily),
        recommended_daily_savings: Some(d * SAVINGS_SHARE),
        spent_today,
        remaining_today,
        status,
        weekly_safe_spend: Some(d * SPEND_LIMIT_DAYS_PER_WEEK * SAFE_SPEND_SHARE),
        monthly_safe_spend: Some(d * DAYS_PER_MONTH * SAFE_SPEND_SHARE),
    }
}

/// First and last second of a calendar day (both inclusive)
pub fn day_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(chrono::NaiveTime::MIN);
    let end = start + chrono::Duration::seconds(86_399);
    (start, end)
}

/// Total money out on `date`: the magnitude of every negative amount within
/// the day's bounds. Income on the same day does not offset spending.
pub fn spent_on(records: &[ExpenseRecord], date: NaiveDate) -> f64 {
    let (start, end) = day_bounds(date);
    records
        .iter()
        .filter(|r| r.is_expense() && r.date >= start && r.date <= end)
        .map(|r| r.amount.abs())
        .sum()
}

/// The caller's local calendar date
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}
