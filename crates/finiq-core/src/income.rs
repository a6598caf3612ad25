//! Income estimation from statement credits
//!
//! Gig income arrives on irregular days, so the daily rate is the average over
//! days that actually had income, not over calendar days in the statement.

use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::import::parse_income_csv;
use crate::models::{IncomeObservation, IncomeProfile};

/// Days used to turn a daily income rate into a weekly one
pub const INCOME_DAYS_PER_WEEK: f64 = 6.0;
/// Days used to turn a daily income rate into a monthly one
pub const INCOME_DAYS_PER_MONTH: f64 = 30.0;

/// Outcome of an estimation run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncomeEstimate {
    pub total_income: f64,
    pub income_days: usize,
    pub estimated_daily: f64,
}

impl IncomeEstimate {
    pub fn estimated_weekly(&self) -> f64 {
        self.estimated_daily * INCOME_DAYS_PER_WEEK
    }

    pub fn estimated_monthly(&self) -> f64 {
        self.estimated_daily * INCOME_DAYS_PER_MONTH
    }
}

/// Average income per income day
///
/// Non-positive observations are skipped for both the total and the day count.
pub fn estimate_daily_income(observations: &[IncomeObservation]) -> Result<IncomeEstimate> {
    let mut total_income = 0.0;
    let mut income_days: BTreeSet<NaiveDate> = BTreeSet::new();

    for obs in observations {
        if obs.amount > 0.0 {
            total_income += obs.amount;
            income_days.insert(obs.date);
        }
    }

    if income_days.is_empty() {
        return Err(Error::NoIncomeData);
    }

    let days = income_days.len();
    let estimated_daily = total_income / days as f64;
    debug!(
        total_income,
        income_days = days,
        estimated_daily,
        "Estimated daily income"
    );

    Ok(IncomeEstimate {
        total_income,
        income_days: days,
        estimated_daily,
    })
}

impl IncomeProfile {
    /// Profile carrying a known daily rate and its derived weekly/monthly rates
    pub fn from_daily(estimated_daily: f64) -> Self {
        Self {
            estimated_daily: Some(estimated_daily),
            estimated_weekly: Some(estimated_daily * INCOME_DAYS_PER_WEEK),
            estimated_monthly: Some(estimated_daily * INCOME_DAYS_PER_MONTH),
        }
    }

    /// Re-estimate from a fresh set of observations
    ///
    /// On error the profile is left untouched.
    pub fn update_from_observations(
        &mut self,
        observations: &[IncomeObservation],
    ) -> Result<IncomeEstimate> {
        let estimate = estimate_daily_income(observations)?;
        *self = Self::from_daily(estimate.estimated_daily);
        Ok(estimate)
    }

    pub fn has_income_data(&self) -> bool {
        self.estimated_daily.is_some()
    }

    /// Read a profile saved with `save`
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let profile = serde_json::from_str(&content)?;
        debug!("Loaded income profile from {}", path.display());
        Ok(profile)
    }

    /// Write the profile as JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!("Saved income profile to {}", path.display());
        Ok(())
    }
}

/// Parse an income statement and estimate from it in one step
pub fn estimate_from_csv<R: Read>(reader: R) -> Result<(IncomeProfile, IncomeEstimate)> {
    let observations = parse_income_csv(reader)?;
    let mut profile = IncomeProfile::default();
    let estimate = profile.update_from_observations(&observations)?;
    info!(
        rows = observations.len(),
        income_days = estimate.income_days,
        estimated_daily = estimate.estimated_daily,
        "Income statement processed"
    );
    Ok((profile, estimate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, d).unwrap()
    }

    #[test]
    fn test_same_day_amounts_share_one_income_day() {
        let obs = vec![
            IncomeObservation::new(day(1), 100.0),
            IncomeObservation::new(day(1), 50.0),
            IncomeObservation::new(day(2), 200.0),
        ];

        let estimate = estimate_daily_income(&obs).unwrap();
        assert_eq!(estimate.income_days, 2);
        assert_eq!(estimate.total_income, 350.0);
        assert_eq!(estimate.estimated_daily, 175.0);
    }

    #[test]
    fn test_non_positive_amounts_ignored() {
        let obs = vec![
            IncomeObservation::new(day(1), 300.0),
            IncomeObservation::new(day(2), 0.0),
            IncomeObservation::new(day(3), -80.0),
        ];

        let estimate = estimate_daily_income(&obs).unwrap();
        assert_eq!(estimate.income_days, 1);
        assert_eq!(estimate.estimated_daily, 300.0);
    }

    #[test]
    fn test_no_positive_income_is_error() {
        let obs = vec![
            IncomeObservation::new(day(1), 0.0),
            IncomeObservation::new(day(2), -10.0),
        ];
        assert!(matches!(
            estimate_daily_income(&obs),
            Err(Error::NoIncomeData)
        ));
        assert!(matches!(estimate_daily_income(&[]), Err(Error::NoIncomeData)));
    }

    #[test]
    fn test_order_independent() {
        let mut obs = vec![
            IncomeObservation::new(day(3), 400.0),
            IncomeObservation::new(day(1), 100.0),
            IncomeObservation::new(day(3), 200.0),
        ];
        let forward = estimate_daily_income(&obs).unwrap();
        obs.reverse();
        let backward = estimate_daily_income(&obs).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_profile_derives_week_and_month() {
        let profile = IncomeProfile::from_daily(1000.0);
        assert_eq!(profile.estimated_daily, Some(1000.0));
        assert_eq!(profile.estimated_weekly, Some(6000.0));
        assert_eq!(profile.estimated_monthly, Some(30000.0));
    }

    #[test]
    fn test_failed_update_keeps_profile() {
        let mut profile = IncomeProfile::from_daily(500.0);
        let result = profile.update_from_observations(&[IncomeObservation::new(day(1), -5.0)]);
        assert!(result.is_err());
        assert_eq!(profile.estimated_daily, Some(500.0));
    }

    #[test]
    fn test_estimate_from_csv() {
        let csv = "Txn Date,Description,Debit,Credit\n\
                   01-11-2024,Zomato payout,,1200\n\
                   01-11-2024,Tip,,300\n\
                   2024-11-03,UPI rent,5000,\n\
                   04-Nov-2024,Zomato payout,,900\n";

        let (profile, estimate) = estimate_from_csv(csv.as_bytes()).unwrap();
        assert_eq!(estimate.income_days, 2);
        assert_eq!(profile.estimated_daily, Some(1200.0));
        assert_eq!(profile.estimated_weekly, Some(7200.0));
        assert_eq!(profile.estimated_monthly, Some(36000.0));
    }

    #[test]
    fn test_estimate_from_csv_malformed_row() {
        let csv = "Txn Date,Credit\n01-11-2024,100\nyesterday,200\n";
        match estimate_from_csv(csv.as_bytes()) {
            Err(Error::MalformedRecord { row, field, value }) => {
                assert_eq!(row, 2);
                assert_eq!(field, "date");
                assert_eq!(value, "yesterday");
            }
            other => panic!("expected malformed record, got {:?}", other),
        }
    }

    #[test]
    fn test_profile_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("profile.json");

        IncomeProfile::from_daily(175.0).save(&path).unwrap();
        let loaded = IncomeProfile::load(&path).unwrap();
        assert_eq!(loaded.estimated_daily, Some(175.0));
        assert_eq!(loaded.estimated_monthly, Some(5250.0));

        fs::write(&path, "{}").unwrap();
        assert!(!IncomeProfile::load(&path).unwrap().has_income_data());
    }
}
