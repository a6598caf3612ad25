//! Shared command state and helpers
//!
//! This module contains:
//! - `AppContext` - settings, profile location and output mode for a run
//! - `parse_day` - `--date` handling
//! - `hint_for` - guidance printed for user-correctable errors

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use finiq_core::ai::AIClient;
use finiq_core::classify::BucketClassifier;
use finiq_core::config::{default_profile_path, Settings};
use finiq_core::daily::today_local;
use finiq_core::{Error, IncomeProfile};
use serde::Serialize;
use tracing::debug;

pub struct AppContext {
    pub settings: Settings,
    pub profile_path: Option<PathBuf>,
    pub json: bool,
}

impl AppContext {
    pub fn new(config: Option<&Path>, profile: Option<PathBuf>, json: bool) -> Result<Self> {
        let settings = Settings::load(config).context("Failed to load settings")?;
        Ok(Self {
            settings,
            profile_path: profile.or_else(default_profile_path),
            json,
        })
    }

    /// Context with explicit settings, for tests
    #[cfg(test)]
    pub fn with_settings(settings: Settings, profile_path: PathBuf, json: bool) -> Self {
        Self {
            settings,
            profile_path: Some(profile_path),
            json,
        }
    }

    /// Income profile to work with: `--daily` wins, then the saved profile
    ///
    /// A missing profile file is not an error; it just means no income data yet.
    pub fn income_profile(&self, daily: Option<f64>) -> Result<IncomeProfile> {
        if let Some(daily) = daily {
            return Ok(IncomeProfile::from_daily(daily));
        }

        match &self.profile_path {
            Some(path) if path.exists() => IncomeProfile::load(path)
                .with_context(|| format!("Failed to read profile {}", path.display())),
            _ => {
                debug!("No saved income profile");
                Ok(IncomeProfile::default())
            }
        }
    }

    /// AI backend from the environment, unless disabled
    pub fn ai_client(&self, no_ai: bool) -> Option<AIClient> {
        if no_ai || !self.settings.classifier.use_ai {
            return None;
        }
        AIClient::from_env()
    }

    pub fn classifier(&self, no_ai: bool) -> BucketClassifier {
        BucketClassifier::new(self.ai_client(no_ai)).with_timeout(self.settings.classifier.timeout)
    }

    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// `--date` as a calendar day, defaulting to today
pub fn parse_day(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .context("Invalid --date format (use YYYY-MM-DD)"),
        None => Ok(today_local()),
    }
}

/// What the user can do about a user-correctable error
pub fn hint_for(err: &Error) -> Option<&'static str> {
    match err {
        Error::MissingIncome => {
            Some("Run `finiq estimate --file statement.csv --save` or pass --daily.")
        }
        Error::NoIncomeData => Some("The statement has no credits; check the Credit column."),
        Error::MalformedRecord { .. } => Some("Fix the row in the CSV and try again."),
        Error::InvalidPolicy(_) => {
            Some("Adjust [policy] in finiq.toml so the percentages add up to 1.0.")
        }
        _ => None,
    }
}

/// Currency amount for text output
pub fn money(amount: f64) -> String {
    format!("₹{:.2}", amount)
}

pub fn optional_money(amount: Option<f64>) -> String {
    amount.map(money).unwrap_or_else(|| "-".to_string())
}
