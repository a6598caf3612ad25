//! Budget allocation: daily income rate + policy → per-period bucket limits
//!
//! The order of operations below is fixed. Daily and weekly bucket limits are
//! derived from the monthly figure rather than from the daily rate, and the
//! spend limits use their own constants, so results match previously issued
//! budgets to the last bit.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{AllocationPolicy, BudgetSummary, IncomeProfile, PolicyValidation};

pub const DAYS_PER_MONTH: f64 = 30.0;
/// Week length for income and bucket limits
pub const BUCKET_DAYS_PER_WEEK: f64 = 6.0;
/// Week length for the overall weekly spend limit
pub const SPEND_LIMIT_DAYS_PER_WEEK: f64 = 7.0;

/// Fixed shares behind the overall spend limit (essentials + fun)
const SPEND_ESSENTIALS_SHARE: f64 = 0.50;
const SPEND_FUN_SHARE: f64 = 0.10;

const POLICY_SUM_TOLERANCE: f64 = 1e-9;

/// Check a policy against the configured validation strategy
///
/// Never rewrites the percentages; a policy is either accepted as-is or rejected.
pub fn validate_policy(policy: &AllocationPolicy, strategy: PolicyValidation) -> Result<()> {
    let pcts = [
        ("essentials_pct", policy.essentials_pct),
        ("bills_pct", policy.bills_pct),
        ("savings_pct", policy.savings_pct),
        ("fun_pct", policy.fun_pct),
    ];

    let mut problems = Vec::new();
    for (name, value) in pcts {
        if !value.is_finite() || value < 0.0 {
            problems.push(format!("{} must be a non-negative fraction, got {}", name, value));
        }
    }
    let total = policy.total();
    if (total - 1.0).abs() > POLICY_SUM_TOLERANCE {
        problems.push(format!("percentages sum to {:.4}, expected 1.0", total));
    }

    if problems.is_empty() {
        return Ok(());
    }

    match strategy {
        PolicyValidation::Permissive => Ok(()),
        PolicyValidation::Warn => {
            for problem in &problems {
                warn!("Allocation policy: {}", problem);
            }
            Ok(())
        }
        PolicyValidation::Strict => Err(Error::InvalidPolicy(problems.join("; "))),
    }
}

/// Expand a daily income rate into daily/weekly/monthly limits
pub fn compute_budget_summary(
    estimated_daily: Option<f64>,
    policy: &AllocationPolicy,
) -> Result<BudgetSummary> {
    let est_daily = match estimated_daily {
        Some(d) if d.is_finite() && d > 0.0 => d,
        _ => return Err(Error::MissingIncome),
    };

    let est_monthly = est_daily * DAYS_PER_MONTH;
    let est_weekly = est_daily * BUCKET_DAYS_PER_WEEK;

    let monthly_ess = est_monthly * policy.essentials_pct;
    let monthly_bills = est_monthly * policy.bills_pct;
    let monthly_savings = est_monthly * policy.savings_pct;
    let monthly_fun = est_monthly * policy.fun_pct;

    let daily_spend_limit =
        (est_monthly * SPEND_ESSENTIALS_SHARE + est_monthly * SPEND_FUN_SHARE) / DAYS_PER_MONTH;

    let summary = BudgetSummary {
        estimated_daily_income: est_daily,
        estimated_weekly_income: est_weekly,
        estimated_monthly_income: est_monthly,

        daily_essentials_limit: monthly_ess / DAYS_PER_MONTH,
        daily_bills_limit: monthly_bills / DAYS_PER_MONTH,
        daily_savings_target: monthly_savings / DAYS_PER_MONTH,
        daily_fun_limit: monthly_fun / DAYS_PER_MONTH,
        daily_spend_limit,

        weekly_essentials_limit: monthly_ess / BUCKET_DAYS_PER_WEEK,
        weekly_bills_limit: monthly_bills / BUCKET_DAYS_PER_WEEK,
        weekly_savings_target: monthly_savings / BUCKET_DAYS_PER_WEEK,
        weekly_fun_limit: monthly_fun / BUCKET_DAYS_PER_WEEK,
        weekly_spend_limit: daily_spend_limit * SPEND_LIMIT_DAYS_PER_WEEK,

        monthly_essentials_limit: monthly_ess,
        monthly_bills_limit: monthly_bills,
        monthly_savings_target: monthly_savings,
        monthly_fun_limit: monthly_fun,
        monthly_spend_limit: daily_spend_limit * DAYS_PER_MONTH,
    };

    debug!(
        est_daily,
        daily_spend_limit = summary.daily_spend_limit,
        "Computed budget summary"
    );
    Ok(summary)
}

/// Budget for a stored profile, validating the policy first
pub fn budget_for_profile(
    profile: &IncomeProfile,
    policy: &AllocationPolicy,
    strategy: PolicyValidation,
) -> Result<BudgetSummary> {
    validate_policy(policy, strategy)?;
    compute_budget_summary(profile.estimated_daily, policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_default_policy_limits() {
        let s = compute_budget_summary(Some(1000.0), &AllocationPolicy::default()).unwrap();

        assert_eq!(s.estimated_monthly_income, 30000.0);
        assert_eq!(s.estimated_weekly_income, 6000.0);

        assert!(close(s.monthly_essentials_limit, 15000.0));
        assert!(close(s.monthly_bills_limit, 6000.0));
        assert!(close(s.monthly_savings_target, 6000.0));
        assert!(close(s.monthly_fun_limit, 3000.0));

        assert!(close(s.daily_essentials_limit, 500.0));
        assert!(close(s.daily_fun_limit, 100.0));

        // Weekly bucket limits divide the monthly figure by six
        assert!(close(s.weekly_essentials_limit, 2500.0));
        assert!(close(s.weekly_bills_limit, 1000.0));
    }

    #[test]
    fn test_bucket_formulas_for_custom_policy() {
        let policy = AllocationPolicy {
            essentials_pct: 0.40,
            bills_pct: 0.25,
            savings_pct: 0.25,
            fun_pct: 0.10,
        };
        for d in [1.0, 175.0, 833.33, 12345.6] {
            let s = compute_budget_summary(Some(d), &policy).unwrap();
            assert_eq!(s.daily_essentials_limit, (d * 30.0 * 0.40) / 30.0);
            assert_eq!(s.daily_bills_limit, (d * 30.0 * 0.25) / 30.0);
            assert_eq!(s.weekly_savings_target, (d * 30.0 * 0.25) / 6.0);
            assert_eq!(s.weekly_fun_limit, (d * 30.0 * 0.10) / 6.0);
            assert_eq!(s.monthly_fun_limit, d * 30.0 * 0.10);
        }
    }

    #[test]
    fn test_spend_limit_ignores_policy() {
        let skewed = AllocationPolicy {
            essentials_pct: 0.90,
            bills_pct: 0.0,
            savings_pct: 0.0,
            fun_pct: 0.10,
        };
        let a = compute_budget_summary(Some(1000.0), &skewed).unwrap();
        let b = compute_budget_summary(Some(1000.0), &AllocationPolicy::default()).unwrap();

        assert_eq!(a.daily_spend_limit, b.daily_spend_limit);
        assert!(close(a.daily_spend_limit, 600.0));
        assert_eq!(a.monthly_spend_limit, a.daily_spend_limit * 30.0);
        assert_eq!(a.weekly_spend_limit, a.daily_spend_limit * 7.0);
    }

    #[test]
    fn test_missing_income() {
        let policy = AllocationPolicy::default();
        assert!(matches!(
            compute_budget_summary(None, &policy),
            Err(Error::MissingIncome)
        ));
        assert!(matches!(
            compute_budget_summary(Some(0.0), &policy),
            Err(Error::MissingIncome)
        ));
        assert!(matches!(
            compute_budget_summary(Some(-5.0), &policy),
            Err(Error::MissingIncome)
        ));
    }

    #[test]
    fn test_idempotent() {
        let policy = AllocationPolicy::default();
        let first = compute_budget_summary(Some(777.77), &policy).unwrap();
        let second = compute_budget_summary(Some(777.77), &policy).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_policy_validation_strategies() {
        let over = AllocationPolicy {
            essentials_pct: 0.6,
            ..Default::default()
        };

        assert!(validate_policy(&over, PolicyValidation::Permissive).is_ok());
        assert!(validate_policy(&over, PolicyValidation::Warn).is_ok());
        assert!(matches!(
            validate_policy(&over, PolicyValidation::Strict),
            Err(Error::InvalidPolicy(_))
        ));
        assert!(validate_policy(&AllocationPolicy::default(), PolicyValidation::Strict).is_ok());
    }

    #[test]
    fn test_negative_pct_rejected_when_strict() {
        let policy = AllocationPolicy {
            essentials_pct: 0.7,
            fun_pct: -0.1,
            ..Default::default()
        };
        let err = validate_policy(&policy, PolicyValidation::Strict).unwrap_err();
        assert!(err.to_string().contains("fun_pct"));
    }

    #[test]
    fn test_budget_for_profile() {
        let profile = IncomeProfile::from_daily(500.0);
        let summary = budget_for_profile(
            &profile,
            &AllocationPolicy::default(),
            PolicyValidation::Strict,
        )
        .unwrap();
        assert_eq!(summary.estimated_daily_income, 500.0);

        let empty = IncomeProfile::default();
        assert!(matches!(
            budget_for_profile(&empty, &AllocationPolicy::default(), PolicyValidation::Warn),
            Err(Error::MissingIncome)
        ));
    }
}
