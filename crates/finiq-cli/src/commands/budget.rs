//! Budget command

use anyhow::Result;
use finiq_core::budget::budget_for_profile;

use super::{money, AppContext};

/// Print bucket limits for the profile (or `--daily`)
pub fn cmd_budget(ctx: &AppContext, daily: Option<f64>) -> Result<()> {
    let profile = ctx.income_profile(daily)?;
    let summary = budget_for_profile(
        &profile,
        &ctx.settings.policy,
        ctx.settings.validation,
    )?;

    if ctx.json {
        return ctx.print_json(&summary);
    }

    println!();
    println!("📒 Budget");
    println!("   ───────────────────────────────────────────────────────────");
    println!(
        "   {:<12} {:>14} {:>14} {:>14}",
        "", "DAILY", "WEEKLY", "MONTHLY"
    );

    let rows = [
        (
            "Income",
            summary.estimated_daily_income,
            summary.estimated_weekly_income,
            summary.estimated_monthly_income,
        ),
        (
            "Essentials",
            summary.daily_essentials_limit,
            summary.weekly_essentials_limit,
            summary.monthly_essentials_limit,
        ),
        (
            "Bills",
            summary.daily_bills_limit,
            summary.weekly_bills_limit,
            summary.monthly_bills_limit,
        ),
        (
            "Savings",
            summary.daily_savings_target,
            summary.weekly_savings_target,
            summary.monthly_savings_target,
        ),
        (
            "Fun",
            summary.daily_fun_limit,
            summary.weekly_fun_limit,
            summary.monthly_fun_limit,
        ),
        (
            "Spend limit",
            summary.daily_spend_limit,
            summary.weekly_spend_limit,
            summary.monthly_spend_limit,
        ),
    ];

    for (label, d, w, m) in rows {
        println!(
            "   {:<12} {:>14} {:>14} {:>14}",
            label,
            money(d),
            money(w),
            money(m)
        );
    }
    println!();

    Ok(())
}
