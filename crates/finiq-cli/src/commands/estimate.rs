//! Income estimation command

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use finiq_core::income::estimate_from_csv;
use serde::Serialize;

use super::{money, AppContext};

#[derive(Serialize)]
struct EstimateOutput {
    total_income: f64,
    income_days: usize,
    estimated_daily: f64,
    estimated_weekly: f64,
    estimated_monthly: f64,
    saved_to: Option<String>,
}

/// Estimate daily income from a statement, optionally saving the profile
pub fn cmd_estimate(ctx: &AppContext, file: &Path, save: bool) -> Result<()> {
    let reader =
        File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
    let (profile, estimate) = estimate_from_csv(reader)?;

    let saved_to = if save {
        let path = ctx
            .profile_path
            .as_deref()
            .context("No data directory for the profile; pass --profile")?;
        profile.save(path)?;
        Some(path.display().to_string())
    } else {
        None
    };

    if ctx.json {
        return ctx.print_json(&EstimateOutput {
            total_income: estimate.total_income,
            income_days: estimate.income_days,
            estimated_daily: estimate.estimated_daily,
            estimated_weekly: estimate.estimated_weekly(),
            estimated_monthly: estimate.estimated_monthly(),
            saved_to,
        });
    }

    println!();
    println!("💰 Income estimate from {}", file.display());
    println!("   ─────────────────────────────────────────");
    println!("   Income days:  {}", estimate.income_days);
    println!("   Total income: {}", money(estimate.total_income));
    println!();
    println!("   Daily:   {}", money(estimate.estimated_daily));
    println!("   Weekly:  {}", money(estimate.estimated_weekly()));
    println!("   Monthly: {}", money(estimate.estimated_monthly()));
    println!();

    match saved_to {
        Some(path) => println!("✅ Profile saved to {}", path),
        None => println!("💡 Add --save to keep this as your income profile"),
    }

    Ok(())
}
