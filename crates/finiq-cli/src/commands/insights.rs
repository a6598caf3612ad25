//! Daily insight command

use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use finiq_core::coach::build_daily_report;
use finiq_core::daily::{day_bounds, evaluate_daily_insight, spent_on};
use finiq_core::import::parse_expense_csv;
use finiq_core::{Bucket, DailyReport, InsightStatus, Language};
use tracing::info;

use super::{money, optional_money, AppContext};

pub struct InsightOptions {
    pub expenses: Option<PathBuf>,
    pub spent: Option<f64>,
    pub date: NaiveDate,
    pub daily: Option<f64>,
    pub user_id: i64,
    pub name: Option<String>,
    pub language: Option<Language>,
    pub no_ai: bool,
}

/// Report plus the day's spend per bucket (empty without an expense file)
pub async fn daily_report(
    ctx: &AppContext,
    options: &InsightOptions,
) -> Result<(DailyReport, BTreeMap<&'static str, f64>)> {
    let profile = ctx.income_profile(options.daily)?;

    let mut by_bucket = BTreeMap::new();
    let spent_today = match (&options.expenses, options.spent) {
        (Some(path), _) => {
            let reader = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let expenses = parse_expense_csv(reader)?;
            let records = ctx
                .classifier(options.no_ai)
                .classify_records(expenses)
                .await;

            let (start, end) = day_bounds(options.date);
            for record in records
                .iter()
                .filter(|r| r.is_expense() && r.date >= start && r.date <= end)
            {
                let bucket = record.bucket.unwrap_or(Bucket::Other);
                *by_bucket.entry(bucket.as_str()).or_insert(0.0) += record.amount.abs();
            }

            spent_on(&records, options.date)
        }
        (None, Some(spent)) => spent,
        (None, None) => 0.0,
    };

    let insight = evaluate_daily_insight(options.user_id, options.date, &profile, spent_today);
    info!(status = %insight.status, spent_today, "Daily insight evaluated");

    let ai = ctx.ai_client(options.no_ai);
    let name = options
        .name
        .clone()
        .unwrap_or_else(|| ctx.settings.coaching.name.clone());
    let language = options.language.unwrap_or(ctx.settings.coaching.language);

    let report = build_daily_report(ai.as_ref(), insight, &name, language).await;
    Ok((report, by_bucket))
}

pub async fn cmd_insights(ctx: &AppContext, options: InsightOptions) -> Result<()> {
    let (report, by_bucket) = daily_report(ctx, &options).await?;

    if ctx.json {
        return ctx.print_json(&report);
    }

    let insight = &report.insight;
    let status = match insight.status {
        InsightStatus::WithinLimit => "✅ Within limit",
        InsightStatus::OverLimit => "⚠️  Over limit",
        InsightStatus::NoIncomeData => "❓ No income data",
    };

    println!();
    println!("📅 {} (user {})", insight.date, insight.user_id);
    println!("   ─────────────────────────────────────────");
    println!("   Status:            {}", status);
    println!("   Spent today:       {}", money(insight.spent_today));
    println!("   Safe daily spend:  {}", optional_money(insight.safe_daily_spend));
    println!("   Remaining today:   {}", money(insight.remaining_today));
    println!(
        "   Daily savings:     {}",
        optional_money(insight.recommended_daily_savings)
    );
    println!("   Safe weekly:       {}", optional_money(insight.weekly_safe_spend));
    println!("   Safe monthly:      {}", optional_money(insight.monthly_safe_spend));

    if !by_bucket.is_empty() {
        println!();
        println!("   Today by bucket:");
        for (bucket, amount) in &by_bucket {
            println!("     {:<12} {}", bucket, money(*amount));
        }
    }

    let message = &report.message;
    println!();
    if message.daily_message.is_empty() {
        println!("💬 No coaching messages (AI backend not configured or unavailable)");
    } else {
        println!("💬 Today:      {}", message.daily_message);
        if !message.weekly_message.is_empty() {
            println!("   This week:  {}", message.weekly_message);
        }
        if !message.monthly_message.is_empty() {
            println!("   This month: {}", message.monthly_message);
        }
    }
    println!();

    Ok(())
}
