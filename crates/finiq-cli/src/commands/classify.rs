//! Bucket classification commands

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use finiq_core::import::parse_expense_csv;
use finiq_core::{ExpenseRecord, NewExpense};
use serde::Serialize;

use super::{money, AppContext};

#[derive(Serialize)]
struct ClassifyOutput<'a> {
    category: &'a str,
    description: &'a str,
    bucket: &'static str,
    source: &'static str,
}

/// Classify a single category
pub async fn cmd_classify(
    ctx: &AppContext,
    category: &str,
    description: &str,
    no_ai: bool,
) -> Result<()> {
    let classifier = ctx.classifier(no_ai);
    let assignment = classifier.classify(category, description).await;

    if ctx.json {
        return ctx.print_json(&ClassifyOutput {
            category,
            description,
            bucket: assignment.bucket.as_str(),
            source: assignment.source.as_str(),
        });
    }

    println!(
        "\"{}\" → {} ({})",
        category,
        assignment.bucket,
        assignment.source.as_str()
    );
    Ok(())
}

/// Record a bill paid now, tagged with its bucket
pub async fn cmd_record_bill(
    ctx: &AppContext,
    category: &str,
    description: &str,
    amount: f64,
    no_ai: bool,
) -> Result<ExpenseRecord> {
    if !amount.is_finite() || amount == 0.0 {
        anyhow::bail!("Bill amount must be a non-zero number, got {}", amount);
    }

    let description = if description.is_empty() {
        category
    } else {
        description
    };
    let expense = NewExpense::from_bill(
        chrono::Local::now().naive_local(),
        amount,
        description,
        Some(category.to_string()),
    );
    let record = ctx.classifier(no_ai).record_expense(expense).await;

    if ctx.json {
        ctx.print_json(&record)?;
    } else {
        println!(
            "{}  {}  \"{}\" → {}",
            record.date.format("%Y-%m-%d %H:%M"),
            money(record.amount),
            record.description,
            record.bucket.map(|b| b.as_str()).unwrap_or("-"),
        );
    }
    Ok(record)
}

/// Classify every row of an expense CSV
pub async fn cmd_classify_file(ctx: &AppContext, file: &Path, no_ai: bool) -> Result<()> {
    let reader =
        File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
    let expenses = parse_expense_csv(reader)?;

    let classifier = ctx.classifier(no_ai);
    if !classifier.has_ai() && !ctx.json {
        println!("ℹ️  AI backend not in use, unknown categories go to 'other'");
    }
    let records = classifier.classify_records(expenses).await;

    if ctx.json {
        return ctx.print_json(&records);
    }

    println!();
    println!(
        "{:<20} {:>12}  {:<28} {:<16} {}",
        "DATE", "AMOUNT", "DESCRIPTION", "CATEGORY", "BUCKET"
    );
    println!("{}", "-".repeat(90));

    for record in &records {
        println!(
            "{:<20} {:>12}  {:<28} {:<16} {}",
            record.date.format("%Y-%m-%d %H:%M"),
            money(record.amount),
            super::truncate(&record.description, 28),
            record.category.as_deref().unwrap_or("-"),
            record.bucket.map(|b| b.as_str()).unwrap_or("-"),
        );
    }

    println!();
    println!("Classified {} expenses", records.len());
    Ok(())
}
