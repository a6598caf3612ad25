//! Finiq CLI - Budgeting for irregular gig income
//!
//! Usage:
//!   finiq estimate --file statement.csv --save   Estimate daily income
//!   finiq budget                                 Bucket limits from the profile
//!   finiq insights --expenses spends.csv         Today's status and coaching
//!   finiq classify food_delivery                 Bucket for a category
//!   finiq classify utilities --amount 850        Record a paid bill

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let result = run(cli).await;

    // Bad input gets a one-line hint instead of an error chain
    if let Err(e) = &result {
        if let Some(err) = e.downcast_ref::<finiq_core::Error>() {
            if err.is_user_correctable() {
                eprintln!("❌ {}", err);
                if let Some(hint) = commands::hint_for(err) {
                    eprintln!("   {}", hint);
                }
                std::process::exit(2);
            }
        }
    }

    result
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = commands::AppContext::new(cli.config.as_deref(), cli.profile.clone(), cli.json)?;

    match cli.command {
        Commands::Estimate { file, save } => commands::cmd_estimate(&ctx, &file, save),
        Commands::Budget { daily } => commands::cmd_budget(&ctx, daily),
        Commands::Insights {
            expenses,
            spent,
            date,
            daily,
            user_id,
            name,
            language,
            no_ai,
        } => {
            let options = commands::InsightOptions {
                expenses,
                spent,
                date: commands::parse_day(date.as_deref())?,
                daily,
                user_id,
                name,
                language: language
                    .as_deref()
                    .map(str::parse::<finiq_core::Language>)
                    .transpose()
                    .map_err(|e: String| anyhow::anyhow!(e))?,
                no_ai,
            };
            commands::cmd_insights(&ctx, options).await
        }
        Commands::Classify {
            category,
            description,
            file,
            amount,
            no_ai,
        } => match (file, category, amount) {
            (Some(file), _, _) => commands::cmd_classify_file(&ctx, &file, no_ai).await,
            (None, Some(category), Some(amount)) => {
                commands::cmd_record_bill(&ctx, &category, &description, amount, no_ai)
                    .await
                    .map(|_| ())
            }
            (None, Some(category), None) => {
                commands::cmd_classify(&ctx, &category, &description, no_ai).await
            }
            (None, None, _) => anyhow::bail!("Give a category or --file"),
        },
        Commands::Ai { action } => match action {
            AiAction::Test { category } => commands::cmd_ai_test(&ctx, category.as_deref()).await,
        },
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(),
            Some(PromptsAction::Show { prompt_id }) => commands::cmd_prompts_show(&prompt_id),
            Some(PromptsAction::Path) => commands::cmd_prompts_path(),
        },
        Commands::Config => commands::cmd_config(&ctx),
    }
}
