//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Finiq - Budgeting for irregular gig income
#[derive(Parser)]
#[command(name = "finiq")]
#[command(about = "Turn irregular gig income into daily, weekly and monthly limits", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Settings file (defaults to the user override, then built-in settings)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Saved income profile (JSON)
    ///
    /// Defaults to profile.json in the finiq data directory.
    #[arg(long, global = true)]
    pub profile: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Estimate daily income from a bank statement CSV
    Estimate {
        /// Statement CSV (needs 'Txn Date' and 'Credit' columns)
        #[arg(short, long)]
        file: PathBuf,

        /// Save the estimate as the income profile
        #[arg(long)]
        save: bool,
    },

    /// Show bucket limits for the saved profile
    Budget {
        /// Use this daily income instead of the saved profile
        #[arg(long)]
        daily: Option<f64>,
    },

    /// Evaluate a day's spending and generate coaching messages
    Insights {
        /// Expense CSV (date,amount,description,category)
        #[arg(short, long)]
        expenses: Option<PathBuf>,

        /// Amount spent, instead of reading an expense file
        #[arg(long, conflicts_with = "expenses")]
        spent: Option<f64>,

        /// Day to evaluate, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,

        /// Use this daily income instead of the saved profile
        #[arg(long)]
        daily: Option<f64>,

        /// User id to report
        #[arg(long, default_value = "1")]
        user_id: i64,

        /// Name the coach uses (overrides settings)
        #[arg(long)]
        name: Option<String>,

        /// Message language: en, hi, hinglish (overrides settings)
        #[arg(long)]
        language: Option<String>,

        /// Skip AI calls (no coaching messages, table-only buckets)
        #[arg(long)]
        no_ai: bool,
    },

    /// Assign spending buckets to a category or an expense file
    Classify {
        /// Category to classify
        #[arg(required_unless_present = "file")]
        category: Option<String>,

        /// Free-text description passed along with the category
        #[arg(short, long, default_value = "")]
        description: String,

        /// Expense CSV to classify instead of a single category
        #[arg(short, long, conflicts_with = "category")]
        file: Option<PathBuf>,

        /// Record a bill of this amount now and show the tagged expense
        #[arg(short, long, conflicts_with = "file")]
        amount: Option<f64>,

        /// Only use the built-in category table
        #[arg(long)]
        no_ai: bool,
    },

    /// AI backend utilities
    Ai {
        #[command(subcommand)]
        action: AiAction,
    },

    /// Manage AI prompts (list, show, customize)
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },

    /// Show effective settings and check the allocation policy
    Config,
}

#[derive(Subcommand)]
pub enum AiAction {
    /// Test the configured backend and run sample requests
    Test {
        /// Classify this category instead of the built-in samples
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all available prompts and their override status
    List,

    /// Show the content of a specific prompt
    Show {
        /// Prompt ID (classify_bucket, coaching_messages)
        prompt_id: String,
    },

    /// Show the path where prompt overrides should be placed
    Path,
}
