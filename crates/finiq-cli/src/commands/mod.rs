//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `ai` - AI backend test
//! - `budget` - Bucket limits for a profile
//! - `classify` - Bucket classification for a category or expense file
//! - `config` - Effective settings and policy check
//! - `core` - Shared state (`AppContext`) and helpers
//! - `estimate` - Income estimation from a statement
//! - `insights` - Daily insight and coaching messages
//! - `prompts` - Prompt library management commands

pub mod ai;
pub mod budget;
pub mod classify;
pub mod config;
pub mod core;
pub mod estimate;
pub mod insights;
pub mod prompts;

// Re-export command functions for main.rs
pub use ai::*;
pub use budget::*;
pub use classify::*;
pub use config::*;
pub use self::core::*;
pub use estimate::*;
pub use insights::*;
pub use prompts::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
