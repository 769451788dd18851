//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `advisor` - Dashboard, insights, recommendations, analysis, chat, report
//! - `budgets` - Budget commands (list, set, delete)
//! - `categories` - Category commands (list, add, delete)
//! - `core` - Init and shared utilities (open_db, open_advisor)
//! - `data` - Full backup export/import, transaction CSV/JSON files
//! - `serve` - Web server command
//! - `transactions` - Transaction commands (list, add, delete)

pub mod advisor;
pub mod budgets;
pub mod categories;
pub mod core;
pub mod data;
pub mod serve;
pub mod transactions;

// Re-export command functions for main.rs
pub use advisor::*;
pub use budgets::*;
pub use categories::*;
pub use core::*;
pub use data::*;
pub use serve::*;
pub use transactions::*;

use chrono::NaiveDate;
use finsight_core::Insight;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Today's date in local time
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn print_insights(insights: &[Insight]) {
    for insight in insights {
        println!("   {} {}", insight.severity.icon(), insight.title);
        println!("      {}", insight.description);
        for metric in &insight.metrics {
            println!("      • {}: {}", metric.label, metric.value);
        }
    }
}
