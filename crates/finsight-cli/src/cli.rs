//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Finsight - Understand where your money goes
#[derive(Parser)]
#[command(name = "finsight")]
#[command(about = "Personal finance tracker with a rule-based and LLM-backed advisor", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "finsight.db", global = true)]
    pub db: PathBuf,

    /// User whose ledger to act on
    #[arg(short, long, default_value = "local", global = true)]
    pub user: String,

    /// Advisor config file (TOML); falls back to the data-dir override, then built-in defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and show the effective configuration
    Init,

    /// Show this month's totals, budgets and insights
    Dashboard,

    /// Run the advisor insight battery for this month
    Insights,

    /// Show personalized recommendations for this month
    Recommendations,

    /// Run one analysis view
    Analysis {
        /// Analysis type: spending, income, budget, trends
        kind: String,
    },

    /// Spending by category for a period
    Breakdown {
        /// Period: today, week, month, quarter, year
        #[arg(short, long, default_value = "month")]
        period: String,
    },

    /// Show the raw financial context snapshot
    Context {
        /// Period: today, week, month, quarter, year
        #[arg(short, long)]
        period: Option<String>,

        /// Custom window start (YYYY-MM-DD, requires --to)
        #[arg(long)]
        from: Option<String>,

        /// Custom window end (YYYY-MM-DD, requires --from)
        #[arg(long)]
        to: Option<String>,
    },

    /// Compare recent months of income and spending
    Trend {
        /// Months to look back
        #[arg(short, long, default_value = "6")]
        months: u32,
    },

    /// Ask the advisor a question
    Chat {
        /// Your question
        message: String,
    },

    /// Show or manage chat history
    History {
        /// Delete the history instead of showing it
        #[arg(long)]
        clear: bool,

        /// Write the history to a JSON file
        #[arg(long, conflicts_with = "clear")]
        export: Option<PathBuf>,
    },

    /// Generate a JSON financial report
    Report {
        /// Output file (defaults to financial-report-<date>.json)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Manage transactions
    Transactions {
        #[command(subcommand)]
        action: Option<TransactionsAction>,
    },

    /// Manage budgets
    Budgets {
        #[command(subcommand)]
        action: Option<BudgetsAction>,
    },

    /// Manage categories
    Categories {
        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// Export every stored record to a JSON backup
    Export {
        /// Output file
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Replace stored data with a JSON backup
    Import {
        /// Backup file produced by `finsight export`
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Export your transactions to CSV
    ExportTransactions {
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Append transactions from a JSON or CSV file
    ImportTransactions {
        /// `.json` ({"transactions": [...]}) or `.csv` (Date,Type,Amount,Category,Description)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Allowed CORS origins (comma-separated)
        #[arg(long, value_delimiter = ',')]
        allowed_origins: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum TransactionsAction {
    /// List recent transactions
    List {
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Search description, category name and amount
        #[arg(short, long)]
        search: Option<String>,

        /// Only income or only expense
        #[arg(long = "type")]
        kind: Option<String>,

        /// Category id or name
        #[arg(short, long)]
        category: Option<String>,

        /// Since the start of: today, week, month, quarter, year
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Record a transaction
    Add {
        /// income or expense
        #[arg(long = "type")]
        kind: String,

        /// Positive amount
        #[arg(short, long)]
        amount: f64,

        /// Category id or name
        #[arg(short, long, default_value = "others")]
        category: String,

        /// Description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Recurrence: none, daily, weekly, monthly, yearly
        #[arg(long, default_value = "none")]
        recurring: String,
    },

    /// Delete a transaction
    Delete {
        /// Transaction id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum BudgetsAction {
    /// List budgets with progress
    List,

    /// Create or replace the budget for a category
    Set {
        /// Category id or name
        category: String,

        /// Limit amount
        amount: f64,

        /// Period: weekly, monthly, yearly
        #[arg(short, long, default_value = "monthly")]
        period: String,
    },

    /// Delete a budget
    Delete {
        /// Budget id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List categories
    List,

    /// Add a custom category
    Add {
        /// Display name
        name: String,

        /// Icon class
        #[arg(long)]
        icon: Option<String>,

        /// Color (e.g., "#ff0000")
        #[arg(short, long)]
        color: Option<String>,
    },

    /// Delete a custom category
    Delete {
        /// Category id
        id: String,
    },
}
