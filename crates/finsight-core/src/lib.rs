//! Finsight Core Library
//!
//! Shared functionality for the Finsight personal finance advisor:
//! - Key-value persistence port with SQLite and in-memory stores
//! - Financial Context Engine (period snapshots, category totals, trends)
//! - Analysis views (spending, income, budget, trends, breakdowns)
//! - Insight and recommendation batteries
//! - Chat advisor with an LLM call and a rule-based fallback
//! - Reports, data export/import and transaction files

pub mod advisor;
pub mod ai;
pub mod analysis;
pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod filter;
pub mod format;
pub mod insights;
pub mod models;
pub mod period;
pub mod recommendations;
pub mod store;
pub mod trend;

/// Test utilities including a mock chat-completions server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use advisor::{Advisor, AdvisorReply, ChatTopic, Dashboard, ReplySource};
pub use ai::{AIClient, ChatBackend, MockBackend, OpenAICompatibleBackend};
pub use analysis::{Analysis, AnalysisKind, SpendingBreakdown};
pub use config::{AdvisorConfig, LlmConfig, Thresholds};
pub use context::{compute_context, BudgetProgress, CategoryTotals, FinancialContext, Ledger};
pub use error::{Error, Result};
pub use export::{ChatExport, DataExport, FinancialReport, ImportStats};
pub use filter::TransactionFilter;
pub use insights::{Insight, InsightEngine, InsightKind, Severity};
pub use models::{
    AiSettings, Budget, BudgetPeriod, Category, Conversation, NewBudget, NewCategory,
    NewTransaction, Recurrence, Transaction, TransactionType, User,
};
pub use period::{DateWindow, Period};
pub use recommendations::{Recommendation, RecommendationKind};
pub use store::{Database, MemoryStore, Store};
pub use trend::{Trend, TrendOutcome, MAX_TREND_MONTHS};
