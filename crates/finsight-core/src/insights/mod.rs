//! Insight battery - non-chat financial observations
//!
//! Each check looks at the current month (and, for cash flow, the trailing
//! months) and either fires one [`Insight`] or stays silent. Unlike the chat
//! rules, checks are independent: every check that fires is reported.
//!
//! ## Batteries
//!
//! - **Advisor** - spending pattern, budget status, savings rate, cash flow
//! - **Dashboard** - high spending alert, great savings, top spending category
//!
//! ## Usage
//!
//! ```rust,ignore
//! use finsight_core::insights::{InsightContext, InsightEngine};
//!
//! let ctx = InsightContext::new(&ledger, &config.thresholds, today);
//! for insight in InsightEngine::advisor().run(&ctx) {
//!     println!("{} {}", insight.severity.icon(), insight.title);
//! }
//! ```

pub mod checks;
pub mod engine;
pub mod types;

pub use checks::{
    BudgetStatusCheck, CashFlowCheck, GreatSavingsCheck, HighSpendingCheck, SavingsRateCheck,
    SpendingPatternCheck, TopCategoryCheck,
};
pub use engine::{InsightCheck, InsightContext, InsightEngine};
pub use types::{Insight, InsightKind, Metric, Severity};
