//! Insight engine - runs an ordered battery of independent checks

use chrono::NaiveDate;

use crate::config::Thresholds;
use crate::context::{FinancialContext, Ledger};
use crate::period::DateWindow;

use super::checks::{
    BudgetStatusCheck, CashFlowCheck, GreatSavingsCheck, HighSpendingCheck, SavingsRateCheck,
    SpendingPatternCheck, TopCategoryCheck,
};
use super::types::{Insight, InsightKind, Severity};

/// Data handed to every check
pub struct InsightContext<'a> {
    pub ledger: &'a Ledger,
    pub thresholds: &'a Thresholds,
    pub today: NaiveDate,
    /// Snapshot of the calendar month containing `today`
    pub month: FinancialContext,
}

impl<'a> InsightContext<'a> {
    pub fn new(ledger: &'a Ledger, thresholds: &'a Thresholds, today: NaiveDate) -> Self {
        Self {
            ledger,
            thresholds,
            today,
            month: ledger.context(DateWindow::month_of(today)),
        }
    }

    /// Current-month spend in budgeted categories
    pub fn budget_spend(&self) -> f64 {
        self.ledger.budget_spend(DateWindow::month_of(self.today))
    }
}

/// A single rule in an insight battery
pub trait InsightCheck: Send + Sync {
    fn kind(&self) -> InsightKind;

    /// The insight, if this check fires
    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<Insight>;
}

/// Ordered collection of checks; every check that fires contributes one
/// insight, in registration order
pub struct InsightEngine {
    checks: Vec<Box<dyn InsightCheck>>,
    /// Returned alone when the ledger has no transactions
    empty: Insight,
}

impl InsightEngine {
    /// Engine with no checks, answering `empty` for an empty ledger
    pub fn with_empty(empty: Insight) -> Self {
        Self {
            checks: vec![],
            empty,
        }
    }

    /// Advisor battery: spending pattern, budget status, savings, cash flow
    pub fn advisor() -> Self {
        let mut engine = Self::with_empty(Insight::new(
            InsightKind::GetStarted,
            Severity::Info,
            "Get Started",
            "Add some transactions to receive personalized AI insights about your spending \
             patterns and financial health.",
        ));

        engine.register(Box::new(SpendingPatternCheck));
        engine.register(Box::new(BudgetStatusCheck));
        engine.register(Box::new(SavingsRateCheck));
        engine.register(Box::new(CashFlowCheck::default()));

        engine
    }

    /// Dashboard battery: high spending, savings, top category
    pub fn dashboard() -> Self {
        let mut engine = Self::with_empty(Insight::new(
            InsightKind::GetStarted,
            Severity::Info,
            "Start Tracking",
            "Add your first transaction to get personalized insights about your spending \
             patterns.",
        ));

        engine.register(Box::new(HighSpendingCheck));
        engine.register(Box::new(GreatSavingsCheck));
        engine.register(Box::new(TopCategoryCheck));

        engine
    }

    /// Append a check to the battery
    pub fn register(&mut self, check: Box<dyn InsightCheck>) {
        self.checks.push(check);
    }

    /// Run every check and collect those that fire
    pub fn run(&self, ctx: &InsightContext<'_>) -> Vec<Insight> {
        if ctx.ledger.is_empty() {
            return vec![self.empty.clone()];
        }

        let mut insights = Vec::new();
        for check in &self.checks {
            match check.evaluate(ctx) {
                Some(insight) => {
                    tracing::debug!(
                        check = check.kind().as_str(),
                        severity = insight.severity.as_str(),
                        "Insight check fired"
                    );
                    insights.push(insight);
                }
                None => {
                    tracing::debug!(check = check.kind().as_str(), "Insight check skipped");
                }
            }
        }
        insights
    }

    /// Kinds of the registered checks, in order
    pub fn check_kinds(&self) -> Vec<InsightKind> {
        self.checks.iter().map(|c| c.kind()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::fixtures::*;

    #[test]
    fn test_battery_order() {
        assert_eq!(
            InsightEngine::advisor().check_kinds(),
            vec![
                InsightKind::SpendingPattern,
                InsightKind::BudgetStatus,
                InsightKind::SavingsRate,
                InsightKind::CashFlow,
            ]
        );
        assert_eq!(
            InsightEngine::dashboard().check_kinds(),
            vec![
                InsightKind::HighSpending,
                InsightKind::GreatSavings,
                InsightKind::TopCategory,
            ]
        );
    }

    #[test]
    fn test_empty_ledger_gets_single_placeholder() {
        let ledger = ledger(vec![], vec![budget("food", 100.0)]);
        let thresholds = Thresholds::default();
        let ctx = InsightContext::new(&ledger, &thresholds, date(2024, 3, 15));

        let insights = InsightEngine::advisor().run(&ctx);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].title, "Get Started");

        let insights = InsightEngine::dashboard().run(&ctx);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].title, "Start Tracking");
    }

    struct AlwaysFires;

    impl InsightCheck for AlwaysFires {
        fn kind(&self) -> InsightKind {
            InsightKind::CashFlow
        }

        fn evaluate(&self, _ctx: &InsightContext<'_>) -> Option<Insight> {
            Some(Insight::new(self.kind(), Severity::Info, "custom", "custom"))
        }
    }

    #[test]
    fn test_registered_check_runs_last() {
        let ledger = ledger(vec![income(100.0, date(2024, 3, 1))], vec![]);
        let thresholds = Thresholds::default();
        let ctx = InsightContext::new(&ledger, &thresholds, date(2024, 3, 15));

        let mut engine = InsightEngine::dashboard();
        engine.register(Box::new(AlwaysFires));
        let insights = engine.run(&ctx);
        assert_eq!(insights.last().unwrap().title, "custom");
    }
}
