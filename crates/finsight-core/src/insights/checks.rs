//! Built-in insight checks

use crate::context::top_category;
use crate::format::{currency, signed_percent};
use crate::trend::compute_trend;

use super::engine::{InsightCheck, InsightContext};
use super::types::{Insight, InsightKind, Severity};

/// Top category's share of this month's expenses
pub struct SpendingPatternCheck;

impl InsightCheck for SpendingPatternCheck {
    fn kind(&self) -> InsightKind {
        InsightKind::SpendingPattern
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<Insight> {
        let month = &ctx.month;
        let count = ctx
            .ledger
            .transactions
            .iter()
            .filter(|t| t.is_expense() && t.date >= month.window_start && t.date <= month.window_end)
            .count();
        if count == 0 {
            return None;
        }

        let top = month.top_category()?;
        let total = month.total_expenses;
        let share = (top.amount / total * 100.0).round();

        Some(
            Insight::new(
                self.kind(),
                Severity::Info,
                "Spending Pattern Analysis",
                format!(
                    "Your top spending category this month is {}, accounting for {}% of your expenses.",
                    top.name, share
                ),
            )
            .with_metric("Total Spent", currency(total))
            .with_metric("Avg Transaction", currency(total / count as f64))
            .with_metric("Transactions", count.to_string()),
        )
    }
}

/// Budgeted-category spend against the budget total
pub struct BudgetStatusCheck;

impl InsightCheck for BudgetStatusCheck {
    fn kind(&self) -> InsightKind {
        InsightKind::BudgetStatus
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<Insight> {
        let budget_total = ctx.month.budget_total;
        if ctx.ledger.budgets.is_empty() || budget_total <= 0.0 {
            return Some(Insight::new(
                self.kind(),
                Severity::Warning,
                "No Budget Set",
                "Setting up a budget can help you manage your expenses better and achieve your \
                 financial goals.",
            ));
        }

        let spent = ctx.budget_spend();
        let usage = spent / budget_total * 100.0;
        let th = ctx.thresholds;

        let (severity, title, description) = if usage > th.budget_over_limit {
            (
                Severity::Danger,
                "Over Budget",
                format!(
                    "You've exceeded your monthly budget by {:.1}%. Consider reviewing your spending.",
                    usage - 100.0
                ),
            )
        } else if usage >= th.budget_near_limit {
            (
                Severity::Warning,
                "Near Budget Limit",
                format!(
                    "You've used {:.1}% of your monthly budget. Watch your spending for the rest of the month.",
                    usage
                ),
            )
        } else {
            (
                Severity::Success,
                "Budget On Track",
                format!(
                    "You've used {:.1}% of your monthly budget. Great job staying on track!",
                    usage
                ),
            )
        };

        Some(
            Insight::new(self.kind(), severity, title, description)
                .with_metric("Spent", currency(spent))
                .with_metric("Budget", currency(budget_total))
                .with_metric("Usage", format!("{:.1}%", usage)),
        )
    }
}

/// This month's savings rate, always reported once there is activity
pub struct SavingsRateCheck;

impl InsightCheck for SavingsRateCheck {
    fn kind(&self) -> InsightKind {
        InsightKind::SavingsRate
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<Insight> {
        let month = &ctx.month;
        let rate = month.savings_rate;
        let th = ctx.thresholds;

        let (severity, title, description) = if rate < 0.0 {
            (
                Severity::Danger,
                "Spending More Than Earning",
                "Your expenses exceed your income this month. Consider reducing discretionary \
                 spending."
                    .to_string(),
            )
        } else if rate < th.low_savings_rate {
            (
                Severity::Warning,
                "Low Savings Rate",
                format!(
                    "You're only saving {:.1}% of your income. Aim for at least {}% to build financial security.",
                    rate, th.target_savings_rate
                ),
            )
        } else if rate < th.target_savings_rate {
            (
                Severity::Info,
                "Good Savings Progress",
                format!(
                    "You're saving {:.1}% of your income. Consider increasing to {}% or more for optimal financial health.",
                    rate, th.target_savings_rate
                ),
            )
        } else {
            (
                Severity::Success,
                "Great Savings Rate!",
                format!(
                    "You're saving {:.1}% of your income this month. Keep up the excellent work!",
                    rate
                ),
            )
        };

        Some(
            Insight::new(self.kind(), severity, title, description)
                .with_metric("Monthly Savings", currency(month.net()))
                .with_metric("Savings Rate", format!("{:.1}%", rate))
                .with_metric("Income", currency(month.total_income)),
        )
    }
}

/// Latest month against the one before it
pub struct CashFlowCheck {
    pub months_back: u32,
}

impl Default for CashFlowCheck {
    fn default() -> Self {
        Self { months_back: 3 }
    }
}

impl InsightCheck for CashFlowCheck {
    fn kind(&self) -> InsightKind {
        InsightKind::CashFlow
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<Insight> {
        let outcome = compute_trend(&ctx.ledger.transactions, self.months_back, ctx.today);
        let trend = outcome.trend()?;
        let delta = &trend.month_over_month;
        let income_change = delta.income_change;
        let expense_change = delta.expense_change;

        let (severity, title, description) = if income_change > 0.0 && expense_change < 0.0 {
            (
                Severity::Success,
                "Excellent Cash Flow",
                "Your income increased while expenses decreased. Perfect financial momentum!"
                    .to_string(),
            )
        } else if income_change < 0.0 && expense_change > 0.0 {
            (
                Severity::Warning,
                "Cash Flow Concern",
                "Your income decreased while expenses increased. Consider reviewing your budget."
                    .to_string(),
            )
        } else {
            (
                Severity::Info,
                "Cash Flow Analysis",
                format!(
                    "Your income changed by {} and expenses by {} compared to last month.",
                    signed_percent(income_change),
                    signed_percent(expense_change)
                ),
            )
        };

        Some(
            Insight::new(self.kind(), severity, title, description)
                .with_metric("Income Change", signed_percent(income_change))
                .with_metric("Expense Change", signed_percent(expense_change))
                .with_metric("Net Flow", currency(trend.latest().net())),
        )
    }
}

/// Dashboard: this month's expenses close to or above income
pub struct HighSpendingCheck;

impl InsightCheck for HighSpendingCheck {
    fn kind(&self) -> InsightKind {
        InsightKind::HighSpending
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<Insight> {
        let income = ctx.month.total_income;
        let expenses = ctx.month.total_expenses;
        if expenses <= income * ctx.thresholds.high_spending_income_share {
            return None;
        }

        let description = if income > 0.0 {
            format!(
                "You've spent {} this month, which is {}% of your income.",
                currency(expenses),
                (expenses / income * 100.0).round()
            )
        } else {
            format!(
                "You've spent {} this month with no income recorded.",
                currency(expenses)
            )
        };

        Some(Insight::new(
            self.kind(),
            Severity::Warning,
            "High Spending Alert",
            description,
        ))
    }
}

/// Dashboard: money left over this month
pub struct GreatSavingsCheck;

impl InsightCheck for GreatSavingsCheck {
    fn kind(&self) -> InsightKind {
        InsightKind::GreatSavings
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<Insight> {
        let savings = ctx.month.net();
        (savings > 0.0).then(|| {
            Insight::new(
                self.kind(),
                Severity::Success,
                "Great Savings!",
                format!(
                    "You've saved {} this month. Consider investing it for long-term growth.",
                    currency(savings)
                ),
            )
        })
    }
}

/// Dashboard: largest expense category across the whole ledger
pub struct TopCategoryCheck;

impl InsightCheck for TopCategoryCheck {
    fn kind(&self) -> InsightKind {
        InsightKind::TopCategory
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<Insight> {
        let all_time = ctx.ledger.context(crate::period::DateWindow::all_time());
        let top = top_category(&all_time.category_totals)?;
        Some(Insight::new(
            self.kind(),
            Severity::Info,
            "Top Spending Category",
            format!(
                "Your highest spending category is {} with {} spent.",
                top.name,
                currency(top.amount)
            ),
        ))
    }
}
