//! Analysis views
//!
//! Each view is a pure function over a [`Ledger`] and a reference date.
//! [`AnalysisKind`] selects one of the four advisor views; the spending
//! breakdown backs the per-period category report.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::Thresholds;
use crate::context::Ledger;
use crate::format::currency;
use crate::period::{days_in_month, first_of_month, months_before, DateWindow, Period};
use crate::trend::{compute_trend, monthly_buckets};

/// Which analysis view to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    #[default]
    Spending,
    Income,
    Budget,
    Trends,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Spending => "spending",
            AnalysisKind::Income => "income",
            AnalysisKind::Budget => "budget",
            AnalysisKind::Trends => "trends",
        }
    }

    pub fn all() -> &'static [AnalysisKind] {
        &[
            AnalysisKind::Spending,
            AnalysisKind::Income,
            AnalysisKind::Budget,
            AnalysisKind::Trends,
        ]
    }
}

impl std::str::FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spending" => Ok(AnalysisKind::Spending),
            "income" => Ok(AnalysisKind::Income),
            "budget" => Ok(AnalysisKind::Budget),
            "trends" | "trend" => Ok(AnalysisKind::Trends),
            _ => Err(format!("Unknown analysis type: {}", s)),
        }
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Current-month spending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingAnalysis {
    pub total_spent: f64,
    pub average_transaction: f64,
    pub transaction_count: usize,
    pub daily_average: f64,
    pub projected_monthly: f64,
    /// Typical transaction size: average ±30 %
    pub typical_low: f64,
    pub typical_high: f64,
    pub notes: Vec<String>,
}

/// Current-month income
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeAnalysis {
    pub total_income: f64,
    pub income_count: usize,
    pub average_per_source: f64,
    pub three_month_average: f64,
    pub consistency: String,
    pub frequency: String,
    pub versus_average: String,
    pub notes: Vec<String>,
}

/// Current-month budget adherence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAnalysis {
    pub total_budget: f64,
    pub total_spent: f64,
    pub usage_percent: f64,
    pub remaining: f64,
    pub on_track_categories: usize,
    pub budget_count: usize,
    pub on_track_percent: f64,
    pub utilization: String,
    /// Days the remaining budget lasts at the current daily rate; `None`
    /// when nothing has been spent yet
    pub days_covered: Option<i64>,
    pub notes: Vec<String>,
}

/// Six-month trend against the running average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub months: usize,
    pub average_income: f64,
    pub average_expenses: f64,
    pub income_change: f64,
    pub expense_change: f64,
    pub income_trend: String,
    pub expense_trend: String,
    pub trajectory: String,
}

/// Output of one analysis view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Analysis {
    Spending(SpendingAnalysis),
    Income(IncomeAnalysis),
    Budget(BudgetAnalysis),
    /// No budgets exist yet
    NoBudgetData { message: String },
    Trends(TrendAnalysis),
    /// Not enough recent activity for a trend
    InsufficientTrendData {
        transaction_count: usize,
        required: usize,
        message: String,
    },
}

/// Months of history used by the trend view
pub const TREND_MONTHS: u32 = 6;

/// Produce the requested analysis view for `today`
pub fn analyze(
    kind: AnalysisKind,
    ledger: &Ledger,
    thresholds: &Thresholds,
    today: NaiveDate,
) -> Analysis {
    match kind {
        AnalysisKind::Spending => Analysis::Spending(spending_analysis(ledger, today)),
        AnalysisKind::Income => Analysis::Income(income_analysis(ledger, today)),
        AnalysisKind::Budget => budget_analysis(ledger, thresholds, today),
        AnalysisKind::Trends => trend_analysis(ledger, thresholds, today),
    }
}

pub fn spending_analysis(ledger: &Ledger, today: NaiveDate) -> SpendingAnalysis {
    let month = DateWindow::month_of(today);
    let amounts: Vec<f64> = ledger
        .transactions
        .iter()
        .filter(|t| t.is_expense() && month.contains(t.date))
        .map(|t| t.amount)
        .collect();

    let total_spent: f64 = amounts.iter().sum();
    let transaction_count = amounts.len();
    let average_transaction = if transaction_count > 0 {
        total_spent / transaction_count as f64
    } else {
        0.0
    };
    let daily_average = total_spent / today.day() as f64;
    let projected_monthly = daily_average * days_in_month(today) as f64;
    let typical_low = average_transaction * 0.7;
    let typical_high = average_transaction * 1.3;

    let notes = vec![
        format!("Your daily spending average is {}", currency(daily_average)),
        format!(
            "At current rate, you'll spend {} this month",
            currency(projected_monthly)
        ),
        format!(
            "Most frequent transaction amount range: {} - {}",
            currency(typical_low),
            currency(typical_high)
        ),
    ];

    SpendingAnalysis {
        total_spent,
        average_transaction,
        transaction_count,
        daily_average,
        projected_monthly,
        typical_low,
        typical_high,
        notes,
    }
}

pub fn income_analysis(ledger: &Ledger, today: NaiveDate) -> IncomeAnalysis {
    let month = DateWindow::month_of(today);
    let amounts: Vec<f64> = ledger
        .transactions
        .iter()
        .filter(|t| t.is_income() && month.contains(t.date))
        .map(|t| t.amount)
        .collect();

    let total_income: f64 = amounts.iter().sum();
    let income_count = amounts.len();
    let average_per_source = if income_count > 0 {
        total_income / income_count as f64
    } else {
        0.0
    };

    let monthly_incomes: Vec<f64> = monthly_buckets(&ledger.transactions, 3, today)
        .into_iter()
        .filter(|b| b.income > 0.0)
        .map(|b| b.income)
        .collect();
    let three_month_average = if monthly_incomes.is_empty() {
        0.0
    } else {
        monthly_incomes.iter().sum::<f64>() / monthly_incomes.len() as f64
    };

    let consistency = if monthly_incomes.len() > 1 {
        "Multiple data points available"
    } else {
        "Limited data"
    };
    let frequency = if income_count == 1 {
        "Single source"
    } else {
        "Multiple sources"
    };
    let versus_average = if total_income >= three_month_average {
        "Above average"
    } else {
        "Below average"
    };

    let notes = vec![
        format!("Your income consistency: {}", consistency),
        format!("Primary income frequency: {}", frequency),
        format!("Income trend: {} this month", versus_average),
    ];

    IncomeAnalysis {
        total_income,
        income_count,
        average_per_source,
        three_month_average,
        consistency: consistency.to_string(),
        frequency: frequency.to_string(),
        versus_average: versus_average.to_string(),
        notes,
    }
}

pub fn budget_analysis(ledger: &Ledger, thresholds: &Thresholds, today: NaiveDate) -> Analysis {
    if ledger.budgets.is_empty() {
        return Analysis::NoBudgetData {
            message: "Create budgets to see detailed budget analysis and recommendations."
                .to_string(),
        };
    }

    let month = DateWindow::month_of(today);
    let total_budget: f64 = ledger.budgets.iter().map(|b| b.amount).sum();
    let total_spent = ledger.budget_spend(month);

    let on_track_categories = ledger
        .budgets
        .iter()
        .filter(|budget| {
            let spent: f64 = ledger
                .transactions
                .iter()
                .filter(|t| t.is_expense() && t.category_id == budget.category_id)
                .filter(|t| month.contains(t.date))
                .map(|t| t.amount)
                .sum();
            spent <= budget.amount
        })
        .count();

    let budget_count = ledger.budgets.len();
    let usage_percent = if total_budget > 0.0 {
        total_spent / total_budget * 100.0
    } else {
        0.0
    };
    let remaining = total_budget - total_spent;
    let on_track_percent = on_track_categories as f64 / budget_count as f64 * 100.0;

    let utilization = if usage_percent < thresholds.budget_near_limit {
        "Conservative"
    } else if usage_percent < thresholds.budget_over_limit {
        "Optimal"
    } else {
        "Over budget"
    };

    let daily_rate = total_spent / today.day() as f64;
    let days_covered = (daily_rate > 0.0).then(|| (remaining / daily_rate).floor() as i64);

    let mut notes = vec![
        format!(
            "{} of {} budget categories are on track",
            on_track_categories, budget_count
        ),
        format!("Budget utilization: {}", utilization),
    ];
    match days_covered {
        Some(days) => notes.push(format!(
            "Remaining budget can cover {} days at current rate",
            days
        )),
        None => notes.push("No spending recorded against your budgets yet".to_string()),
    }

    Analysis::Budget(BudgetAnalysis {
        total_budget,
        total_spent,
        usage_percent,
        remaining,
        on_track_categories,
        budget_count,
        on_track_percent,
        utilization: utilization.to_string(),
        days_covered,
        notes,
    })
}

pub fn trend_analysis(ledger: &Ledger, thresholds: &Thresholds, today: NaiveDate) -> Analysis {
    let (start_year, start_month) = months_before(today.year(), today.month(), TREND_MONTHS);
    let since = first_of_month(start_year, start_month);
    let transaction_count = ledger.transactions.iter().filter(|t| t.date >= since).count();

    let insufficient = |count: usize| Analysis::InsufficientTrendData {
        transaction_count: count,
        required: thresholds.min_trend_transactions,
        message: "Add more transactions over several months to see trend analysis.".to_string(),
    };

    if transaction_count < thresholds.min_trend_transactions {
        return insufficient(transaction_count);
    }

    let Some(trend) = compute_trend(&ledger.transactions, TREND_MONTHS, today).trend().cloned()
    else {
        return insufficient(transaction_count);
    };

    let delta = &trend.against_average;
    let income_trend = if delta.income_change > 5.0 {
        "Growing steadily"
    } else if delta.income_change > -5.0 {
        "Stable"
    } else {
        "Declining"
    };
    let expense_trend = if delta.expense_change > 10.0 {
        "Increasing rapidly"
    } else if delta.expense_change > -5.0 {
        "Stable"
    } else {
        "Decreasing"
    };
    let trajectory = if delta.income_change > delta.expense_change {
        "Improving"
    } else {
        "Needs attention"
    };

    Analysis::Trends(TrendAnalysis {
        months: trend.buckets.len(),
        average_income: delta.baseline_income,
        average_expenses: delta.baseline_expenses,
        income_change: delta.income_change,
        expense_change: delta.expense_change,
        income_trend: income_trend.to_string(),
        expense_trend: expense_trend.to_string(),
        trajectory: trajectory.to_string(),
    })
}

/// One category's share of spending in a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub name: String,
    pub color: String,
    pub amount: f64,
    pub count: usize,
    pub percentage: f64,
}

/// A short observation shown next to the breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub title: String,
    pub description: String,
}

/// Expense breakdown by category for a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingBreakdown {
    pub period: Period,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub total_spent: f64,
    pub transaction_count: usize,
    /// Largest first
    pub categories: Vec<CategoryBreakdown>,
    pub highlights: Vec<Highlight>,
}

const OTHERS_COLOR: &str = "#6b7280";

/// Group the period's expenses by category with top-category, average and
/// frequency highlights
pub fn spending_breakdown(ledger: &Ledger, period: Period, today: NaiveDate) -> SpendingBreakdown {
    let window = period.window(today);
    let resolver = ledger.resolver();
    let expenses: Vec<_> = ledger
        .transactions
        .iter()
        .filter(|t| t.is_expense() && window.contains(t.date))
        .collect();

    let total_spent: f64 = expenses.iter().map(|t| t.amount).sum();
    let mut categories: Vec<CategoryBreakdown> = Vec::new();
    for tx in &expenses {
        let (name, color) = match ledger.categories.iter().find(|c| c.id == tx.category_id) {
            Some(c) => (c.name.as_str(), c.color.as_str()),
            None => (resolver.name(&tx.category_id), OTHERS_COLOR),
        };
        match categories.iter_mut().find(|c| c.name == name) {
            Some(entry) => {
                entry.amount += tx.amount;
                entry.count += 1;
            }
            None => categories.push(CategoryBreakdown {
                name: name.to_string(),
                color: color.to_string(),
                amount: tx.amount,
                count: 1,
                percentage: 0.0,
            }),
        }
    }
    for entry in &mut categories {
        entry.percentage = if total_spent > 0.0 {
            entry.amount / total_spent * 100.0
        } else {
            0.0
        };
    }
    categories.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut highlights = Vec::new();
    if let Some(top) = categories.first() {
        highlights.push(Highlight {
            title: "Top Spending Category".to_string(),
            description: format!(
                "{} accounts for {:.1}% of your spending",
                top.name, top.percentage
            ),
        });
    }
    let average = if expenses.is_empty() {
        0.0
    } else {
        total_spent / expenses.len() as f64
    };
    highlights.push(Highlight {
        title: "Average Transaction".to_string(),
        description: format!("Your average transaction amount is {}", currency(average)),
    });
    let days: HashSet<NaiveDate> = expenses.iter().map(|t| t.date).collect();
    highlights.push(Highlight {
        title: "Spending Frequency".to_string(),
        description: format!("You made transactions on {} different days", days.len()),
    });

    SpendingBreakdown {
        period,
        window_start: window.start,
        window_end: window.end,
        total_spent,
        transaction_count: expenses.len(),
        categories,
        highlights,
    }
}
