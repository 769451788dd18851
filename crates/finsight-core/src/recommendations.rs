//! Actionable recommendations derived from the current month

use serde::{Deserialize, Serialize};

use crate::config::Thresholds;
use crate::context::FinancialContext;
use crate::format::currency;

/// Which rule produced a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    FirstBudget,
    BoostSavings,
    OptimizeLargestExpense,
    EmergencyFund,
    LongTermInvesting,
}

impl RecommendationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationKind::FirstBudget => "first_budget",
            RecommendationKind::BoostSavings => "boost_savings",
            RecommendationKind::OptimizeLargestExpense => "optimize_largest_expense",
            RecommendationKind::EmergencyFund => "emergency_fund",
            RecommendationKind::LongTermInvesting => "long_term_investing",
        }
    }
}

impl std::fmt::Display for RecommendationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a follow-up action does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionTarget {
    /// Send this question to the advisor
    Ask { question: String },
    /// Open another view (budgets, analysis, settings)
    Open { view: String },
}

/// A button-style follow-up on a recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationAction {
    pub label: String,
    pub primary: bool,
    pub target: ActionTarget,
}

impl RecommendationAction {
    fn ask(label: &str, primary: bool, question: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            primary,
            target: ActionTarget::Ask {
                question: question.into(),
            },
        }
    }

    fn open(label: &str, primary: bool, view: &str) -> Self {
        Self {
            label: label.to_string(),
            primary,
            target: ActionTarget::Open {
                view: view.to_string(),
            },
        }
    }

    /// The advisor question this action asks, if any
    pub fn question(&self) -> Option<&str> {
        match &self.target {
            ActionTarget::Ask { question } => Some(question),
            ActionTarget::Open { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub title: String,
    pub description: String,
    pub actions: Vec<RecommendationAction>,
}

type Rule = fn(&FinancialContext, &Thresholds) -> Option<Recommendation>;

/// Evaluated in order; every rule that applies contributes
const RULES: &[Rule] = &[
    first_budget,
    boost_savings,
    optimize_largest_expense,
    emergency_fund,
    long_term_investing,
];

/// Recommendations for a current-month snapshot
pub fn generate_recommendations(
    ctx: &FinancialContext,
    thresholds: &Thresholds,
) -> Vec<Recommendation> {
    let recommendations: Vec<Recommendation> =
        RULES.iter().filter_map(|rule| rule(ctx, thresholds)).collect();
    tracing::debug!(count = recommendations.len(), "Generated recommendations");
    recommendations
}

fn first_budget(ctx: &FinancialContext, _th: &Thresholds) -> Option<Recommendation> {
    (ctx.budget_total <= 0.0).then(|| Recommendation {
        kind: RecommendationKind::FirstBudget,
        title: "Set Up Your First Budget".to_string(),
        description: "Creating a budget is the foundation of good financial management. Start \
                      with the 50/30/20 rule to manage your expenses effectively."
            .to_string(),
        actions: vec![
            RecommendationAction::open("Create Budget", true, "budgets"),
            RecommendationAction::ask("Learn More", false, "How do I create a budget?"),
        ],
    })
}

fn boost_savings(ctx: &FinancialContext, th: &Thresholds) -> Option<Recommendation> {
    if ctx.savings_rate >= th.target_savings_rate {
        return None;
    }
    let increase = (th.target_savings_rate - ctx.savings_rate).max(5.0);
    Some(Recommendation {
        kind: RecommendationKind::BoostSavings,
        title: "Boost Your Savings Rate".to_string(),
        description: format!(
            "Aim to increase your savings rate by {:.1}% to reach the recommended {}%. Start \
             with small automated transfers to build the habit.",
            increase, th.target_savings_rate
        ),
        actions: vec![
            RecommendationAction::ask("Get Tips", true, "How can I save more money?"),
            RecommendationAction::open("View Analysis", false, "analysis/spending"),
        ],
    })
}

fn optimize_largest_expense(ctx: &FinancialContext, th: &Thresholds) -> Option<Recommendation> {
    let top = ctx.top_category()?;
    if top.amount <= ctx.total_income * th.large_expense_income_share {
        return None;
    }
    Some(Recommendation {
        kind: RecommendationKind::OptimizeLargestExpense,
        title: "Optimize Your Largest Expense".to_string(),
        description: format!(
            "Your {} spending is quite high. Consider reviewing and optimizing these expenses \
             to free up money for savings and other goals.",
            top.name
        ),
        actions: vec![
            RecommendationAction::ask(
                "Get Advice",
                true,
                format!("How can I reduce my {} expenses?", top.name.to_lowercase()),
            ),
            RecommendationAction::open("View Details", false, "analysis/spending"),
        ],
    })
}

fn emergency_fund(ctx: &FinancialContext, th: &Thresholds) -> Option<Recommendation> {
    if ctx.savings_rate <= 0.0 || ctx.total_expenses <= 0.0 {
        return None;
    }
    let months = th.emergency_fund_months;
    let target = ctx.total_expenses * months as f64;
    Some(Recommendation {
        kind: RecommendationKind::EmergencyFund,
        title: "Build Emergency Fund".to_string(),
        description: format!(
            "Aim for an emergency fund of {} ({} months of expenses). This provides financial \
             security for unexpected situations.",
            currency(target),
            months
        ),
        actions: vec![
            RecommendationAction::ask("Learn How", true, "How do I build an emergency fund?"),
            RecommendationAction::ask(
                "Calculate Goal",
                false,
                "How much should I have in my emergency fund?",
            ),
        ],
    })
}

fn long_term_investing(ctx: &FinancialContext, th: &Thresholds) -> Option<Recommendation> {
    (ctx.savings_rate >= th.investing_savings_rate && ctx.total_income > 0.0).then(|| {
        Recommendation {
            kind: RecommendationKind::LongTermInvesting,
            title: "Consider Long-term Investing".to_string(),
            description: "With your strong savings rate, you might be ready to explore \
                          long-term investment options to grow your wealth over time."
                .to_string(),
            actions: vec![
                RecommendationAction::ask("Get Started", true, "Should I start investing?"),
                RecommendationAction::open("Risk Assessment", false, "settings"),
            ],
        }
    })
}
