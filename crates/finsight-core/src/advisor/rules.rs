//! Rule-based chat answers
//!
//! A question is routed by keyword to exactly one topic. The table is
//! scanned top to bottom and the first topic with a keyword contained in
//! the lower-cased question wins, so "reduce my budget and save more"
//! is a budget question. Each topic then picks a template from the
//! snapshot's numbers.

use serde::{Deserialize, Serialize};

use crate::config::Thresholds;
use crate::context::FinancialContext;

/// Subject a chat question was routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatTopic {
    Budget,
    Savings,
    Investing,
    ExpenseReduction,
    General,
}

impl ChatTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatTopic::Budget => "budget",
            ChatTopic::Savings => "savings",
            ChatTopic::Investing => "investing",
            ChatTopic::ExpenseReduction => "expense_reduction",
            ChatTopic::General => "general",
        }
    }
}

impl std::fmt::Display for ChatTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

type Responder = fn(&FinancialContext, &Thresholds) -> String;

/// One row of the routing table
pub struct ChatRule {
    pub topic: ChatTopic,
    pub keywords: &'static [&'static str],
    respond: Responder,
}

impl ChatRule {
    /// Whether the (already lower-cased) question mentions this topic
    pub fn matches(&self, question: &str) -> bool {
        self.keywords.iter().any(|k| question.contains(k))
    }
}

/// Routing table in priority order
pub const CHAT_RULES: &[ChatRule] = &[
    ChatRule {
        topic: ChatTopic::Budget,
        keywords: &["budget", "spending"],
        respond: budget_answer,
    },
    ChatRule {
        topic: ChatTopic::Savings,
        keywords: &["save", "saving"],
        respond: savings_answer,
    },
    ChatRule {
        topic: ChatTopic::Investing,
        keywords: &["invest", "investment"],
        respond: investing_answer,
    },
    ChatRule {
        topic: ChatTopic::ExpenseReduction,
        keywords: &["reduce", "cut", "lower"],
        respond: reduction_answer,
    },
];

/// Shown when a reply cannot be produced at all
pub const ERROR_FALLBACK: &str =
    "I apologize, but I encountered an error while processing your request. Please try again.";

const GENERAL_ANSWER: &str = "I'm here to help with your financial questions! I can provide \
    advice on budgeting, saving, investing, expense management, and financial planning. Feel \
    free to ask me specific questions about your spending patterns, budget allocation, or \
    financial goals. What specific area of your finances would you like to focus on?";

/// A rule-table answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleAnswer {
    pub topic: ChatTopic,
    pub text: String,
}

/// Topic for a question
pub fn route(question: &str) -> ChatTopic {
    let lowered = question.to_lowercase();
    CHAT_RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| rule.topic)
        .unwrap_or(ChatTopic::General)
}

/// Answer a question from the rule table
pub fn answer(question: &str, ctx: &FinancialContext, thresholds: &Thresholds) -> RuleAnswer {
    let lowered = question.to_lowercase();
    match CHAT_RULES.iter().find(|rule| rule.matches(&lowered)) {
        Some(rule) => RuleAnswer {
            topic: rule.topic,
            text: (rule.respond)(ctx, thresholds),
        },
        None => RuleAnswer {
            topic: ChatTopic::General,
            text: GENERAL_ANSWER.to_string(),
        },
    }
}

fn budget_answer(ctx: &FinancialContext, th: &Thresholds) -> String {
    let Some(usage) = ctx.budget_usage() else {
        return "I notice you don't have any budgets set up yet. Creating a budget is one of the \
            most effective ways to manage your finances. Based on your current spending \
            patterns, I recommend starting with the 50/30/20 rule: 50% for needs, 30% for \
            wants, and 20% for savings. Would you like help setting up your first budget?"
            .to_string();
    };

    if usage > th.budget_over_limit {
        let top = ctx
            .top_category()
            .map(|t| t.name)
            .unwrap_or_else(|| "largest".to_string());
        format!(
            "You're currently {:.1}% over your monthly budget. I recommend reviewing your {} \
             spending, which appears to be your largest expense category. Consider setting \
             stricter limits and tracking daily expenses more closely.",
            usage - 100.0,
            top
        )
    } else if usage >= th.budget_near_limit {
        format!(
            "You've used {:.1}% of your monthly budget. You're getting close to your limit, so \
             I suggest being more cautious with discretionary spending for the rest of the \
             month. Focus on essential purchases only.",
            usage
        )
    } else {
        format!(
            "Great job! You're only using {:.1}% of your monthly budget. This gives you \
             flexibility for unexpected expenses or additional savings. Consider increasing \
             your savings target if you consistently stay under budget.",
            usage
        )
    }
}

fn savings_answer(ctx: &FinancialContext, th: &Thresholds) -> String {
    let rate = ctx.savings_rate;
    if rate < 0.0 {
        "I see you're spending more than you're earning this month. This is concerning for your \
         financial health. I recommend immediately reviewing all non-essential expenses and \
         creating an emergency budget. Focus on reducing discretionary spending and consider \
         additional income sources if possible."
            .to_string()
    } else if rate < th.low_savings_rate {
        format!(
            "Your current savings rate is {:.1}%, which is below the recommended {}%. Start by \
             automating your savings - even $50-100 per month can make a difference. Look for \
             small expenses to cut, like subscriptions you don't use or eating out less \
             frequently.",
            rate, th.target_savings_rate
        )
    } else if rate >= th.target_savings_rate {
        format!(
            "Excellent! Your {:.1}% savings rate is fantastic. With this strong foundation, \
             consider diversifying your savings into different goals: emergency fund (3-6 months \
             expenses), retirement contributions, and specific goals like vacation or down \
             payment funds.",
            rate
        )
    } else {
        format!(
            "Your {:.1}% savings rate is good, but there's room for improvement. Try to \
             gradually increase it to {}% by reducing your largest expense categories. Small \
             changes like cooking more at home or finding better deals on recurring expenses \
             can help.",
            rate, th.target_savings_rate
        )
    }
}

/// Risk label for a 1-10 tolerance score
pub fn risk_level(tolerance: u8) -> &'static str {
    if tolerance > 7 {
        "aggressive"
    } else if tolerance > 4 {
        "moderate"
    } else {
        "conservative"
    }
}

fn investing_answer(ctx: &FinancialContext, th: &Thresholds) -> String {
    if ctx.savings_rate < th.low_savings_rate {
        return format!(
            "Before investing, it's important to have a solid financial foundation. Focus on \
             building an emergency fund (3-6 months of expenses) and improving your savings \
             rate to at least {}%. Once you have that foundation, consider low-cost index funds \
             for long-term growth.",
            th.target_savings_rate
        );
    }

    let risk = risk_level(ctx.risk_tolerance);
    format!(
        "Based on your {risk} risk tolerance, I recommend starting with diversified index \
         funds. For {risk} investors, consider a mix of stock and bond funds appropriate for \
         your age and goals. Start with small, consistent investments and increase as you \
         become more comfortable."
    )
}

fn reduction_answer(ctx: &FinancialContext, _th: &Thresholds) -> String {
    match ctx.top_category() {
        Some(top) => format!(
            "Your largest expense category is {} at ${:.2} this month. Here are some ways to \
             reduce it:\n\n\
             • Review all {} expenses and eliminate unnecessary ones\n\
             • Look for cheaper alternatives or better deals\n\
             • Set a specific spending limit for this category\n\
             • Track daily expenses to stay accountable\n\n\
             Also consider reviewing subscriptions and recurring payments for quick wins.",
            top.name,
            top.amount,
            top.name.to_lowercase()
        ),
        None => "To reduce expenses, start by tracking all spending for a week to identify \
                 patterns. Common areas to cut include dining out, entertainment subscriptions, \
                 and impulse purchases. Try the 24-hour rule: wait a day before making \
                 non-essential purchases."
            .to_string(),
    }
}
