//! Core types for the insight battery

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which check produced an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    /// Placeholder shown before any transaction exists
    GetStarted,
    /// Top category share of this month's spending
    SpendingPattern,
    /// Monthly spend against the budget total
    BudgetStatus,
    /// This month's savings rate
    SavingsRate,
    /// Month-over-month income and expense movement
    CashFlow,
    /// Dashboard: spending close to or above income
    HighSpending,
    /// Dashboard: positive savings this month
    GreatSavings,
    /// Dashboard: largest category over all time
    TopCategory,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::GetStarted => "get_started",
            InsightKind::SpendingPattern => "spending_pattern",
            InsightKind::BudgetStatus => "budget_status",
            InsightKind::SavingsRate => "savings_rate",
            InsightKind::CashFlow => "cash_flow",
            InsightKind::HighSpending => "high_spending",
            InsightKind::GreatSavings => "great_savings",
            InsightKind::TopCategory => "top_category",
        }
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get_started" => Ok(InsightKind::GetStarted),
            "spending_pattern" => Ok(InsightKind::SpendingPattern),
            "budget_status" => Ok(InsightKind::BudgetStatus),
            "savings_rate" => Ok(InsightKind::SavingsRate),
            "cash_flow" => Ok(InsightKind::CashFlow),
            "high_spending" => Ok(InsightKind::HighSpending),
            "great_savings" => Ok(InsightKind::GreatSavings),
            "top_category" => Ok(InsightKind::TopCategory),
            _ => Err(format!("Unknown insight kind: {}", s)),
        }
    }
}

/// Tone of an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Danger,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        }
    }

    /// Terminal marker used by the CLI
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Info => "💡",
            Severity::Success => "✅",
            Severity::Warning => "⚠️",
            Severity::Danger => "🚨",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Severity::Info),
            "success" => Ok(Severity::Success),
            "warning" => Ok(Severity::Warning),
            "danger" => Ok(Severity::Danger),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// A labelled figure attached to an insight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
}

/// One observation about the user's finances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<Metric>,
}

impl Insight {
    pub fn new(
        kind: InsightKind,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            title: title.into(),
            description: description.into(),
            metrics: Vec::new(),
        }
    }

    /// Attach a metric
    pub fn with_metric(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.metrics.push(Metric {
            label: label.into(),
            value: value.into(),
        });
        self
    }

    pub fn metric(&self, label: &str) -> Option<&str> {
        self.metrics
            .iter()
            .find(|m| m.label == label)
            .map(|m| m.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            InsightKind::GetStarted,
            InsightKind::SpendingPattern,
            InsightKind::BudgetStatus,
            InsightKind::SavingsRate,
            InsightKind::CashFlow,
            InsightKind::HighSpending,
            InsightKind::GreatSavings,
            InsightKind::TopCategory,
        ] {
            assert_eq!(InsightKind::from_str(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_builder_and_serialization() {
        let insight = Insight::new(
            InsightKind::BudgetStatus,
            Severity::Danger,
            "Over Budget",
            "details",
        )
        .with_metric("Usage", "125.0%");

        assert_eq!(insight.metric("Usage"), Some("125.0%"));
        let json = serde_json::to_value(&insight).unwrap();
        assert_eq!(json["severity"], "danger");
        assert_eq!(json["kind"], "budget_status");

        let bare = Insight::new(InsightKind::GetStarted, Severity::Info, "t", "d");
        let json = serde_json::to_value(&bare).unwrap();
        assert!(json.get("metrics").is_none());
    }
}
