//! Financial Context Engine
//!
//! Pure aggregation over a user's ledger. Every view of the data (dashboard,
//! advisor insights, recommendations, chat, reports) builds its numbers from
//! a [`FinancialContext`] computed here, fresh on every call.
//!
//! ```rust,ignore
//! use finsight_core::context::{compute_context, Ledger};
//! use finsight_core::period::Period;
//!
//! let ledger = Ledger::load(&store, "local")?;
//! let snapshot = ledger.context(Period::Month.window(today));
//! println!("Savings rate: {:.1}%", snapshot.savings_rate);
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::NaiveDate;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Result;
use crate::models::{AiSettings, Budget, Category, Transaction, OTHERS_CATEGORY};
use crate::period::DateWindow;
use crate::store::Store;

/// Category name → summed amount, in first-seen order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTotals(Vec<(String, f64)>);

impl CategoryTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to `name`, appending it if unseen
    pub fn add(&mut self, name: &str, amount: f64) {
        match self.0.iter_mut().find(|(n, _)| n == name) {
            Some((_, total)) => *total += amount,
            None => self.0.push((name.to_string(), amount)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.0.iter().map(|(_, v)| v).sum()
    }

    /// Entries by descending amount; equal amounts keep insertion order
    pub fn sorted_desc(&self) -> Vec<(&str, f64)> {
        let mut entries: Vec<(&str, f64)> = self.iter().collect();
        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        entries
    }
}

impl FromIterator<(String, f64)> for CategoryTotals {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut totals = Self::new();
        for (name, amount) in iter {
            totals.add(&name, amount);
        }
        totals
    }
}

impl Serialize for CategoryTotals {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, amount) in &self.0 {
            map.serialize_entry(name, amount)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CategoryTotals {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TotalsVisitor;

        impl<'de> Visitor<'de> for TotalsVisitor {
            type Value = CategoryTotals;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of category name to amount")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut totals = CategoryTotals::new();
                while let Some((name, amount)) = access.next_entry::<String, f64>()? {
                    totals.add(&name, amount);
                }
                Ok(totals)
            }
        }

        deserializer.deserialize_map(TotalsVisitor)
    }
}

/// The category with the largest total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCategory {
    pub name: String,
    pub amount: f64,
}

/// Largest category; ties go to the first one seen. `None` when empty.
pub fn top_category(totals: &CategoryTotals) -> Option<TopCategory> {
    let mut best: Option<(&str, f64)> = None;
    for (name, amount) in totals.iter() {
        match best {
            Some((_, top)) if amount <= top => {}
            _ => best = Some((name, amount)),
        }
    }
    best.map(|(name, amount)| TopCategory {
        name: name.to_string(),
        amount,
    })
}

/// Snapshot of a user's finances over one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialContext {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub total_income: f64,
    pub total_expenses: f64,
    /// Percent of income kept; 0 when there is no income, negative when
    /// expenses exceed income
    pub savings_rate: f64,
    pub category_totals: CategoryTotals,
    pub budget_total: f64,
    pub transaction_count: usize,
    pub risk_tolerance: u8,
}

impl FinancialContext {
    pub fn net(&self) -> f64 {
        self.total_income - self.total_expenses
    }

    pub fn top_category(&self) -> Option<TopCategory> {
        top_category(&self.category_totals)
    }

    /// Expenses as a percentage of the budget total, if any budget exists
    pub fn budget_usage(&self) -> Option<f64> {
        (self.budget_total > 0.0).then(|| self.total_expenses / self.budget_total * 100.0)
    }
}

/// `(income - expenses) / income * 100`, or 0 without income
pub fn savings_rate(income: f64, expenses: f64) -> f64 {
    if income > 0.0 {
        (income - expenses) / income * 100.0
    } else {
        0.0
    }
}

/// Category id → display name lookup
pub struct CategoryResolver<'a> {
    names: HashMap<&'a str, &'a str>,
}

impl<'a> CategoryResolver<'a> {
    pub fn new(categories: &'a [Category]) -> Self {
        Self {
            names: categories
                .iter()
                .map(|c| (c.id.as_str(), c.name.as_str()))
                .collect(),
        }
    }

    /// Name for `category_id`, falling back to "Others"
    pub fn name(&self, category_id: &str) -> &'a str {
        self.names.get(category_id).copied().unwrap_or(OTHERS_CATEGORY)
    }

    /// Name for `category_id`, or `None` when the reference dangles
    pub fn lookup(&self, category_id: &str) -> Option<&'a str> {
        self.names.get(category_id).copied()
    }
}

/// Aggregate a ledger over `window` (both ends inclusive)
pub fn compute_context(
    transactions: &[Transaction],
    budgets: &[Budget],
    categories: &[Category],
    window: DateWindow,
    risk_tolerance: u8,
) -> FinancialContext {
    let resolver = CategoryResolver::new(categories);
    let mut total_income = 0.0;
    let mut total_expenses = 0.0;
    let mut category_totals = CategoryTotals::new();
    let mut transaction_count = 0;

    for tx in transactions.iter().filter(|t| window.contains(t.date)) {
        transaction_count += 1;
        if tx.is_income() {
            total_income += tx.amount;
        } else {
            total_expenses += tx.amount;
            category_totals.add(resolver.name(&tx.category_id), tx.amount);
        }
    }

    let budget_total = budgets.iter().map(|b| b.amount).sum();

    tracing::debug!(
        start = %window.start,
        end = %window.end,
        transactions = transaction_count,
        income = total_income,
        expenses = total_expenses,
        "Computed financial context"
    );

    FinancialContext {
        window_start: window.start,
        window_end: window.end,
        total_income,
        total_expenses,
        savings_rate: savings_rate(total_income, total_expenses),
        category_totals,
        budget_total,
        transaction_count,
        risk_tolerance,
    }
}

/// Expenses inside `window` that fall in a budgeted category
///
/// Each category is counted once, even if several budgets reference it.
pub fn budget_spend(transactions: &[Transaction], budgets: &[Budget], window: DateWindow) -> f64 {
    let budgeted: HashSet<&str> = budgets.iter().map(|b| b.category_id.as_str()).collect();
    transactions
        .iter()
        .filter(|t| t.is_expense() && window.contains(t.date))
        .filter(|t| budgeted.contains(t.category_id.as_str()))
        .map(|t| t.amount)
        .sum()
}

/// Spend against one budget over that budget's own period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProgress {
    pub budget_id: String,
    pub category_id: String,
    pub category_name: String,
    pub amount: f64,
    pub spent: f64,
    pub remaining: f64,
    pub usage_percent: f64,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
}

/// Progress for each budget, measured over its weekly/monthly/yearly window
pub fn budget_progress(
    transactions: &[Transaction],
    budgets: &[Budget],
    categories: &[Category],
    today: NaiveDate,
) -> Vec<BudgetProgress> {
    let resolver = CategoryResolver::new(categories);
    budgets
        .iter()
        .map(|budget| {
            let window = DateWindow::for_budget_period(budget.period, today);
            let spent: f64 = transactions
                .iter()
                .filter(|t| t.is_expense() && t.category_id == budget.category_id)
                .filter(|t| window.contains(t.date))
                .map(|t| t.amount)
                .sum();
            let usage_percent = if budget.amount > 0.0 {
                spent / budget.amount * 100.0
            } else {
                0.0
            };
            BudgetProgress {
                budget_id: budget.id.clone(),
                category_id: budget.category_id.clone(),
                category_name: resolver.name(&budget.category_id).to_string(),
                amount: budget.amount,
                spent,
                remaining: budget.amount - spent,
                usage_percent,
                window_start: window.start,
                window_end: window.end,
            }
        })
        .collect()
}

/// One user's raw records, loaded once per request
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    pub transactions: Vec<Transaction>,
    pub budgets: Vec<Budget>,
    pub categories: Vec<Category>,
    pub settings: AiSettings,
}

impl Ledger {
    pub fn load(store: &dyn Store, user_id: &str) -> Result<Self> {
        Ok(Self {
            transactions: store.list_transactions(user_id)?,
            budgets: store.list_budgets(user_id)?,
            categories: store.list_categories()?,
            settings: store.ai_settings(user_id)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn context(&self, window: DateWindow) -> FinancialContext {
        compute_context(
            &self.transactions,
            &self.budgets,
            &self.categories,
            window,
            self.settings.risk_tolerance,
        )
    }

    /// Budgeted-category spend inside `window`
    pub fn budget_spend(&self, window: DateWindow) -> f64 {
        budget_spend(&self.transactions, &self.budgets, window)
    }

    pub fn resolver(&self) -> CategoryResolver<'_> {
        CategoryResolver::new(&self.categories)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::models::default_categories;
    use crate::period::Period;

    #[test]
    fn test_empty_ledger_yields_zeros() {
        let ctx = compute_context(
            &[],
            &[],
            &default_categories(),
            Period::Month.window(date(2024, 3, 15)),
            5,
        );
        assert_eq!(ctx.total_income, 0.0);
        assert_eq!(ctx.total_expenses, 0.0);
        assert_eq!(ctx.savings_rate, 0.0);
        assert!(ctx.category_totals.is_empty());
        assert_eq!(ctx.transaction_count, 0);
    }

    #[test]
    fn test_savings_rate_zero_without_income() {
        let txs = vec![expense(300.0, "food", date(2024, 3, 2))];
        let ctx = compute_context(
            &txs,
            &[],
            &default_categories(),
            Period::Month.window(date(2024, 3, 15)),
            5,
        );
        assert_eq!(ctx.total_expenses, 300.0);
        assert_eq!(ctx.savings_rate, 0.0);
    }

    #[test]
    fn test_negative_savings_rate_not_clamped() {
        assert_eq!(savings_rate(100.0, 150.0), -50.0);
    }

    #[test]
    fn test_window_is_inclusive_on_both_ends() {
        let txs = vec![
            income(100.0, date(2024, 3, 1)),
            income(50.0, date(2024, 3, 31)),
            income(25.0, date(2024, 4, 1)),
        ];
        let ctx = compute_context(
            &txs,
            &[],
            &[],
            DateWindow::new(date(2024, 3, 1), date(2024, 3, 31)),
            5,
        );
        assert_eq!(ctx.total_income, 150.0);
        assert_eq!(ctx.transaction_count, 2);
    }

    #[test]
    fn test_unknown_category_groups_under_others() {
        let txs = vec![
            expense(10.0, "deleted-category", date(2024, 3, 3)),
            expense(5.0, "others", date(2024, 3, 4)),
            expense(20.0, "food", date(2024, 3, 5)),
        ];
        let ctx = compute_context(
            &txs,
            &[],
            &default_categories(),
            Period::Month.window(date(2024, 3, 15)),
            5,
        );
        assert_eq!(ctx.category_totals.get(OTHERS_CATEGORY), Some(15.0));
        assert_eq!(ctx.category_totals.get("Food & Dining"), Some(20.0));
    }

    #[test]
    fn test_net_is_additive_over_disjoint_windows() {
        let txs = vec![
            income(1000.0, date(2024, 1, 5)),
            expense(200.0, "food", date(2024, 1, 20)),
            income(500.0, date(2024, 2, 1)),
            expense(900.0, "travel", date(2024, 2, 14)),
            expense(30.0, "food", date(2024, 2, 29)),
        ];
        let cats = default_categories();
        let full = compute_context(
            &txs,
            &[],
            &cats,
            DateWindow::new(date(2024, 1, 1), date(2024, 2, 29)),
            5,
        );
        let first = compute_context(
            &txs,
            &[],
            &cats,
            DateWindow::new(date(2024, 1, 1), date(2024, 1, 31)),
            5,
        );
        let second = compute_context(
            &txs,
            &[],
            &cats,
            DateWindow::new(date(2024, 2, 1), date(2024, 2, 29)),
            5,
        );
        assert!((full.net() - (first.net() + second.net())).abs() < 1e-9);
    }

    #[test]
    fn test_top_category_tie_keeps_first_inserted() {
        let mut totals = CategoryTotals::new();
        totals.add("A", 100.0);
        totals.add("B", 100.0);
        assert_eq!(top_category(&totals).unwrap().name, "A");
        assert!(top_category(&CategoryTotals::new()).is_none());

        let sorted = totals.sorted_desc();
        assert_eq!(sorted[0].0, "A");
    }

    #[test]
    fn test_budget_total_ignores_window() {
        let ctx = compute_context(
            &[],
            &[budget("food", 200.0), budget("transport", 100.0)],
            &[],
            Period::Month.window(date(2024, 3, 15)),
            5,
        );
        assert_eq!(ctx.budget_total, 300.0);
        assert!(ctx.budget_usage().is_some());
    }

    #[test]
    fn test_budget_spend_counts_duplicate_budget_category_once() {
        let txs = vec![
            expense(250.0, "food", date(2024, 3, 5)),
            expense(40.0, "travel", date(2024, 3, 6)),
        ];
        let budgets = vec![budget("food", 200.0), budget("food", 100.0)];
        let spent = budget_spend(&txs, &budgets, Period::Month.window(date(2024, 3, 15)));
        assert_eq!(spent, 250.0);
    }

    #[test]
    fn test_budget_progress_uses_budget_period() {
        let today = date(2024, 3, 15);
        let txs = vec![
            expense(30.0, "food", date(2024, 3, 10)),
            expense(70.0, "food", date(2024, 3, 1)),
        ];
        let mut weekly = budget("food", 50.0);
        weekly.period = crate::models::BudgetPeriod::Weekly;

        let progress = budget_progress(&txs, &[weekly], &default_categories(), today);
        assert_eq!(progress[0].spent, 30.0);
        assert_eq!(progress[0].remaining, 20.0);
        assert_eq!(progress[0].usage_percent, 60.0);
        assert_eq!(progress[0].category_name, "Food & Dining");
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let txs = vec![
            income(5000.0, date(2024, 3, 1)),
            expense(120.0, "transport", date(2024, 3, 2)),
            expense(480.0, "food", date(2024, 3, 5)),
        ];
        let ctx = compute_context(
            &txs,
            &[budget("food", 400.0)],
            &default_categories(),
            Period::Month.window(date(2024, 3, 15)),
            7,
        );
        let json = serde_json::to_string(&ctx).unwrap();
        let parsed: FinancialContext = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ctx);

        let keys: Vec<&str> = parsed.category_totals.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Transportation", "Food & Dining"]);
    }
}
