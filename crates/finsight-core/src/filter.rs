//! Transaction list filtering
//!
//! One filter backs both the CLI `transactions list` flags and the
//! `GET /api/transactions` query parameters.

use chrono::NaiveDate;

use crate::context::CategoryResolver;
use crate::models::{Category, Transaction, TransactionType};
use crate::period::Period;

/// Builder for narrowing a transaction list
///
/// Every set criterion must match. A period keeps transactions dated on or
/// after the start of the period's window.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter<'query> {
    pub search: Option<&'query str>,
    pub kind: Option<TransactionType>,
    pub category_id: Option<&'query str>,
    pub period: Option<Period>,
}

impl<'query> TransactionFilter<'query> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive match against description, category name and amount
    pub fn search(mut self, query: Option<&'query str>) -> Self {
        self.search = query.map(str::trim).filter(|q| !q.is_empty());
        self
    }

    pub fn kind(mut self, kind: Option<TransactionType>) -> Self {
        self.kind = kind;
        self
    }

    pub fn category(mut self, category_id: Option<&'query str>) -> Self {
        self.category_id = category_id.filter(|c| !c.is_empty());
        self
    }

    pub fn period(mut self, period: Option<Period>) -> Self {
        self.period = period;
        self
    }

    /// Matching transactions, newest date first (stable for equal dates)
    pub fn apply(
        &self,
        transactions: &[Transaction],
        categories: &[Category],
        today: NaiveDate,
    ) -> Vec<Transaction> {
        let resolver = CategoryResolver::new(categories);
        let since = self.period.map(|p| p.window(today).start);
        let needle = self.search.map(str::to_lowercase);

        let mut matched: Vec<Transaction> = transactions
            .iter()
            .filter(|tx| self.kind.map_or(true, |kind| tx.kind == kind))
            .filter(|tx| self.category_id.map_or(true, |id| tx.category_id == id))
            .filter(|tx| since.map_or(true, |start| tx.date >= start))
            .filter(|tx| match &needle {
                Some(needle) => searchable_text(tx, &resolver).contains(needle.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.date.cmp(&a.date));
        matched
    }
}

fn searchable_text(tx: &Transaction, resolver: &CategoryResolver<'_>) -> String {
    format!(
        "{} {} {}",
        tx.description,
        resolver.lookup(&tx.category_id).unwrap_or_default(),
        tx.amount
    )
    .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::fixtures::*;
    use crate::models::default_categories;

    fn ledger() -> Vec<Transaction> {
        let mut groceries = expense(82.4, "food", date(2024, 3, 18));
        groceries.description = "Weekly groceries".into();
        let mut bus = expense(2.75, "transport", date(2024, 3, 2));
        bus.description = "Bus fare".into();
        let mut salary = income(4000.0, date(2024, 3, 1));
        salary.description = "Salary".into();
        let mut old_dinner = expense(45.0, "food", date(2024, 1, 20));
        old_dinner.description = "Dinner out".into();
        vec![old_dinner, salary, bus, groceries]
    }

    fn run(filter: TransactionFilter<'_>) -> Vec<String> {
        filter
            .apply(&ledger(), &default_categories(), date(2024, 3, 20))
            .into_iter()
            .map(|t| t.description)
            .collect()
    }

    #[test]
    fn test_no_criteria_sorts_newest_first() {
        assert_eq!(
            run(TransactionFilter::new()),
            vec!["Weekly groceries", "Bus fare", "Salary", "Dinner out"]
        );
    }

    #[test]
    fn test_search_matches_description_category_and_amount() {
        assert_eq!(run(TransactionFilter::new().search(Some("GROCER"))), vec!["Weekly groceries"]);
        assert_eq!(
            run(TransactionFilter::new().search(Some("dining"))),
            vec!["Weekly groceries", "Dinner out"]
        );
        assert_eq!(run(TransactionFilter::new().search(Some("2.75"))), vec!["Bus fare"]);
        assert_eq!(run(TransactionFilter::new().search(Some("   "))).len(), 4);
    }

    #[test]
    fn test_type_filter() {
        assert_eq!(
            run(TransactionFilter::new().kind(Some(TransactionType::Income))),
            vec!["Salary"]
        );
        assert_eq!(run(TransactionFilter::new().kind(Some(TransactionType::Expense))).len(), 3);
    }

    #[test]
    fn test_category_filter() {
        assert_eq!(
            run(TransactionFilter::new().category(Some("food"))),
            vec!["Weekly groceries", "Dinner out"]
        );
        assert!(run(TransactionFilter::new().category(Some("travel"))).is_empty());
    }

    #[test]
    fn test_period_filter_uses_window_start() {
        assert_eq!(
            run(TransactionFilter::new().period(Some(Period::Week))),
            vec!["Weekly groceries"]
        );
        assert_eq!(run(TransactionFilter::new().period(Some(Period::Month))).len(), 3);
        assert_eq!(run(TransactionFilter::new().period(Some(Period::Quarter))).len(), 4);
    }

    #[test]
    fn test_criteria_combine() {
        let filter = TransactionFilter::new()
            .kind(Some(TransactionType::Expense))
            .category(Some("food"))
            .period(Some(Period::Month))
            .search(Some("weekly"));
        assert_eq!(run(filter), vec!["Weekly groceries"]);

        let filter = TransactionFilter::new()
            .kind(Some(TransactionType::Income))
            .category(Some("food"));
        assert!(run(filter).is_empty());
    }
}
