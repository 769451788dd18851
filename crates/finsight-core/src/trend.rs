//! Month-by-month income and expense trends

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::Transaction;
use crate::period::{first_of_month, last_of_month, months_before, DateWindow};

/// Longest lookback a trend will cover
pub const MAX_TREND_MONTHS: u32 = 120;

/// Summed income and expenses for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthBucket {
    /// `YYYY-MM`
    pub month: String,
    pub income: f64,
    pub expenses: f64,
}

impl MonthBucket {
    pub fn net(&self) -> f64 {
        self.income - self.expenses
    }
}

/// Percent change between two values; 0 when there is no base
pub fn change_percent(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else {
        0.0
    }
}

/// Income/expense deltas against some baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendDelta {
    pub baseline_income: f64,
    pub baseline_expenses: f64,
    pub income_change: f64,
    pub expense_change: f64,
}

impl TrendDelta {
    fn against(latest: &MonthBucket, baseline_income: f64, baseline_expenses: f64) -> Self {
        Self {
            baseline_income,
            baseline_expenses,
            income_change: change_percent(latest.income, baseline_income),
            expense_change: change_percent(latest.expenses, baseline_expenses),
        }
    }
}

/// A comparison over at least two non-empty months
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    /// Oldest first
    pub buckets: Vec<MonthBucket>,
    /// Latest month vs the month before it
    pub month_over_month: TrendDelta,
    /// Latest month vs the mean of every earlier month
    pub against_average: TrendDelta,
}

impl Trend {
    pub fn latest(&self) -> &MonthBucket {
        // buckets always holds at least two entries
        &self.buckets[self.buckets.len() - 1]
    }

    pub fn previous(&self) -> &MonthBucket {
        &self.buckets[self.buckets.len() - 2]
    }
}

/// Result of a trend request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrendOutcome {
    /// Fewer than two months with activity
    InsufficientData { months_with_data: usize },
    Comparison(Trend),
}

impl TrendOutcome {
    pub fn trend(&self) -> Option<&Trend> {
        match self {
            TrendOutcome::Comparison(trend) => Some(trend),
            TrendOutcome::InsufficientData { .. } => None,
        }
    }
}

/// Non-empty monthly buckets from `months_back` months before `today`'s
/// month through the end of `today`'s month, oldest first
pub fn monthly_buckets(
    transactions: &[Transaction],
    months_back: u32,
    today: NaiveDate,
) -> Vec<MonthBucket> {
    let (start_year, start_month) = months_before(today.year(), today.month(), months_back);
    let window = DateWindow::new(
        first_of_month(start_year, start_month),
        last_of_month(today.year(), today.month()),
    );

    let mut buckets: Vec<MonthBucket> = Vec::new();
    for tx in transactions.iter().filter(|t| window.contains(t.date)) {
        let key = tx.date.format("%Y-%m").to_string();
        let bucket = match buckets.iter().position(|b| b.month == key) {
            Some(i) => &mut buckets[i],
            None => {
                buckets.push(MonthBucket {
                    month: key,
                    income: 0.0,
                    expenses: 0.0,
                });
                let last = buckets.len() - 1;
                &mut buckets[last]
            }
        };
        if tx.is_income() {
            bucket.income += tx.amount;
        } else {
            bucket.expenses += tx.amount;
        }
    }

    buckets.sort_by(|a, b| a.month.cmp(&b.month));
    buckets
}

/// Compare the latest month against the previous one and against the
/// average of all earlier months
///
/// `months_back` is clamped to `1..=MAX_TREND_MONTHS`.
pub fn compute_trend(transactions: &[Transaction], months_back: u32, today: NaiveDate) -> TrendOutcome {
    let months_back = months_back.clamp(1, MAX_TREND_MONTHS);
    let buckets = monthly_buckets(transactions, months_back, today);
    if buckets.len() < 2 {
        tracing::debug!(months = buckets.len(), "Not enough months for a trend");
        return TrendOutcome::InsufficientData {
            months_with_data: buckets.len(),
        };
    }

    let latest = &buckets[buckets.len() - 1];
    let previous = &buckets[buckets.len() - 2];
    let prior = &buckets[..buckets.len() - 1];
    let avg_income = prior.iter().map(|b| b.income).sum::<f64>() / prior.len() as f64;
    let avg_expenses = prior.iter().map(|b| b.expenses).sum::<f64>() / prior.len() as f64;

    let month_over_month = TrendDelta::against(latest, previous.income, previous.expenses);
    let against_average = TrendDelta::against(latest, avg_income, avg_expenses);

    TrendOutcome::Comparison(Trend {
        buckets,
        month_over_month,
        against_average,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::fixtures::*;

    #[test]
    fn test_change_percent() {
        assert_eq!(change_percent(110.0, 100.0), 10.0);
        assert_eq!(change_percent(50.0, 100.0), -50.0);
        assert_eq!(change_percent(50.0, 0.0), 0.0);
    }

    #[test]
    fn test_single_month_is_insufficient() {
        let txs = vec![
            income(1000.0, date(2024, 3, 1)),
            expense(100.0, "food", date(2024, 3, 2)),
        ];
        let outcome = compute_trend(&txs, 3, date(2024, 3, 20));
        assert_eq!(
            outcome,
            TrendOutcome::InsufficientData {
                months_with_data: 1
            }
        );
        assert!(outcome.trend().is_none());
    }

    #[test]
    fn test_month_over_month_and_average() {
        let txs = vec![
            income(1000.0, date(2024, 1, 5)),
            expense(400.0, "food", date(2024, 1, 9)),
            income(2000.0, date(2024, 2, 5)),
            expense(600.0, "food", date(2024, 2, 9)),
            income(1800.0, date(2024, 3, 5)),
            expense(750.0, "food", date(2024, 3, 9)),
        ];
        let outcome = compute_trend(&txs, 6, date(2024, 3, 20));
        let trend = outcome.trend().unwrap();

        assert_eq!(trend.buckets.len(), 3);
        assert_eq!(trend.latest().month, "2024-03");
        assert_eq!(trend.previous().month, "2024-02");

        assert!((trend.month_over_month.income_change - (-10.0)).abs() < 1e-9);
        assert!((trend.month_over_month.expense_change - 25.0).abs() < 1e-9);

        // prior average: income 1500, expenses 500
        assert!((trend.against_average.income_change - 20.0).abs() < 1e-9);
        assert!((trend.against_average.expense_change - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_buckets_ignore_months_outside_range() {
        let txs = vec![
            income(999.0, date(2023, 6, 1)),
            income(100.0, date(2024, 2, 1)),
            income(200.0, date(2024, 4, 1)),
        ];
        let buckets = monthly_buckets(&txs, 3, date(2024, 4, 10));
        let months: Vec<&str> = buckets.iter().map(|b| b.month.as_str()).collect();
        assert_eq!(months, vec!["2024-02", "2024-04"]);
    }

    #[test]
    fn test_lookback_is_clamped() {
        let txs = vec![
            income(500.0, date(2000, 1, 10)),
            income(100.0, date(2024, 2, 1)),
            income(200.0, date(2024, 3, 1)),
        ];
        let outcome = compute_trend(&txs, 2_147_483_648, date(2024, 3, 20));
        let trend = outcome.trend().unwrap();
        assert_eq!(trend.buckets.len(), 2);
        assert_eq!(trend.buckets[0].month, "2024-02");

        let outcome = compute_trend(&txs, u32::MAX, date(2024, 3, 20));
        assert_eq!(outcome.trend().unwrap().buckets.len(), 2);
    }

    #[test]
    fn test_empty_months_are_skipped_not_zeroed() {
        let txs = vec![
            income(100.0, date(2023, 12, 15)),
            income(300.0, date(2024, 2, 15)),
        ];
        let trend = compute_trend(&txs, 3, date(2024, 2, 20));
        let trend = trend.trend().unwrap();
        assert_eq!(trend.previous().month, "2023-12");
        assert!((trend.month_over_month.income_change - 200.0).abs() < 1e-9);
    }
}
