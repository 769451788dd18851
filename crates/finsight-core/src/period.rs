//! Date windows for aggregation

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::BudgetPeriod;

/// A named reporting period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", tag = "period")]
pub enum Period {
    Today,
    Week,
    #[default]
    Month,
    Quarter,
    Year,
    Custom { start: NaiveDate, end: NaiveDate },
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Week => "week",
            Period::Month => "month",
            Period::Quarter => "quarter",
            Period::Year => "year",
            Period::Custom { .. } => "custom",
        }
    }

    /// Resolve an optional period name, falling back to the current month
    pub fn parse_or_month(name: Option<&str>) -> Self {
        name.and_then(|n| n.parse().ok()).unwrap_or_default()
    }

    /// Resolve this period to a concrete window relative to `today`
    pub fn window(&self, today: NaiveDate) -> DateWindow {
        match *self {
            Period::Today => DateWindow::new(today, today),
            Period::Week => DateWindow::new(today - Duration::days(7), today),
            Period::Month => DateWindow::month_of(today),
            Period::Quarter => DateWindow::quarter_of(today),
            Period::Year => DateWindow::year_of(today),
            Period::Custom { start, end } => DateWindow::new(start, end),
        }
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "today" => Ok(Period::Today),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "quarter" => Ok(Period::Quarter),
            "year" => Ok(Period::Year),
            _ => Err(format!("Unknown period: {}", s)),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Custom { start, end } => write!(f, "{} to {}", start, end),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Build a window; reversed bounds are swapped
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Covers every representable date
    pub fn all_time() -> Self {
        Self {
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Calendar month containing `date`
    pub fn month_of(date: NaiveDate) -> Self {
        let start = first_of_month(date.year(), date.month());
        Self {
            start,
            end: last_of_month(date.year(), date.month()),
        }
    }

    /// Calendar quarter containing `date`
    pub fn quarter_of(date: NaiveDate) -> Self {
        let first_month = (date.month0() / 3) * 3 + 1;
        Self {
            start: first_of_month(date.year(), first_month),
            end: last_of_month(date.year(), first_month + 2),
        }
    }

    /// Calendar year containing `date`
    pub fn year_of(date: NaiveDate) -> Self {
        Self {
            start: first_of_month(date.year(), 1),
            end: last_of_month(date.year(), 12),
        }
    }

    /// The window a budget's spend is measured over
    pub fn for_budget_period(period: BudgetPeriod, today: NaiveDate) -> Self {
        match period {
            BudgetPeriod::Weekly => Self::new(today - Duration::days(7), today),
            BudgetPeriod::Monthly => Self::month_of(today),
            BudgetPeriod::Yearly => Self::year_of(today),
        }
    }
}

/// First day of a month; month must be 1..=12
pub fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

/// Last day of a month
pub fn last_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    first_of_month(next_year, next_month)
        .pred_opt()
        .unwrap_or(NaiveDate::MAX)
}

/// Number of days in the month containing `date`
pub fn days_in_month(date: NaiveDate) -> u32 {
    last_of_month(date.year(), date.month()).day()
}

/// Shift a (year, month) pair back by `months`
pub fn months_before(year: i32, month: u32, months: u32) -> (i32, u32) {
    let index = i64::from(year) * 12 + i64::from(month) - 1 - i64::from(months);
    let year = i32::try_from(index.div_euclid(12)).unwrap_or(i32::MIN);
    (year, index.rem_euclid(12) as u32 + 1)
}
