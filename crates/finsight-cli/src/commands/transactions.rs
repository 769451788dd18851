//! Transaction command implementations

use anyhow::Result;
use chrono::NaiveDate;
use finsight_core::{
    context::CategoryResolver, format::currency, models::parse_date, NewTransaction, Period,
    Recurrence, Store, Transaction, TransactionFilter, TransactionType,
};

use super::{resolve_category, truncate};

/// Raw `transactions list` arguments
#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions<'a> {
    pub limit: usize,
    pub search: Option<&'a str>,
    pub kind: Option<&'a str>,
    pub category: Option<&'a str>,
    pub period: Option<&'a str>,
}

impl ListOptions<'_> {
    /// The latest `limit` transactions, unfiltered
    pub fn recent(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }
}

/// Print matching transactions, newest first; returns how many were shown
pub fn cmd_transactions_list(
    store: &dyn Store,
    user: &str,
    options: ListOptions<'_>,
    today: NaiveDate,
) -> Result<usize> {
    let kind = options
        .kind
        .map(str::parse::<TransactionType>)
        .transpose()
        .map_err(anyhow::Error::msg)?;
    let period = options
        .period
        .map(str::parse::<Period>)
        .transpose()
        .map_err(anyhow::Error::msg)?;
    let category = options
        .category
        .map(|c| resolve_category(store, c))
        .transpose()?;

    let categories = store.list_categories()?;
    let mut transactions = TransactionFilter::new()
        .search(options.search)
        .kind(kind)
        .category(category.as_deref())
        .period(period)
        .apply(&store.list_transactions(user)?, &categories, today);
    transactions.truncate(options.limit);

    if transactions.is_empty() {
        println!("No transactions found. Add one with:");
        println!("  finsight transactions add --type expense --amount 12.50 --category food");
        return Ok(0);
    }

    let resolver = CategoryResolver::new(&categories);

    println!();
    println!("📝 Recent Transactions");
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in &transactions {
        println!("{}", transaction_line(tx, &resolver));
    }

    Ok(transactions.len())
}

/// One list row, with the category shown by name
pub fn transaction_line(tx: &Transaction, resolver: &CategoryResolver<'_>) -> String {
    let amount_str = if tx.is_expense() {
        format!("\x1b[31m-{}\x1b[0m", currency(tx.amount)) // Red for expenses
    } else {
        format!("\x1b[32m+{}\x1b[0m", currency(tx.amount)) // Green for income
    };

    format!(
        "   {} │ {:>12} │ {:<14} │ {} [{}]",
        tx.date,
        amount_str,
        truncate(resolver.name(&tx.category_id), 14),
        truncate(&tx.description, 30),
        tx.id
    )
}

/// Raw `transactions add` arguments
pub struct TransactionInput<'a> {
    pub kind: &'a str,
    pub amount: f64,
    pub category: &'a str,
    pub description: &'a str,
    pub date: Option<&'a str>,
    pub recurring: &'a str,
}

pub fn cmd_transactions_add(
    store: &dyn Store,
    user: &str,
    input: TransactionInput<'_>,
    today: NaiveDate,
) -> Result<Transaction> {
    let kind: TransactionType = input.kind.parse().map_err(anyhow::Error::msg)?;
    let recurring: Recurrence = input.recurring.parse().map_err(anyhow::Error::msg)?;
    let date = match input.date {
        Some(raw) => parse_date(raw).map_err(anyhow::Error::msg)?,
        None => today,
    };

    let tx = store.create_transaction(
        user,
        &NewTransaction {
            kind,
            amount: input.amount,
            category_id: resolve_category(store, input.category)?,
            description: input.description.to_string(),
            date,
            recurring,
        },
    )?;

    println!(
        "✅ Recorded {} of {} on {} ({})",
        tx.kind,
        currency(tx.amount),
        tx.date,
        tx.id
    );
    Ok(tx)
}

pub fn cmd_transactions_delete(store: &dyn Store, user: &str, id: &str) -> Result<()> {
    store.delete_transaction(user, id)?;
    println!("✅ Deleted transaction {}", id);
    Ok(())
}
