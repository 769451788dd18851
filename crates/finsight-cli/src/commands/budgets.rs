//! Budget command implementations

use anyhow::Result;
use chrono::NaiveDate;
use finsight_core::{
    context::budget_progress,
    format::{currency, percent},
    BudgetPeriod, NewBudget, Store,
};

use super::{resolve_category, truncate};

pub fn cmd_budgets_list(store: &dyn Store, user: &str, today: NaiveDate) -> Result<()> {
    let budgets = store.list_budgets(user)?;

    if budgets.is_empty() {
        println!("No budgets set. Create one with:");
        println!("  finsight budgets set food 500");
        return Ok(());
    }

    let progress = budget_progress(
        &store.list_transactions(user)?,
        &budgets,
        &store.list_categories()?,
        today,
    );

    println!();
    println!("🎯 Budgets");
    println!("   ─────────────────────────────────────────────────────────────");
    for (budget, p) in budgets.iter().zip(&progress) {
        let usage = if p.usage_percent > 100.0 {
            format!("\x1b[31m{}\x1b[0m", percent(p.usage_percent))
        } else {
            percent(p.usage_percent)
        };
        println!(
            "   {:<20} {:>10} / {:>10} {:<8} {:>8}  [{}]",
            truncate(&p.category_name, 20),
            currency(p.spent),
            currency(p.amount),
            budget.period,
            usage,
            budget.id
        );
    }

    Ok(())
}

pub fn cmd_budgets_set(
    store: &dyn Store,
    user: &str,
    category: &str,
    amount: f64,
    period: &str,
) -> Result<()> {
    let period: BudgetPeriod = period.parse().map_err(anyhow::Error::msg)?;
    let budget = store.set_budget(
        user,
        &NewBudget {
            category_id: resolve_category(store, category)?,
            amount,
            period,
        },
    )?;
    println!(
        "✅ Budget for {} set to {} ({})",
        budget.category_id,
        currency(budget.amount),
        budget.period
    );
    Ok(())
}

pub fn cmd_budgets_delete(store: &dyn Store, user: &str, id: &str) -> Result<()> {
    store.delete_budget(user, id)?;
    println!("✅ Deleted budget {}", id);
    Ok(())
}
