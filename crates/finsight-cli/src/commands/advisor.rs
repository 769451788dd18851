//! Advisor command implementations
//!
//! Dashboard, insights, recommendations, analysis views, chat and reports.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use finsight_core::{
    format::{currency, percent, signed_percent},
    models::parse_date,
    Advisor, Analysis, AnalysisKind, Period, ReplySource, TrendOutcome, MAX_TREND_MONTHS,
};

use super::{print_insights, truncate};

pub fn cmd_dashboard(advisor: &Advisor, user: &str, today: NaiveDate) -> Result<()> {
    let dashboard = advisor.dashboard(user, today)?;
    let month = &dashboard.month;

    println!();
    println!("📊 Finsight Dashboard ({})", today.format("%B %Y"));
    println!("   ─────────────────────────────────────");
    println!("   Income:        {:>12}", currency(month.total_income));
    println!("   Expenses:      {:>12}", currency(month.total_expenses));
    println!("   Net:           {:>12}", currency(month.net()));
    println!("   Savings rate:  {:>12}", percent(month.savings_rate));

    if !dashboard.budgets.is_empty() {
        println!();
        println!("🎯 Budgets");
        for budget in &dashboard.budgets {
            println!(
                "   {:<20} {:>10} of {:>10}  ({})",
                truncate(&budget.category_name, 20),
                currency(budget.spent),
                currency(budget.amount),
                percent(budget.usage_percent)
            );
        }
    }

    println!();
    println!("💡 Insights");
    print_insights(&dashboard.insights);

    if !dashboard.recent_transactions.is_empty() {
        println!();
        println!("📝 Recent");
        for tx in &dashboard.recent_transactions {
            let amount = if tx.is_expense() {
                format!("\x1b[31m-{}\x1b[0m", currency(tx.amount))
            } else {
                format!("\x1b[32m+{}\x1b[0m", currency(tx.amount))
            };
            println!("   {} │ {:>12} │ {}", tx.date, amount, truncate(&tx.description, 30));
        }
    }

    Ok(())
}

pub fn cmd_insights(advisor: &Advisor, user: &str, today: NaiveDate) -> Result<()> {
    let insights = advisor.insights(user, today)?;

    println!();
    println!("🧠 Advisor Insights");
    println!("   ─────────────────────────────────────");
    print_insights(&insights);

    Ok(())
}

pub fn cmd_recommendations(advisor: &Advisor, user: &str, today: NaiveDate) -> Result<()> {
    let recommendations = advisor.recommendations(user, today)?;

    if recommendations.is_empty() {
        println!("✨ No recommendations right now. Keep it up!");
        return Ok(());
    }

    println!();
    println!("📋 Recommendations");
    println!("   ─────────────────────────────────────");
    for rec in &recommendations {
        println!("   • {}", rec.title);
        println!("     {}", rec.description);
        for action in &rec.actions {
            if let Some(question) = action.question() {
                println!("       → finsight chat \"{}\"", question);
            }
        }
    }

    Ok(())
}

pub fn cmd_analysis(advisor: &Advisor, user: &str, kind: &str, today: NaiveDate) -> Result<()> {
    let kind: AnalysisKind = kind.parse().map_err(anyhow::Error::msg)?;
    let analysis = advisor.analysis(user, kind, today)?;

    println!();
    println!("🔍 {} analysis", kind);
    println!("   ─────────────────────────────────────");

    let notes: &[String] = match &analysis {
        Analysis::Spending(a) => {
            println!("   Total spent:        {}", currency(a.total_spent));
            println!("   Transactions:       {}", a.transaction_count);
            println!("   Average:            {}", currency(a.average_transaction));
            println!("   Daily average:      {}", currency(a.daily_average));
            println!("   Projected month:    {}", currency(a.projected_monthly));
            println!(
                "   Typical range:      {} – {}",
                currency(a.typical_low),
                currency(a.typical_high)
            );
            a.notes.as_slice()
        }
        Analysis::Income(a) => {
            println!("   Total income:       {}", currency(a.total_income));
            println!("   Sources:            {}", a.income_count);
            println!("   Per source:         {}", currency(a.average_per_source));
            println!("   3-month average:    {}", currency(a.three_month_average));
            println!("   Consistency:        {}", a.consistency);
            println!("   Frequency:          {}", a.frequency);
            println!("   vs average:         {}", a.versus_average);
            a.notes.as_slice()
        }
        Analysis::Budget(a) => {
            println!("   Budget:             {}", currency(a.total_budget));
            println!("   Spent:              {}", currency(a.total_spent));
            println!("   Usage:              {}", percent(a.usage_percent));
            println!("   Remaining:          {}", currency(a.remaining));
            println!(
                "   On track:           {} of {} ({})",
                a.on_track_categories,
                a.budget_count,
                percent(a.on_track_percent)
            );
            println!("   Utilization:        {}", a.utilization);
            if let Some(days) = a.days_covered {
                println!("   Days covered:       {}", days);
            }
            a.notes.as_slice()
        }
        Analysis::Trends(a) => {
            println!("   Months analyzed:    {}", a.months);
            println!("   Average income:     {}", currency(a.average_income));
            println!("   Average expenses:   {}", currency(a.average_expenses));
            println!(
                "   Income trend:       {} ({})",
                a.income_trend,
                signed_percent(a.income_change)
            );
            println!(
                "   Expense trend:      {} ({})",
                a.expense_trend,
                signed_percent(a.expense_change)
            );
            println!("   Trajectory:         {}", a.trajectory);
            &[]
        }
        Analysis::NoBudgetData { message } | Analysis::InsufficientTrendData { message, .. } => {
            println!("   {}", message);
            &[]
        }
    };

    for note in notes {
        println!("   • {}", note);
    }

    Ok(())
}

pub fn cmd_breakdown(advisor: &Advisor, user: &str, period: &str, today: NaiveDate) -> Result<()> {
    let period: Period = period.parse().map_err(anyhow::Error::msg)?;
    let breakdown = advisor.breakdown(user, period, today)?;

    println!();
    println!(
        "🧾 Spending by category ({} to {})",
        breakdown.window_start, breakdown.window_end
    );
    println!("   ─────────────────────────────────────");

    if breakdown.categories.is_empty() {
        println!("   No expenses in this period.");
        return Ok(());
    }

    for category in &breakdown.categories {
        println!(
            "   {:<20} {:>12} {:>7}  ({} tx)",
            truncate(&category.name, 20),
            currency(category.amount),
            percent(category.percentage),
            category.count
        );
    }
    println!("   {:<20} {:>12}", "Total", currency(breakdown.total_spent));

    if !breakdown.highlights.is_empty() {
        println!();
        for highlight in &breakdown.highlights {
            println!("   💡 {}: {}", highlight.title, highlight.description);
        }
    }

    Ok(())
}

/// Resolve `--period` / `--from` / `--to` into a period
pub fn resolve_period(
    period: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<Period> {
    match (from, to) {
        (Some(from), Some(to)) => {
            let start = parse_date(from).map_err(anyhow::Error::msg)?;
            let end = parse_date(to).map_err(anyhow::Error::msg)?;
            if start > end {
                bail!("--from must not be after --to");
            }
            Ok(Period::Custom { start, end })
        }
        (None, None) => match period {
            Some(name) => name.parse().map_err(anyhow::Error::msg),
            None => Ok(Period::Month),
        },
        _ => bail!("--from and --to must be given together"),
    }
}

pub fn cmd_context(
    advisor: &Advisor,
    user: &str,
    period: Period,
    today: NaiveDate,
) -> Result<()> {
    let ctx = advisor.context(user, period.window(today))?;
    println!("{}", serde_json::to_string_pretty(&ctx)?);
    Ok(())
}

pub fn cmd_trend(advisor: &Advisor, user: &str, months: u32, today: NaiveDate) -> Result<()> {
    if months == 0 || months > MAX_TREND_MONTHS {
        bail!("--months must be between 1 and {}", MAX_TREND_MONTHS);
    }

    match advisor.trend(user, months, today)? {
        TrendOutcome::InsufficientData { months_with_data } => {
            println!(
                "📉 Not enough history for a trend ({} month(s) with activity, need 2).",
                months_with_data
            );
        }
        TrendOutcome::Comparison(trend) => {
            println!();
            println!("📈 Monthly trend");
            println!("   ─────────────────────────────────────");
            for bucket in &trend.buckets {
                println!(
                    "   {}  income {:>12}  expenses {:>12}  net {:>12}",
                    bucket.month,
                    currency(bucket.income),
                    currency(bucket.expenses),
                    currency(bucket.net())
                );
            }
            println!();
            println!(
                "   vs last month:  income {}, expenses {}",
                signed_percent(trend.month_over_month.income_change),
                signed_percent(trend.month_over_month.expense_change)
            );
            println!(
                "   vs average:     income {}, expenses {}",
                signed_percent(trend.against_average.income_change),
                signed_percent(trend.against_average.expense_change)
            );
        }
    }

    Ok(())
}

pub async fn cmd_chat(advisor: &Advisor, user: &str, message: &str, today: NaiveDate) -> Result<()> {
    if advisor.has_llm() {
        println!("🤖 Thinking...");
    }

    let reply = advisor.ask(user, message, today).await?;

    println!();
    println!("{}", reply.response);
    println!();
    match reply.source {
        ReplySource::Llm => println!("   (answered by the LLM)"),
        ReplySource::Rules => println!("   (rule-based answer)"),
        ReplySource::Fallback => println!("   ⚠️  Your data could not be read, showing a generic answer"),
    }
    if !reply.saved {
        println!("   ⚠️  This exchange could not be saved to history");
    }

    Ok(())
}

pub fn cmd_history(advisor: &Advisor, user: &str, clear: bool, export: Option<&Path>) -> Result<()> {
    if clear {
        let removed = advisor.clear_history(user)?;
        println!("🗑️  Removed {} conversation(s)", removed);
        return Ok(());
    }

    if let Some(path) = export {
        let history = advisor.export_history(user)?;
        let json = serde_json::to_string_pretty(&history)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!(
            "✅ Exported {} conversation(s) to {}",
            history.conversations.len(),
            path.display()
        );
        return Ok(());
    }

    let history = advisor.history(user)?;
    if history.is_empty() {
        println!("No conversations yet. Ask something with:");
        println!("  finsight chat \"How is my budget?\"");
        return Ok(());
    }

    for conversation in history {
        println!();
        println!("🙋 [{}] {}", conversation.timestamp.format("%Y-%m-%d %H:%M"), conversation.user_message);
        println!("🤖 {}", conversation.ai_response);
    }

    Ok(())
}

/// Write the report and return where it went
pub fn cmd_report(
    advisor: &Advisor,
    user: &str,
    out: Option<&Path>,
    today: NaiveDate,
) -> Result<PathBuf> {
    let report = advisor.report(user, today)?;
    let path = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(report.file_name()));

    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    println!("✅ Report written to {}", path.display());
    println!(
        "   Income {} · Expenses {} · Savings {}",
        currency(report.summary.monthly_income),
        currency(report.summary.monthly_expenses),
        percent(report.summary.savings_rate)
    );

    Ok(path)
}
