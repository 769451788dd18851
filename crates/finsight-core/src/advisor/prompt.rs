//! User prompt sent to the LLM

use std::fmt::Write;

use crate::context::FinancialContext;

/// Render the advisor prompt for `question`
///
/// `total_transactions` is the size of the whole ledger, not just the
/// current month.
pub fn build_prompt(ctx: &FinancialContext, total_transactions: usize, question: &str) -> String {
    let mut prompt = String::from(
        "You are a professional financial advisor AI assistant. Based on the user's financial \
         data and question, provide helpful, accurate, and personalized advice.\n\n",
    );

    prompt.push_str("User's Financial Context:\n");
    let _ = writeln!(prompt, "- Monthly Income: ${:.2}", ctx.total_income);
    let _ = writeln!(prompt, "- Monthly Expenses: ${:.2}", ctx.total_expenses);
    let _ = writeln!(prompt, "- Monthly Budget: ${:.2}", ctx.budget_total);
    let _ = writeln!(prompt, "- Savings Rate: {:.1}%", ctx.savings_rate);
    let _ = writeln!(prompt, "- Total Transactions: {}", total_transactions);
    let _ = writeln!(prompt, "- Risk Tolerance: {}/10", ctx.risk_tolerance);

    prompt.push_str("\nCategory Spending:\n");
    for (name, amount) in ctx.category_totals.iter() {
        let _ = writeln!(prompt, "- {}: ${:.2}", name, amount);
    }

    let _ = write!(
        prompt,
        "\nUser Question: \"{}\"\n\nPlease provide a helpful, concise, and actionable response. \
         Focus on practical advice based on their financial situation.",
        question
    );
    prompt
}
