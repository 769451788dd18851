//! Finsight CLI - Personal finance tracker and advisor
//!
//! Usage:
//!   finsight init                      Initialize database
//!   finsight transactions add ...      Record income or an expense
//!   finsight dashboard                 This month at a glance
//!   finsight chat "How is my budget?"  Ask the advisor
//!   finsight serve --port 3000         Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    if let Commands::Init = cli.command {
        return commands::cmd_init(&cli.db, cli.config.as_deref());
    }

    let advisor = commands::open_advisor(&cli.db, cli.config.as_deref())?;
    let store = advisor.store().clone();
    let user = cli.user.as_str();
    let today = commands::today();

    match cli.command {
        Commands::Init => Ok(()),
        Commands::Dashboard => commands::cmd_dashboard(&advisor, user, today),
        Commands::Insights => commands::cmd_insights(&advisor, user, today),
        Commands::Recommendations => commands::cmd_recommendations(&advisor, user, today),
        Commands::Analysis { kind } => commands::cmd_analysis(&advisor, user, &kind, today),
        Commands::Breakdown { period } => commands::cmd_breakdown(&advisor, user, &period, today),
        Commands::Context { period, from, to } => {
            let period =
                commands::resolve_period(period.as_deref(), from.as_deref(), to.as_deref())?;
            commands::cmd_context(&advisor, user, period, today)
        }
        Commands::Trend { months } => commands::cmd_trend(&advisor, user, months, today),
        Commands::Chat { message } => commands::cmd_chat(&advisor, user, &message, today).await,
        Commands::History { clear, export } => {
            commands::cmd_history(&advisor, user, clear, export.as_deref())
        }
        Commands::Report { out } => {
            commands::cmd_report(&advisor, user, out.as_deref(), today).map(|_| ())
        }
        Commands::Transactions { action } => match action {
            None => commands::cmd_transactions_list(
                store.as_ref(),
                user,
                commands::ListOptions::recent(20),
                today,
            )
            .map(|_| ()),
            Some(TransactionsAction::List {
                limit,
                search,
                kind,
                category,
                period,
            }) => commands::cmd_transactions_list(
                store.as_ref(),
                user,
                commands::ListOptions {
                    limit,
                    search: search.as_deref(),
                    kind: kind.as_deref(),
                    category: category.as_deref(),
                    period: period.as_deref(),
                },
                today,
            )
            .map(|_| ()),
            Some(TransactionsAction::Add {
                kind,
                amount,
                category,
                description,
                date,
                recurring,
            }) => commands::cmd_transactions_add(
                store.as_ref(),
                user,
                commands::TransactionInput {
                    kind: &kind,
                    amount,
                    category: &category,
                    description: &description,
                    date: date.as_deref(),
                    recurring: &recurring,
                },
                today,
            )
            .map(|_| ()),
            Some(TransactionsAction::Delete { id }) => {
                commands::cmd_transactions_delete(store.as_ref(), user, &id)
            }
        },
        Commands::Budgets { action } => match action {
            None | Some(BudgetsAction::List) => {
                commands::cmd_budgets_list(store.as_ref(), user, today)
            }
            Some(BudgetsAction::Set {
                category,
                amount,
                period,
            }) => commands::cmd_budgets_set(store.as_ref(), user, &category, amount, &period),
            Some(BudgetsAction::Delete { id }) => {
                commands::cmd_budgets_delete(store.as_ref(), user, &id)
            }
        },
        Commands::Categories { action } => match action {
            None | Some(CategoriesAction::List) => commands::cmd_categories_list(store.as_ref()),
            Some(CategoriesAction::Add { name, icon, color }) => commands::cmd_categories_add(
                store.as_ref(),
                &name,
                icon.as_deref(),
                color.as_deref(),
            ),
            Some(CategoriesAction::Delete { id }) => {
                commands::cmd_categories_delete(store.as_ref(), &id)
            }
        },
        Commands::Export { out } => commands::cmd_export(store.as_ref(), &out),
        Commands::Import { file } => commands::cmd_import(store.as_ref(), &file).map(|_| ()),
        Commands::ExportTransactions { out } => {
            commands::cmd_export_transactions(store.as_ref(), user, out.as_deref())
        }
        Commands::ImportTransactions { file } => {
            commands::cmd_import_transactions(store.as_ref(), user, &file).map(|_| ())
        }
        Commands::Serve {
            port,
            host,
            allowed_origins,
        } => commands::cmd_serve(advisor, &cli.db, &host, port, allowed_origins).await,
    }
}
