//! Integration tests for finsight-core
//!
//! These tests exercise the store → context engine → advisor workflow
//! against a real SQLite database.

use std::sync::Arc;

use chrono::NaiveDate;
use finsight_core::{
    advisor::ReplySource,
    ai::MockBackend,
    analysis::{Analysis, AnalysisKind},
    export::{export_all, import_all, transactions_to_csv},
    insights::Severity,
    period::{DateWindow, Period},
    AIClient, Advisor, AdvisorConfig, BudgetPeriod, Database, MemoryStore, NewBudget,
    NewTransaction, Recurrence, Store, TransactionType,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_tx(kind: TransactionType, amount: f64, category: &str, on: NaiveDate) -> NewTransaction {
    NewTransaction {
        kind,
        amount,
        category_id: category.to_string(),
        description: String::new(),
        date: on,
        recurring: Recurrence::None,
    }
}

/// Five months of salary and spending, ending in March 2024
fn seed(store: &dyn Store, user: &str) {
    for month in 11..=12 {
        store
            .create_transaction(user, &new_tx(TransactionType::Income, 4000.0, "others", date(2023, month, 1)))
            .unwrap();
        store
            .create_transaction(user, &new_tx(TransactionType::Expense, 2500.0, "food", date(2023, month, 10)))
            .unwrap();
    }
    for month in 1..=3 {
        store
            .create_transaction(user, &new_tx(TransactionType::Income, 4000.0, "others", date(2024, month, 1)))
            .unwrap();
        store
            .create_transaction(user, &new_tx(TransactionType::Expense, 2500.0, "food", date(2024, month, 10)))
            .unwrap();
        store
            .create_transaction(user, &new_tx(TransactionType::Expense, 300.0, "transport", date(2024, month, 12)))
            .unwrap();
    }
}

// =============================================================================
// Database Integration Tests
// =============================================================================

#[test]
fn test_context_from_sqlite_store() {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    seed(&db, "alice");
    db.set_budget(
        "alice",
        &NewBudget {
            category_id: "food".into(),
            amount: 2000.0,
            period: BudgetPeriod::Monthly,
        },
    )
    .unwrap();

    let advisor = Advisor::new(Arc::new(db), None, AdvisorConfig::default());
    let today = date(2024, 3, 20);

    let month = advisor.context("alice", Period::Month.window(today)).unwrap();
    assert_eq!(month.total_income, 4000.0);
    assert_eq!(month.total_expenses, 2800.0);
    assert!((month.savings_rate - 30.0).abs() < 1e-9);
    assert_eq!(month.category_totals.get("Food & Dining"), Some(2500.0));
    assert_eq!(month.budget_total, 2000.0);

    // additivity across disjoint windows
    let q1 = advisor
        .context("alice", DateWindow::new(date(2024, 1, 1), date(2024, 3, 31)))
        .unwrap();
    let jan = advisor.context("alice", DateWindow::month_of(date(2024, 1, 5))).unwrap();
    let feb_mar = advisor
        .context("alice", DateWindow::new(date(2024, 2, 1), date(2024, 3, 31)))
        .unwrap();
    assert!((q1.net() - (jan.net() + feb_mar.net())).abs() < 1e-9);

    let insights = advisor.insights("alice", today).unwrap();
    let budget = insights.iter().find(|i| i.title == "Over Budget").unwrap();
    assert_eq!(budget.severity, Severity::Danger);
}

#[test]
fn test_analysis_views() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref(), "bob");
    let advisor = Advisor::new(store, None, AdvisorConfig::default());
    let today = date(2024, 3, 20);

    match advisor.analysis("bob", AnalysisKind::Trends, today).unwrap() {
        Analysis::Trends(trend) => {
            assert_eq!(trend.months, 5);
            assert_eq!(trend.trajectory, "Needs attention");
        }
        other => panic!("expected trends, got {:?}", other),
    }

    match advisor.analysis("bob", AnalysisKind::Budget, today).unwrap() {
        Analysis::NoBudgetData { .. } => {}
        other => panic!("expected no budget data, got {:?}", other),
    }

    let breakdown = advisor.breakdown("bob", Period::Month, today).unwrap();
    assert_eq!(breakdown.categories[0].name, "Food & Dining");
}

#[tokio::test]
async fn test_chat_round_trip_through_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("finsight.db");
    let today = date(2024, 3, 20);

    {
        let db = Database::new(path.to_str().unwrap()).unwrap();
        seed(&db, "carol");
        let mock = MockBackend::failing();
        let advisor = Advisor::new(
            Arc::new(db),
            Some(AIClient::Mock(mock.clone())),
            AdvisorConfig::default(),
        );

        let reply = advisor.ask("carol", "Should I invest?", today).await.unwrap();
        assert_eq!(reply.source, ReplySource::Rules);
        assert!(reply
            .response
            .starts_with("Based on your moderate risk tolerance"));
        assert_eq!(mock.calls(), 1);
    }

    // history survives reopening the database
    let db = Database::new(path.to_str().unwrap()).unwrap();
    let history = db.list_conversations("carol").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].user_message, "Should I invest?");
}

#[test]
fn test_export_then_import_into_fresh_store() {
    let source = Database::in_memory().unwrap();
    seed(&source, "dave");

    let export = export_all(&source).unwrap();
    let csv = transactions_to_csv(&export.transactions, &export.categories).unwrap();
    assert_eq!(csv.lines().count(), 1 + export.transactions.len());

    let target = MemoryStore::new();
    import_all(&target, &export).unwrap();
    assert_eq!(
        target.list_transactions("dave").unwrap(),
        source.list_transactions("dave").unwrap()
    );
}
