//! Reports, backups and transaction files
//!
//! Supports:
//! - Financial report (JSON) combining the month snapshot, insights and
//!   recommendations
//! - Chat history export
//! - Full data export/import covering every store key
//! - Transaction CSV export and JSON/CSV transaction import

use std::io::Read;

use chrono::{DateTime, NaiveDate, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::context::{CategoryResolver, FinancialContext};
use crate::error::{Error, Result};
use crate::insights::Insight;
use crate::models::{
    default_categories, Budget, Category, Conversation, NewTransaction, Recurrence, Transaction,
    TransactionType, User,
};
use crate::recommendations::Recommendation;
use crate::store::{keys, Store};

/// Transactions included in a report
pub const REPORT_TRANSACTION_LIMIT: usize = 50;

/// Name and email shown on reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportUser {
    pub name: String,
    pub email: String,
}

impl ReportUser {
    /// Profile for `user_id`, falling back to the bare id
    pub fn lookup(store: &dyn Store, user_id: &str) -> Result<Self> {
        Ok(match store.get_user(user_id)? {
            Some(user) if !user.full_name.is_empty() => Self {
                name: user.full_name,
                email: user.email,
            },
            Some(user) => Self {
                name: user_id.to_string(),
                email: user.email,
            },
            None => Self {
                name: user_id.to_string(),
                email: String::new(),
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub savings_rate: f64,
    /// Budget usage percent, 0 without budgets
    pub budget_status: f64,
}

/// Downloadable financial report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialReport {
    pub generated_at: DateTime<Utc>,
    pub user: ReportUser,
    pub summary: ReportSummary,
    pub context: FinancialContext,
    pub insights: Vec<Insight>,
    pub recommendations: Vec<Recommendation>,
    /// Most recent first
    pub transactions: Vec<Transaction>,
}

impl FinancialReport {
    pub fn new(
        user: ReportUser,
        context: FinancialContext,
        insights: Vec<Insight>,
        recommendations: Vec<Recommendation>,
        transactions: &[Transaction],
    ) -> Self {
        let summary = ReportSummary {
            monthly_income: context.total_income,
            monthly_expenses: context.total_expenses,
            savings_rate: context.savings_rate,
            budget_status: context.budget_usage().unwrap_or(0.0),
        };
        Self {
            generated_at: Utc::now(),
            user,
            summary,
            context,
            insights,
            recommendations,
            transactions: latest_transactions(transactions, REPORT_TRANSACTION_LIMIT),
        }
    }

    /// Suggested file name, e.g. `financial-report-2024-03-20.json`
    pub fn file_name(&self) -> String {
        format!("financial-report-{}.json", self.generated_at.format("%Y-%m-%d"))
    }
}

/// Up to `limit` transactions, newest date first (stable for equal dates)
pub fn latest_transactions(transactions: &[Transaction], limit: usize) -> Vec<Transaction> {
    let mut sorted = transactions.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted.truncate(limit);
    sorted
}

/// One user's chat history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatExport {
    pub user: String,
    pub export_date: DateTime<Utc>,
    pub conversations: Vec<Conversation>,
}

/// Everything in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataExport {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
    #[serde(default = "default_categories")]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub conversations: Vec<Conversation>,
    #[serde(default = "Utc::now")]
    pub export_date: DateTime<Utc>,
}

/// Records written by [`import_all`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportStats {
    pub users: usize,
    pub transactions: usize,
    pub budgets: usize,
    pub categories: usize,
    pub conversations: usize,
    /// Transactions and budgets dropped for failing validation
    #[serde(default)]
    pub skipped: usize,
}

/// Snapshot every store key
pub fn export_all(store: &dyn Store) -> Result<DataExport> {
    Ok(DataExport {
        users: store.list_users()?,
        transactions: read_all(store, keys::TRANSACTIONS)?,
        budgets: read_all(store, keys::BUDGETS)?,
        categories: store.list_categories()?,
        conversations: read_all(store, keys::CONVERSATIONS)?,
        export_date: Utc::now(),
    })
}

/// Replace every store key with the contents of `data`
///
/// Transactions and budgets that fail validation are skipped and counted.
/// All five keys are written in one atomic step.
pub fn import_all(store: &dyn Store, data: &DataExport) -> Result<ImportStats> {
    let mut skipped = 0;
    let transactions: Vec<&Transaction> = data
        .transactions
        .iter()
        .filter(|tx| match tx.validate() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(id = %tx.id, error = %e, "Skipping invalid transaction in backup");
                skipped += 1;
                false
            }
        })
        .collect();
    let budgets: Vec<&Budget> = data
        .budgets
        .iter()
        .filter(|budget| match budget.validate() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(id = %budget.id, error = %e, "Skipping invalid budget in backup");
                skipped += 1;
                false
            }
        })
        .collect();

    store.set_many(&[
        (keys::USERS, serde_json::to_value(&data.users)?),
        (keys::TRANSACTIONS, serde_json::to_value(&transactions)?),
        (keys::BUDGETS, serde_json::to_value(&budgets)?),
        (keys::CATEGORIES, serde_json::to_value(&data.categories)?),
        (keys::CONVERSATIONS, serde_json::to_value(&data.conversations)?),
    ])?;

    let stats = ImportStats {
        users: data.users.len(),
        transactions: transactions.len(),
        budgets: budgets.len(),
        categories: data.categories.len(),
        conversations: data.conversations.len(),
        skipped,
    };
    tracing::info!(
        transactions = stats.transactions,
        budgets = stats.budgets,
        conversations = stats.conversations,
        skipped,
        "Imported data export"
    );
    Ok(stats)
}

fn read_all<T: serde::de::DeserializeOwned>(store: &dyn Store, key: &str) -> Result<Vec<T>> {
    match store.get(key)? {
        Some(value) if !value.is_null() => Ok(serde_json::from_value(value)?),
        _ => Ok(Vec::new()),
    }
}

const CSV_HEADERS: [&str; 5] = ["Date", "Type", "Amount", "Category", "Description"];
const UNKNOWN_CATEGORY: &str = "Unknown";

/// Render transactions as CSV with a `Date,Type,Amount,Category,Description` header
pub fn transactions_to_csv(transactions: &[Transaction], categories: &[Category]) -> Result<String> {
    let resolver = CategoryResolver::new(categories);
    let mut wtr = WriterBuilder::new().from_writer(Vec::new());
    wtr.write_record(CSV_HEADERS)?;

    for tx in transactions {
        let amount = tx.amount.to_string();
        let date = tx.date.to_string();
        wtr.write_record([
            date.as_str(),
            tx.kind.as_str(),
            amount.as_str(),
            resolver.lookup(&tx.category_id).unwrap_or(UNKNOWN_CATEGORY),
            tx.description.as_str(),
        ])?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| Error::InvalidData(format!("Failed to flush CSV: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::InvalidData(e.to_string()))
}

/// Parse a CSV in the export format back into new transactions
///
/// Category names are matched case-insensitively; unknown names land in
/// "others". Rows that fail validation are skipped with a warning.
pub fn parse_transactions_csv<R: Read>(
    reader: R,
    categories: &[Category],
) -> Result<Vec<NewTransaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut transactions = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        let field = |i: usize| record.get(i).unwrap_or_default();

        let parsed = parse_csv_row(field(0), field(1), field(2), field(3), field(4), categories);
        match parsed.and_then(|tx| tx.validate().map(|_| tx)) {
            Ok(tx) => transactions.push(tx),
            Err(e) => tracing::warn!(row = line + 2, error = %e, "Skipping CSV row"),
        }
    }

    tracing::debug!(count = transactions.len(), "Parsed transaction CSV");
    Ok(transactions)
}

fn parse_csv_row(
    date: &str,
    kind: &str,
    amount: &str,
    category: &str,
    description: &str,
    categories: &[Category],
) -> Result<NewTransaction> {
    let date: NaiveDate = crate::models::parse_date(date).map_err(Error::InvalidInput)?;
    let kind: TransactionType = kind.parse().map_err(Error::InvalidInput)?;
    let amount: f64 = amount
        .parse()
        .map_err(|_| Error::InvalidInput(format!("Invalid amount: {}", amount)))?;
    let category_id = categories
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(category) || c.id == category)
        .map(|c| c.id.clone())
        .unwrap_or_else(|| "others".to_string());

    Ok(NewTransaction {
        kind,
        amount,
        category_id,
        description: description.to_string(),
        date,
        recurring: Recurrence::None,
    })
}

#[derive(Deserialize)]
struct TransactionFile {
    transactions: Vec<NewTransaction>,
}

/// Parse a `{"transactions": [...]}` file
///
/// Ids and owners in the file are ignored; the store assigns fresh ones.
pub fn parse_transactions_json(content: &str) -> Result<Vec<NewTransaction>> {
    let file: TransactionFile = serde_json::from_str(content)
        .map_err(|e| Error::InvalidData(format!("Invalid file format: {}", e)))?;
    Ok(file.transactions)
}

/// Validate and append imported transactions for `user_id`
pub fn import_transactions(
    store: &dyn Store,
    user_id: &str,
    incoming: Vec<NewTransaction>,
) -> Result<usize> {
    let now = Utc::now();
    let records = incoming
        .into_iter()
        .filter_map(|new| match new.validate() {
            Ok(()) => Some(Transaction {
                id: String::new(),
                user_id: user_id.to_string(),
                kind: new.kind,
                amount: new.amount,
                category_id: new.category_id,
                description: new.description,
                date: new.date,
                recurring: new.recurring,
                created_at: now,
                updated_at: now,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping invalid imported transaction");
                None
            }
        })
        .collect();
    store.import_transactions(user_id, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::fixtures::*;
    use crate::period::DateWindow;
    use crate::store::MemoryStore;

    #[test]
    fn test_report_keeps_latest_fifty() {
        let transactions: Vec<Transaction> = (0..60)
            .map(|i| expense(1.0 + i as f64, "food", date(2024, 1, 1) + chrono::Days::new(i)))
            .collect();
        let ledger = ledger(transactions, vec![budget("food", 100.0)]);
        let ctx = ledger.context(DateWindow::month_of(date(2024, 1, 15)));

        let report = FinancialReport::new(
            ReportUser {
                name: "Ada".into(),
                email: "ada@example.com".into(),
            },
            ctx,
            vec![],
            vec![],
            &ledger.transactions,
        );
        assert_eq!(report.transactions.len(), REPORT_TRANSACTION_LIMIT);
        assert_eq!(report.transactions[0].date, date(2024, 2, 29));
        assert_eq!(report.summary.monthly_expenses, (1..=31).sum::<i32>() as f64);
        assert!((report.summary.budget_status - 496.0).abs() < 1e-9);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["generatedAt"].is_string());
        assert!(json["summary"]["budgetStatus"].is_number());
        assert_eq!(json["user"]["name"], "Ada");
    }

    #[test]
    fn test_report_user_fallback() {
        let store = MemoryStore::new();
        let user = ReportUser::lookup(&store, "u1").unwrap();
        assert_eq!(user.name, "u1");

        store
            .save_user(&User {
                id: "u1".into(),
                full_name: "Grace Hopper".into(),
                email: "grace@example.com".into(),
            })
            .unwrap();
        let user = ReportUser::lookup(&store, "u1").unwrap();
        assert_eq!(user.name, "Grace Hopper");
    }

    #[test]
    fn test_export_import_all() {
        let source = MemoryStore::new();
        source
            .import_transactions("u1", vec![expense(10.0, "food", date(2024, 3, 1))])
            .unwrap();
        source.append_conversation("u1", "hi", "hello").unwrap();

        let export = export_all(&source).unwrap();
        assert_eq!(export.transactions.len(), 1);
        assert_eq!(export.categories.len(), 10);

        let json = serde_json::to_string(&export).unwrap();
        let parsed: DataExport = serde_json::from_str(&json).unwrap();

        let target = MemoryStore::new();
        let stats = import_all(&target, &parsed).unwrap();
        assert_eq!(stats.transactions, 1);
        assert_eq!(stats.conversations, 1);
        assert_eq!(target.list_transactions("u1").unwrap(), export.transactions);
        assert_eq!(target.list_conversations("u1").unwrap().len(), 1);
    }

    #[test]
    fn test_import_all_skips_invalid_amounts() {
        let mut refund = expense(-500.0, "food", date(2024, 3, 5));
        refund.description = "negative".into();
        let mut blank_owner = expense(20.0, "food", date(2024, 3, 6));
        blank_owner.user_id = String::new();
        let data = DataExport {
            users: vec![],
            transactions: vec![
                income(1000.0, date(2024, 3, 1)),
                refund,
                expense(f64::INFINITY, "food", date(2024, 3, 7)),
                blank_owner,
                expense(100.0, "food", date(2024, 3, 8)),
            ],
            budgets: vec![budget("food", -10.0), budget("transport", 200.0)],
            categories: default_categories(),
            conversations: vec![],
            export_date: Utc::now(),
        };

        let store = MemoryStore::new();
        let stats = import_all(&store, &data).unwrap();
        assert_eq!(stats.transactions, 2);
        assert_eq!(stats.budgets, 1);
        assert_eq!(stats.skipped, 4);

        let transactions = store.list_transactions("u1").unwrap();
        assert!(transactions.iter().all(|t| t.amount > 0.0));
        let budgets = store.list_budgets("u1").unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].category_id, "transport");

        let ctx = ledger(transactions, budgets).context(DateWindow::month_of(date(2024, 3, 15)));
        assert_eq!(ctx.total_expenses, 100.0);
        assert!((ctx.savings_rate - 90.0).abs() < 1e-9);
        assert_eq!(ctx.budget_total, 200.0);
    }

    #[test]
    fn test_import_defaults_missing_sections() {
        let parsed: DataExport = serde_json::from_str(r#"{"users": []}"#).unwrap();
        assert!(parsed.transactions.is_empty());
        assert_eq!(parsed.categories, default_categories());

        let store = MemoryStore::new();
        let stats = import_all(&store, &parsed).unwrap();
        assert_eq!(stats.categories, 10);
        assert_eq!(store.list_categories().unwrap(), default_categories());
    }

    #[test]
    fn test_transactions_csv() {
        let mut lunch = expense(12.5, "food", date(2024, 3, 2));
        lunch.description = "Lunch, with \"friends\"".into();
        let stray = expense(3.0, "deleted-category", date(2024, 3, 3));
        let csv = transactions_to_csv(&[lunch, stray], &default_categories()).unwrap();

        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Date,Type,Amount,Category,Description"));
        assert_eq!(
            lines.next(),
            Some("2024-03-02,expense,12.5,Food & Dining,\"Lunch, with \"\"friends\"\"\"")
        );
        assert_eq!(lines.next(), Some("2024-03-03,expense,3,Unknown,"));
    }

    #[test]
    fn test_parse_transactions_csv() {
        let data = "Date,Type,Amount,Category,Description\n\
                    2024-03-02,expense,12.50,food & dining,Lunch\n\
                    2024-03-03,income,2000,Others,Salary\n\
                    2024-03-04,expense,-5,food,Refund\n\
                    2024-03-05,expense,7,Pets,Treats\n";
        let parsed = parse_transactions_csv(data.as_bytes(), &default_categories()).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].category_id, "food");
        assert_eq!(parsed[1].kind, TransactionType::Income);
        assert_eq!(parsed[2].category_id, "others");
    }

    #[test]
    fn test_json_transaction_import() {
        let content = r#"{"transactions": [
            {"id": "old", "userId": "someone-else", "type": "expense", "amount": 20,
             "categoryId": "food", "date": "2024-03-01"},
            {"type": "income", "amount": 0, "categoryId": "others", "date": "2024-03-01"}
        ]}"#;
        let parsed = parse_transactions_json(content).unwrap();
        assert_eq!(parsed.len(), 2);

        let store = MemoryStore::new();
        let imported = import_transactions(&store, "u1", parsed).unwrap();
        assert_eq!(imported, 1);
        let stored = store.list_transactions("u1").unwrap();
        assert_eq!(stored[0].user_id, "u1");
        assert_ne!(stored[0].id, "old");
        assert!(store.list_transactions("someone-else").unwrap().is_empty());
    }

    #[test]
    fn test_json_transaction_import_rejects_bad_shape() {
        assert!(matches!(
            parse_transactions_json(r#"{"items": []}"#),
            Err(Error::InvalidData(_))
        ));
    }
}
