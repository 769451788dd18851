//! Domain models for Finsight

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Maximum length of a single advisor chat message
pub const MAX_CHAT_MESSAGE_LEN: usize = 500;

/// Direction of money flow for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How often a transaction repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl std::str::FromStr for Recurrence {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "" => Ok(Self::None),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(format!("Unknown recurrence: {}", s)),
        }
    }
}

impl std::fmt::Display for Recurrence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded income or expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Always positive; direction comes from `kind`
    pub amount: f64,
    pub category_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub recurring: Recurrence,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    /// Check a stored record (e.g. from a backup) before it is written
    pub fn validate(&self) -> Result<()> {
        validate_amount(self.amount)?;
        validate_id("transaction id", &self.id)?;
        validate_id("user id", &self.user_id)?;
        validate_id("category id", &self.category_id)
    }
}

/// A transaction as entered by the user (before an id is assigned)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub category_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub recurring: Recurrence,
}

impl NewTransaction {
    /// Reject records the engine must never see
    pub fn validate(&self) -> Result<()> {
        validate_amount(self.amount)?;
        if self.category_id.trim().is_empty() {
            return Err(Error::InvalidInput("Category is required".into()));
        }
        Ok(())
    }
}

/// A spending category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Category {
    /// Whether this is one of the seeded system-wide categories
    pub fn is_default(&self) -> bool {
        DEFAULT_CATEGORIES.iter().any(|(id, ..)| *id == self.id)
    }
}

/// Name of the fallback bucket for unknown category references
pub const OTHERS_CATEGORY: &str = "Others";

/// Seed categories: (id, name, icon, color)
pub const DEFAULT_CATEGORIES: &[(&str, &str, &str, &str)] = &[
    ("food", "Food & Dining", "fas fa-utensils", "#ef4444"),
    ("transport", "Transportation", "fas fa-car", "#3b82f6"),
    ("shopping", "Shopping", "fas fa-shopping-cart", "#10b981"),
    ("entertainment", "Entertainment", "fas fa-film", "#f59e0b"),
    ("utilities", "Utilities", "fas fa-lightbulb", "#8b5cf6"),
    ("healthcare", "Healthcare", "fas fa-heartbeat", "#ec4899"),
    ("education", "Education", "fas fa-graduation-cap", "#06b6d4"),
    ("travel", "Travel", "fas fa-plane", "#84cc16"),
    ("subscriptions", "Subscriptions", "fas fa-sync", "#f97316"),
    ("others", OTHERS_CATEGORY, "fas fa-ellipsis-h", "#6b7280"),
];

/// Build the default category catalog
pub fn default_categories() -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(id, name, icon, color)| Category {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
            created_at: None,
        })
        .collect()
}

/// A user-defined category before an id is assigned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Period a budget limit applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl std::str::FromStr for BudgetPeriod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(format!("Unknown budget period: {}", s)),
        }
    }
}

impl std::fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A standing spending limit for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    pub amount: f64,
    #[serde(default)]
    pub period: BudgetPeriod,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Check a stored record (e.g. from a backup) before it is written
    pub fn validate(&self) -> Result<()> {
        validate_amount(self.amount)?;
        validate_id("budget id", &self.id)?;
        validate_id("user id", &self.user_id)?;
        validate_id("category id", &self.category_id)
    }
}

/// Budget input from the user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudget {
    pub category_id: String,
    pub amount: f64,
    #[serde(default)]
    pub period: BudgetPeriod,
}

impl NewBudget {
    pub fn validate(&self) -> Result<()> {
        validate_amount(self.amount)?;
        if self.category_id.trim().is_empty() {
            return Err(Error::InvalidInput("Category is required".into()));
        }
        Ok(())
    }
}

/// One advisor exchange (append-only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub user_id: String,
    pub user_message: String,
    pub ai_response: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// Minimal user profile, used for report headers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
}

/// Areas the advisor should emphasise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusAreas {
    pub budgeting: bool,
    pub investments: bool,
    pub savings: bool,
    pub debt: bool,
}

impl Default for FocusAreas {
    fn default() -> Self {
        Self {
            budgeting: true,
            investments: true,
            savings: true,
            debt: true,
        }
    }
}

/// Per-user advisor preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    #[serde(default = "default_response_style")]
    pub response_style: String,
    #[serde(default)]
    pub focus_areas: FocusAreas,
    /// 1 (conservative) to 10 (aggressive)
    #[serde(default = "default_risk_tolerance")]
    pub risk_tolerance: u8,
}

fn default_response_style() -> String {
    "detailed".to_string()
}

fn default_risk_tolerance() -> u8 {
    5
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            response_style: default_response_style(),
            focus_areas: FocusAreas::default(),
            risk_tolerance: default_risk_tolerance(),
        }
    }
}

impl AiSettings {
    pub fn validate(&self) -> Result<()> {
        if !(1..=10).contains(&self.risk_tolerance) {
            return Err(Error::InvalidInput(format!(
                "Risk tolerance must be between 1 and 10, got {}",
                self.risk_tolerance
            )));
        }
        Ok(())
    }
}

/// Trim a chat message and reject empty or oversized input
pub fn validate_chat_message(message: &str) -> Result<&str> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("Message is empty".into()));
    }
    if trimmed.chars().count() > MAX_CHAT_MESSAGE_LEN {
        return Err(Error::InvalidInput(format!(
            "Message exceeds {} characters",
            MAX_CHAT_MESSAGE_LEN
        )));
    }
    Ok(trimmed)
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "Amount must be a positive number, got {}",
            amount
        )));
    }
    Ok(())
}

/// Non-empty, no surrounding whitespace, no control characters
fn validate_id(what: &str, id: &str) -> Result<()> {
    if id.is_empty() || id.trim() != id || id.chars().any(char::is_control) {
        return Err(Error::InvalidInput(format!("Invalid {}: {:?}", what, id)));
    }
    Ok(())
}

/// Accept either a plain `YYYY-MM-DD` date or a full RFC 3339 timestamp
fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

/// Parse a transaction date string
pub fn parse_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| format!("Invalid date: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_transaction_type_round_trip() {
        assert_eq!(TransactionType::from_str("Income").unwrap(), TransactionType::Income);
        assert_eq!(TransactionType::Expense.as_str(), "expense");
        assert!(TransactionType::from_str("transfer").is_err());
    }

    #[test]
    fn test_transaction_accepts_iso_timestamp_date() {
        let json = r#"{
            "id": "t1",
            "userId": "u1",
            "type": "expense",
            "amount": 12.5,
            "categoryId": "food",
            "date": "2024-03-05T18:30:00.000Z"
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(tx.recurring, Recurrence::None);
        assert!(tx.description.is_empty());
    }

    #[test]
    fn test_transaction_wire_names() {
        let json = r#"{"id":"t1","userId":"u1","type":"income","amount":1.0,
            "categoryId":"others","date":"2024-01-01"}"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["type"], "income");
        assert_eq!(value["categoryId"], "others");
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn test_new_transaction_validation() {
        let mut tx = NewTransaction {
            kind: TransactionType::Expense,
            amount: 10.0,
            category_id: "food".into(),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            recurring: Recurrence::None,
        };
        assert!(tx.validate().is_ok());

        tx.amount = 0.0;
        assert!(matches!(tx.validate(), Err(Error::InvalidInput(_))));

        tx.amount = f64::NAN;
        assert!(tx.validate().is_err());

        tx.amount = 5.0;
        tx.category_id = "  ".into();
        assert!(tx.validate().is_err());
    }

    #[test]
    fn test_stored_record_validation() {
        let json = r#"{"id":"t1","userId":"u1","type":"expense","amount":-500.0,
            "categoryId":"food","date":"2024-01-01"}"#;
        let mut tx: Transaction = serde_json::from_str(json).unwrap();
        assert!(matches!(tx.validate(), Err(Error::InvalidInput(_))));

        tx.amount = 500.0;
        assert!(tx.validate().is_ok());
        tx.user_id = " u1".into();
        assert!(tx.validate().is_err());
        tx.user_id = "u1".into();
        tx.id = "t\n1".into();
        assert!(tx.validate().is_err());

        let mut budget: Budget = serde_json::from_str(
            r#"{"id":"b1","userId":"u1","categoryId":"food","amount":200.0}"#,
        )
        .unwrap();
        assert!(budget.validate().is_ok());
        budget.amount = f64::INFINITY;
        assert!(budget.validate().is_err());
        budget.amount = 200.0;
        budget.category_id = String::new();
        assert!(budget.validate().is_err());
    }

    #[test]
    fn test_default_categories_include_others() {
        let categories = default_categories();
        assert_eq!(categories.len(), 10);
        let others = categories.iter().find(|c| c.id == "others").unwrap();
        assert_eq!(others.name, OTHERS_CATEGORY);
        assert!(others.is_default());
    }

    #[test]
    fn test_chat_message_validation() {
        assert_eq!(validate_chat_message("  hi  ").unwrap(), "hi");
        assert!(validate_chat_message("   ").is_err());
        let long = "a".repeat(MAX_CHAT_MESSAGE_LEN + 1);
        assert!(validate_chat_message(&long).is_err());
    }

    #[test]
    fn test_ai_settings_defaults_fill_missing_fields() {
        let settings: AiSettings = serde_json::from_str(r#"{"riskTolerance": 8}"#).unwrap();
        assert_eq!(settings.risk_tolerance, 8);
        assert_eq!(settings.response_style, "detailed");
        assert!(settings.focus_areas.savings);

        let bad = AiSettings {
            risk_tolerance: 11,
            ..AiSettings::default()
        };
        assert!(bad.validate().is_err());
    }
}
