//! Persistence port
//!
//! Everything Finsight stores goes through a small key-value contract
//! (`get` / `set` / `remove` / atomic `update` and `set_many`) holding JSON
//! documents. Typed operations for transactions, budgets, categories,
//! conversations, settings and profiles are provided on top of it, so a new
//! backend only has to implement the five primitives.
//!
//! Backends:
//! - `sqlite` - `Database`, a pooled SQLite key-value table
//! - `memory` - `MemoryStore`, an in-process map for tests

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{
    default_categories, AiSettings, Budget, Category, Conversation, NewBudget, NewCategory,
    NewTransaction, Transaction, User,
};

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::{Database, DbConn, DbPool};

/// Storage keys
pub mod keys {
    pub const USERS: &str = "users";
    pub const TRANSACTIONS: &str = "transactions";
    pub const CATEGORIES: &str = "categories";
    pub const BUDGETS: &str = "budgets";
    pub const CONVERSATIONS: &str = "aiConversations";

    /// Per-user advisor settings key
    pub fn ai_settings(user_id: &str) -> String {
        format!("aiSettings_{}", user_id)
    }
}

/// Callback applied by [`Store::update`]; receives the current value (if any)
/// and returns the value to write back
pub type UpdateFn<'a> = dyn FnMut(Option<Value>) -> Result<Value> + 'a;

/// Key-value persistence contract
pub trait Store: Send + Sync {
    /// Read a stored document
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write a document, replacing any previous value
    fn set(&self, key: &str, value: &Value) -> Result<()>;

    /// Delete a document; returns whether it existed
    fn remove(&self, key: &str) -> Result<bool>;

    /// Atomic read-modify-write of one key
    fn update(&self, key: &str, f: &mut UpdateFn<'_>) -> Result<()>;

    /// Write several documents at once; either all land or none do
    fn set_many(&self, entries: &[(&str, Value)]) -> Result<()>;

    // ========== Transactions ==========

    /// All transactions owned by `user_id`, in insertion order
    fn list_transactions(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let all: Vec<Transaction> = read_list(self, keys::TRANSACTIONS)?;
        Ok(all.into_iter().filter(|t| t.user_id == user_id).collect())
    }

    fn create_transaction(&self, user_id: &str, new: &NewTransaction) -> Result<Transaction> {
        new.validate()?;
        let now = Utc::now();
        let tx = Transaction {
            id: new_id(),
            user_id: user_id.to_string(),
            kind: new.kind,
            amount: new.amount,
            category_id: new.category_id.clone(),
            description: new.description.clone(),
            date: new.date,
            recurring: new.recurring,
            created_at: now,
            updated_at: now,
        };
        let record = tx.clone();
        modify_list(self, keys::TRANSACTIONS, move |list: &mut Vec<Transaction>| {
            list.push(record.clone());
            Ok(())
        })?;
        tracing::debug!(id = %tx.id, user = user_id, "Transaction created");
        Ok(tx)
    }

    /// Replace the editable fields of a transaction
    fn update_transaction(
        &self,
        user_id: &str,
        id: &str,
        changes: &NewTransaction,
    ) -> Result<Transaction> {
        changes.validate()?;
        let mut updated = None;
        modify_list(self, keys::TRANSACTIONS, |list: &mut Vec<Transaction>| {
            let tx = list
                .iter_mut()
                .find(|t| t.id == id && t.user_id == user_id)
                .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))?;
            tx.kind = changes.kind;
            tx.amount = changes.amount;
            tx.category_id = changes.category_id.clone();
            tx.description = changes.description.clone();
            tx.date = changes.date;
            tx.recurring = changes.recurring;
            tx.updated_at = Utc::now();
            updated = Some(tx.clone());
            Ok(())
        })?;
        updated.ok_or_else(|| Error::NotFound(format!("transaction {}", id)))
    }

    fn delete_transaction(&self, user_id: &str, id: &str) -> Result<()> {
        modify_list(self, keys::TRANSACTIONS, |list: &mut Vec<Transaction>| {
            let before = list.len();
            list.retain(|t| !(t.id == id && t.user_id == user_id));
            if list.len() == before {
                return Err(Error::NotFound(format!("transaction {}", id)));
            }
            Ok(())
        })
    }

    /// Append already-formed transactions for `user_id`, assigning fresh ids
    fn import_transactions(&self, user_id: &str, incoming: Vec<Transaction>) -> Result<usize> {
        let now = Utc::now();
        let mut records = Vec::with_capacity(incoming.len());
        for mut tx in incoming {
            if !tx.amount.is_finite() || tx.amount <= 0.0 {
                tracing::warn!(id = %tx.id, amount = tx.amount, "Skipping transaction with invalid amount");
                continue;
            }
            tx.id = new_id();
            tx.user_id = user_id.to_string();
            tx.updated_at = now;
            records.push(tx);
        }
        let count = records.len();
        modify_list(self, keys::TRANSACTIONS, |list: &mut Vec<Transaction>| {
            list.extend(records.iter().cloned());
            Ok(())
        })?;
        tracing::info!(user = user_id, count, "Imported transactions");
        Ok(count)
    }

    // ========== Budgets ==========

    fn list_budgets(&self, user_id: &str) -> Result<Vec<Budget>> {
        let all: Vec<Budget> = read_list(self, keys::BUDGETS)?;
        Ok(all.into_iter().filter(|b| b.user_id == user_id).collect())
    }

    /// Create or update the budget for a category (one per user and category)
    fn set_budget(&self, user_id: &str, new: &NewBudget) -> Result<Budget> {
        new.validate()?;
        let mut saved = None;
        modify_list(self, keys::BUDGETS, |list: &mut Vec<Budget>| {
            let now = Utc::now();
            if let Some(existing) = list
                .iter_mut()
                .find(|b| b.user_id == user_id && b.category_id == new.category_id)
            {
                existing.amount = new.amount;
                existing.period = new.period;
                existing.updated_at = now;
                saved = Some(existing.clone());
            } else {
                let budget = Budget {
                    id: new_id(),
                    user_id: user_id.to_string(),
                    category_id: new.category_id.clone(),
                    amount: new.amount,
                    period: new.period,
                    created_at: now,
                    updated_at: now,
                };
                list.push(budget.clone());
                saved = Some(budget);
            }
            Ok(())
        })?;
        saved.ok_or_else(|| Error::InvalidData("budget was not saved".into()))
    }

    fn delete_budget(&self, user_id: &str, id: &str) -> Result<()> {
        modify_list(self, keys::BUDGETS, |list: &mut Vec<Budget>| {
            let before = list.len();
            list.retain(|b| !(b.id == id && b.user_id == user_id));
            if list.len() == before {
                return Err(Error::NotFound(format!("budget {}", id)));
            }
            Ok(())
        })
    }

    // ========== Categories ==========

    /// The category catalog; the default set until something is written
    fn list_categories(&self) -> Result<Vec<Category>> {
        match self.get(keys::CATEGORIES)? {
            Some(value) if !value.is_null() => Ok(serde_json::from_value(value)?),
            _ => Ok(default_categories()),
        }
    }

    fn create_category(&self, new: &NewCategory) -> Result<Category> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("Category name is required".into()));
        }
        let category = Category {
            id: new_id(),
            name: name.to_string(),
            icon: new.icon.clone().unwrap_or_else(|| "fas fa-tag".to_string()),
            color: new.color.clone().unwrap_or_else(|| "#6b7280".to_string()),
            created_at: Some(Utc::now()),
        };
        modify_categories(self, |categories| {
            if categories.iter().any(|c| c.name.eq_ignore_ascii_case(name)) {
                return Err(Error::InvalidInput(format!("Category '{}' already exists", name)));
            }
            categories.push(category.clone());
            Ok(())
        })?;
        Ok(category)
    }

    fn update_category(&self, id: &str, changes: &NewCategory) -> Result<Category> {
        let mut updated = None;
        modify_categories(self, |categories| {
            let category = categories
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| Error::NotFound(format!("category {}", id)))?;
            if category.is_default() {
                return Err(Error::InvalidInput(format!(
                    "Default category '{}' cannot be edited",
                    category.name
                )));
            }
            let name = changes.name.trim();
            if !name.is_empty() {
                category.name = name.to_string();
            }
            if let Some(icon) = &changes.icon {
                category.icon = icon.clone();
            }
            if let Some(color) = &changes.color {
                category.color = color.clone();
            }
            updated = Some(category.clone());
            Ok(())
        })?;
        updated.ok_or_else(|| Error::NotFound(format!("category {}", id)))
    }

    /// Remove a user-defined category; transactions keep their dangling
    /// reference and aggregate under "Others"
    fn delete_category(&self, id: &str) -> Result<()> {
        modify_categories(self, |categories| {
            let category = categories
                .iter()
                .find(|c| c.id == id)
                .ok_or_else(|| Error::NotFound(format!("category {}", id)))?;
            if category.is_default() {
                return Err(Error::InvalidInput(format!(
                    "Default category '{}' cannot be deleted",
                    category.name
                )));
            }
            categories.retain(|c| c.id != id);
            Ok(())
        })
    }

    // ========== Conversations ==========

    fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>> {
        let all: Vec<Conversation> = read_list(self, keys::CONVERSATIONS)?;
        Ok(all.into_iter().filter(|c| c.user_id == user_id).collect())
    }

    fn append_conversation(
        &self,
        user_id: &str,
        user_message: &str,
        ai_response: &str,
    ) -> Result<Conversation> {
        let conversation = Conversation {
            id: new_id(),
            user_id: user_id.to_string(),
            user_message: user_message.to_string(),
            ai_response: ai_response.to_string(),
            timestamp: Utc::now(),
        };
        let record = conversation.clone();
        modify_list(self, keys::CONVERSATIONS, move |list: &mut Vec<Conversation>| {
            list.push(record.clone());
            Ok(())
        })?;
        Ok(conversation)
    }

    /// Drop every conversation for `user_id`; returns how many were removed
    fn clear_conversations(&self, user_id: &str) -> Result<usize> {
        let mut removed = 0;
        modify_list(self, keys::CONVERSATIONS, |list: &mut Vec<Conversation>| {
            let before = list.len();
            list.retain(|c| c.user_id != user_id);
            removed = before - list.len();
            Ok(())
        })?;
        Ok(removed)
    }

    // ========== Settings & profiles ==========

    fn ai_settings(&self, user_id: &str) -> Result<AiSettings> {
        match self.get(&keys::ai_settings(user_id))? {
            Some(value) if !value.is_null() => Ok(serde_json::from_value(value)?),
            _ => Ok(AiSettings::default()),
        }
    }

    fn save_ai_settings(&self, user_id: &str, settings: &AiSettings) -> Result<()> {
        settings.validate()?;
        self.set(&keys::ai_settings(user_id), &serde_json::to_value(settings)?)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        read_list(self, keys::USERS)
    }

    fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.list_users()?.into_iter().find(|u| u.id == user_id))
    }

    /// Insert or replace a user profile
    fn save_user(&self, user: &User) -> Result<()> {
        modify_list(self, keys::USERS, |list: &mut Vec<User>| {
            match list.iter_mut().find(|u| u.id == user.id) {
                Some(existing) => *existing = user.clone(),
                None => list.push(user.clone()),
            }
            Ok(())
        })
    }
}

/// Fresh record id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Read a JSON array stored under `key`; missing or null means empty
fn read_list<S, T>(store: &S, key: &str) -> Result<Vec<T>>
where
    S: Store + ?Sized,
    T: DeserializeOwned,
{
    match store.get(key)? {
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(value) => Ok(serde_json::from_value(value)?),
    }
}

/// Like [`modify_list`] for the category catalog, which starts out as the
/// default set rather than empty
fn modify_categories<S, F>(store: &S, mut f: F) -> Result<()>
where
    S: Store + ?Sized,
    F: FnMut(&mut Vec<Category>) -> Result<()>,
{
    store.update(keys::CATEGORIES, &mut |current| {
        let mut categories: Vec<Category> = match current {
            Some(Value::Null) | None => default_categories(),
            Some(value) => serde_json::from_value(value)?,
        };
        f(&mut categories)?;
        Ok(serde_json::to_value(&categories)?)
    })
}

/// Atomically load, modify and write back a JSON array
fn modify_list<S, T, F>(store: &S, key: &str, mut f: F) -> Result<()>
where
    S: Store + ?Sized,
    T: DeserializeOwned + Serialize,
    F: FnMut(&mut Vec<T>) -> Result<()>,
{
    store.update(key, &mut |current| {
        let mut list: Vec<T> = match current {
            Some(Value::Null) | None => Vec::new(),
            Some(value) => serde_json::from_value(value)?,
        };
        f(&mut list)?;
        Ok(serde_json::to_value(&list)?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetPeriod, Recurrence, TransactionType};
    use chrono::NaiveDate;

    fn expense(amount: f64, category: &str) -> NewTransaction {
        NewTransaction {
            kind: TransactionType::Expense,
            amount,
            category_id: category.to_string(),
            description: "test".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            recurring: Recurrence::None,
        }
    }

    #[test]
    fn test_transactions_are_scoped_per_user() {
        let store = MemoryStore::new();
        store.create_transaction("alice", &expense(10.0, "food")).unwrap();
        store.create_transaction("bob", &expense(20.0, "food")).unwrap();

        let alice = store.list_transactions("alice").unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].amount, 10.0);
        assert_eq!(alice[0].user_id, "alice");
    }

    #[test]
    fn test_create_rejects_invalid_transaction() {
        let store = MemoryStore::new();
        let result = store.create_transaction("alice", &expense(-5.0, "food"));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(store.list_transactions("alice").unwrap().is_empty());
    }

    #[test]
    fn test_update_and_delete_transaction() {
        let store = MemoryStore::new();
        let tx = store.create_transaction("alice", &expense(10.0, "food")).unwrap();

        let updated = store
            .update_transaction("alice", &tx.id, &expense(15.0, "transport"))
            .unwrap();
        assert_eq!(updated.amount, 15.0);
        assert_eq!(updated.category_id, "transport");
        assert_eq!(updated.created_at, tx.created_at);

        // Another user cannot touch it
        assert!(matches!(
            store.delete_transaction("bob", &tx.id),
            Err(Error::NotFound(_))
        ));

        store.delete_transaction("alice", &tx.id).unwrap();
        assert!(store.list_transactions("alice").unwrap().is_empty());
    }

    #[test]
    fn test_set_budget_upserts_by_category() {
        let store = MemoryStore::new();
        let first = store
            .set_budget(
                "alice",
                &NewBudget {
                    category_id: "food".into(),
                    amount: 200.0,
                    period: BudgetPeriod::Monthly,
                },
            )
            .unwrap();
        let second = store
            .set_budget(
                "alice",
                &NewBudget {
                    category_id: "food".into(),
                    amount: 300.0,
                    period: BudgetPeriod::Weekly,
                },
            )
            .unwrap();

        assert_eq!(first.id, second.id);
        let budgets = store.list_budgets("alice").unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].amount, 300.0);
        assert_eq!(budgets[0].period, BudgetPeriod::Weekly);
    }

    #[test]
    fn test_categories_seeded_and_defaults_protected() {
        let store = MemoryStore::new();
        assert_eq!(store.list_categories().unwrap().len(), 10);

        let custom = store
            .create_category(&NewCategory {
                name: "Pets".into(),
                icon: None,
                color: Some("#123456".into()),
            })
            .unwrap();
        assert_eq!(store.list_categories().unwrap().len(), 11);

        assert!(matches!(
            store.delete_category("food"),
            Err(Error::InvalidInput(_))
        ));
        assert!(store
            .create_category(&NewCategory {
                name: "pets".into(),
                icon: None,
                color: None,
            })
            .is_err());

        store.delete_category(&custom.id).unwrap();
        assert_eq!(store.list_categories().unwrap().len(), 10);
    }

    #[test]
    fn test_concurrent_category_writes_are_not_lost() {
        use std::sync::{Arc, Barrier};

        let store = Arc::new(Database::in_memory().unwrap());
        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = ["Pets", "Garden"]
            .into_iter()
            .map(|name| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    for i in 0..10 {
                        store
                            .create_category(&NewCategory {
                                name: format!("{} {}", name, i),
                                icon: None,
                                color: None,
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let categories = store.list_categories().unwrap();
        assert_eq!(categories.len(), 30);
        assert!(categories.iter().any(|c| c.name == "Pets 9"));
        assert!(categories.iter().any(|c| c.name == "Garden 9"));
    }

    #[test]
    fn test_category_update_keeps_defaults() {
        let store = MemoryStore::new();
        let custom = store
            .create_category(&NewCategory {
                name: "Pets".into(),
                icon: None,
                color: None,
            })
            .unwrap();
        let renamed = store
            .update_category(
                &custom.id,
                &NewCategory {
                    name: "Pet care".into(),
                    icon: Some("fas fa-paw".into()),
                    color: None,
                },
            )
            .unwrap();
        assert_eq!(renamed.name, "Pet care");
        assert_eq!(renamed.color, "#6b7280");

        assert!(matches!(
            store.update_category("food", &NewCategory {
                name: "Snacks".into(),
                icon: None,
                color: None,
            }),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            store.update_category("missing", &NewCategory {
                name: "x".into(),
                icon: None,
                color: None,
            }),
            Err(Error::NotFound(_))
        ));

        let categories = store.list_categories().unwrap();
        assert_eq!(categories.len(), 11);
        assert_eq!(categories.iter().find(|c| c.id == "food").unwrap().name, "Food & Dining");
    }

    #[test]
    fn test_conversations_append_and_clear() {
        let store = MemoryStore::new();
        store.append_conversation("alice", "hi", "hello").unwrap();
        store.append_conversation("alice", "budget?", "set one").unwrap();
        store.append_conversation("bob", "hi", "hello").unwrap();

        let history = store.list_conversations("alice").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].user_message, "budget?");

        assert_eq!(store.clear_conversations("alice").unwrap(), 2);
        assert!(store.list_conversations("alice").unwrap().is_empty());
        assert_eq!(store.list_conversations("bob").unwrap().len(), 1);
    }

    #[test]
    fn test_ai_settings_default_and_save() {
        let store = MemoryStore::new();
        assert_eq!(store.ai_settings("alice").unwrap(), AiSettings::default());

        let settings = AiSettings {
            risk_tolerance: 9,
            ..AiSettings::default()
        };
        store.save_ai_settings("alice", &settings).unwrap();
        assert_eq!(store.ai_settings("alice").unwrap().risk_tolerance, 9);
        assert_eq!(store.ai_settings("bob").unwrap().risk_tolerance, 5);
    }

    #[test]
    fn test_import_transactions_reassigns_ids_and_owner() {
        let store = MemoryStore::new();
        let original = store.create_transaction("alice", &expense(10.0, "food")).unwrap();

        let imported = store
            .import_transactions("bob", vec![original.clone()])
            .unwrap();
        assert_eq!(imported, 1);

        let bob = store.list_transactions("bob").unwrap();
        assert_eq!(bob.len(), 1);
        assert_ne!(bob[0].id, original.id);
        assert_eq!(bob[0].amount, original.amount);
    }

    #[test]
    fn test_save_user_replaces_existing() {
        let store = MemoryStore::new();
        let mut user = User {
            id: "alice".into(),
            full_name: "Alice".into(),
            email: "alice@example.com".into(),
        };
        store.save_user(&user).unwrap();
        user.full_name = "Alice Smith".into();
        store.save_user(&user).unwrap();

        assert_eq!(store.list_users().unwrap().len(), 1);
        assert_eq!(
            store.get_user("alice").unwrap().unwrap().full_name,
            "Alice Smith"
        );
    }
}
