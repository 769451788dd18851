//! SQLite-backed store with connection pooling

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, TransactionBehavior};
use serde_json::Value;
use tracing::info;

use super::{Store, UpdateFn};
use crate::error::Result;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Open (or create) the database at `path` and run migrations
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
            Ok(())
        });
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;
        info!(path, "Database ready");
        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a temporary file rather than `:memory:` so every pooled
    /// connection sees the same data.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "finsight_test_{}_{}.db",
            std::process::id(),
            id
        ));

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new(&path.to_string_lossy())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// List every stored key (for diagnostics)
    pub fn keys(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT key FROM kv_store ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            -- Every document lives in one key-value table as JSON text
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )?;

        Ok(())
    }
}

fn read_value(conn: &rusqlite::Connection, key: &str) -> Result<Option<Value>> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;
    match raw {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

fn write_value(conn: &rusqlite::Connection, key: &str, value: &Value) -> Result<()> {
    let text = serde_json::to_string(value)?;
    conn.execute(
        r#"
        INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
        rusqlite::params![key, text],
    )?;
    Ok(())
}

impl Store for Database {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let conn = self.conn()?;
        read_value(&conn, key)
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        let conn = self.conn()?;
        write_value(&conn, key, value)
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
        Ok(deleted > 0)
    }

    fn update(&self, key: &str, f: &mut UpdateFn<'_>) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = read_value(&tx, key)?;
        let next = f(current)?;
        write_value(&tx, key, &next)?;
        tx.commit()?;
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, Value)]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for (key, value) in entries {
            write_value(&tx, key, value)?;
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_set_remove() {
        let db = Database::in_memory().unwrap();
        assert!(db.get("missing").unwrap().is_none());

        db.set("settings", &json!({"theme": "dark"})).unwrap();
        assert_eq!(db.get("settings").unwrap(), Some(json!({"theme": "dark"})));

        db.set("settings", &json!({"theme": "light"})).unwrap();
        assert_eq!(db.get("settings").unwrap(), Some(json!({"theme": "light"})));

        assert!(db.remove("settings").unwrap());
        assert!(!db.remove("settings").unwrap());
        assert!(db.get("settings").unwrap().is_none());
    }

    #[test]
    fn test_update_error_rolls_back() {
        let db = Database::in_memory().unwrap();
        db.set("counter", &json!(1)).unwrap();

        let result = db.update("counter", &mut |_| {
            Err(crate::Error::InvalidData("nope".into()))
        });
        assert!(result.is_err());
        assert_eq!(db.get("counter").unwrap(), Some(json!(1)));
    }

    #[test]
    fn test_set_many_writes_every_key() {
        let db = Database::in_memory().unwrap();
        db.set("budgets", &json!([1])).unwrap();

        db.set_many(&[("budgets", json!([])), ("users", json!([{"id": "a"}]))])
            .unwrap();
        assert_eq!(db.get("budgets").unwrap(), Some(json!([])));
        assert_eq!(db.get("users").unwrap(), Some(json!([{"id": "a"}])));
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finsight.db");
        let path = path.to_string_lossy();

        {
            let db = Database::new(&path).unwrap();
            db.set("transactions", &json!([])).unwrap();
        }

        let db = Database::new(&path).unwrap();
        assert_eq!(db.keys().unwrap(), vec!["transactions".to_string()]);
    }
}
