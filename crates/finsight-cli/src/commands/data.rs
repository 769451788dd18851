//! Import/export command implementations
//!
//! Full JSON backups of the store, plus per-user transaction files.

use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use finsight_core::{
    export::{
        export_all, import_all, import_transactions, parse_transactions_csv,
        parse_transactions_json, transactions_to_csv,
    },
    DataExport, ImportStats, Store,
};

pub fn cmd_export(store: &dyn Store, out: &Path) -> Result<()> {
    let data = export_all(store)?;
    let json = serde_json::to_string_pretty(&data)?;
    std::fs::write(out, json).with_context(|| format!("Failed to write {}", out.display()))?;

    println!("✅ Exported backup to {}", out.display());
    println!(
        "   {} transactions, {} budgets, {} conversations",
        data.transactions.len(),
        data.budgets.len(),
        data.conversations.len()
    );
    Ok(())
}

pub fn cmd_import(store: &dyn Store, file: &Path) -> Result<ImportStats> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let data: DataExport = serde_json::from_str(&content).context("Invalid backup file")?;

    println!("📥 Importing backup from {}...", file.display());
    let stats = import_all(store, &data)?;
    println!("✅ Import complete!");
    println!("   Users:         {}", stats.users);
    println!("   Transactions:  {}", stats.transactions);
    println!("   Budgets:       {}", stats.budgets);
    println!("   Categories:    {}", stats.categories);
    println!("   Conversations: {}", stats.conversations);
    if stats.skipped > 0 {
        println!("   ⚠️  Skipped {} invalid record(s)", stats.skipped);
    }
    Ok(stats)
}

pub fn cmd_export_transactions(store: &dyn Store, user: &str, out: Option<&Path>) -> Result<()> {
    let transactions = store.list_transactions(user)?;
    let csv = transactions_to_csv(&transactions, &store.list_categories()?)?;

    match out {
        Some(path) => {
            std::fs::write(path, csv)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "✅ Exported {} transactions to {}",
                transactions.len(),
                path.display()
            );
        }
        None => print!("{}", csv),
    }
    Ok(())
}

pub fn cmd_import_transactions(store: &dyn Store, user: &str, file: &Path) -> Result<usize> {
    let extension = file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    let incoming = match extension.as_deref() {
        Some("json") => {
            let content = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            parse_transactions_json(&content)?
        }
        Some("csv") => {
            let reader =
                File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
            parse_transactions_csv(reader, &store.list_categories()?)?
        }
        _ => bail!("Unsupported file type (expected .json or .csv): {}", file.display()),
    };

    let parsed = incoming.len();
    let imported = import_transactions(store, user, incoming)?;
    if imported < parsed {
        tracing::warn!("Skipped {} invalid transaction(s) from {}", parsed - imported, file.display());
    }
    println!("✅ Imported {} of {} transactions", imported, parsed);
    Ok(imported)
}
