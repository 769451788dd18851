//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `open_advisor` - Database + config + optional LLM client
//! - `cmd_init` - Initialize the database

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use finsight_core::{config::default_config_path, AIClient, Advisor, AdvisorConfig, Database, Store};

pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .with_context(|| format!("Database path is not valid UTF-8: {}", db_path.display()))?;
    Database::new(path_str).context("Failed to open database")
}

pub fn load_config(config_path: Option<&Path>) -> Result<AdvisorConfig> {
    AdvisorConfig::load(config_path).context("Failed to load advisor config")
}

/// Build the advisor, enabling the LLM when an API key is set
pub fn open_advisor(db_path: &Path, config_path: Option<&Path>) -> Result<Advisor> {
    let db = open_db(db_path)?;
    let config = load_config(config_path)?;
    let ai = AIClient::from_env(&config.llm);
    tracing::debug!("Opened {} (llm: {})", db_path.display(), ai.is_some());
    Ok(Advisor::new(Arc::new(db), ai, config))
}

pub fn cmd_init(db_path: &Path, config_path: Option<&Path>) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;
    let categories = db.list_categories().context("Failed to read categories")?;
    println!("   {} categories available", categories.len());

    let config = load_config(config_path)?;
    match config_path {
        Some(path) => println!("   Config: {}", path.display()),
        None => match default_config_path() {
            Some(path) if path.exists() => println!("   Config: {}", path.display()),
            _ => println!("   Config: built-in defaults"),
        },
    }
    println!(
        "   Budget alerts at {:.0}% / {:.0}%, savings target {:.0}%",
        config.thresholds.budget_near_limit,
        config.thresholds.budget_over_limit,
        config.thresholds.target_savings_rate
    );

    if AIClient::from_env(&config.llm).is_some() {
        println!("   🤖 LLM advisor: {} ({})", config.llm.model, config.llm.base_url);
    } else {
        println!("   💡 Tip: Set FINSIGHT_LLM_API_KEY to enable LLM answers in chat");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Record income: finsight transactions add --type income --amount 4000");
    println!("  2. Set a budget: finsight budgets set food 500");
    println!("  3. Start web API: finsight serve");

    Ok(())
}
