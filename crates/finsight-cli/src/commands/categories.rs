//! Category command implementations

use anyhow::{bail, Result};
use finsight_core::{NewCategory, Store};

/// Find a category id by id or case-insensitive name
pub fn resolve_category(store: &dyn Store, id_or_name: &str) -> Result<String> {
    let categories = store.list_categories()?;
    match categories
        .iter()
        .find(|c| c.id == id_or_name || c.name.eq_ignore_ascii_case(id_or_name))
    {
        Some(category) => Ok(category.id.clone()),
        None => bail!(
            "Unknown category '{}'. See 'finsight categories list'.",
            id_or_name
        ),
    }
}

pub fn cmd_categories_list(store: &dyn Store) -> Result<()> {
    let categories = store.list_categories()?;

    println!();
    println!("🏷️  Categories");
    println!("   ─────────────────────────────────────");
    for category in categories {
        let marker = if category.is_default() { "" } else { " (custom)" };
        println!(
            "   {:<16} {:<20} {}{}",
            category.id, category.name, category.color, marker
        );
    }

    Ok(())
}

pub fn cmd_categories_add(
    store: &dyn Store,
    name: &str,
    icon: Option<&str>,
    color: Option<&str>,
) -> Result<()> {
    let category = store.create_category(&NewCategory {
        name: name.to_string(),
        icon: icon.map(str::to_string),
        color: color.map(str::to_string),
    })?;
    println!("✅ Created category '{}' ({})", category.name, category.id);
    Ok(())
}

pub fn cmd_categories_delete(store: &dyn Store, id: &str) -> Result<()> {
    store.delete_category(id)?;
    println!("✅ Deleted category {}", id);
    println!("   Existing transactions now count under \"Others\"");
    Ok(())
}
