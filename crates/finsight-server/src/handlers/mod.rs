//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod advice;
pub mod budgets;
pub mod categories;
pub mod chat;
pub mod data;
pub mod settings;
pub mod transactions;

// Re-export all handlers for use in router
pub use advice::*;
pub use budgets::*;
pub use categories::*;
pub use chat::*;
pub use data::*;
pub use settings::*;
pub use transactions::*;
