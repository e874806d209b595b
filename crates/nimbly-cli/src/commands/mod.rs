//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Init and shared utilities (open_db, read_receipt_text)
//! - `parse` - Dry-run parsing of a receipt file
//! - `receipts` - Receipt ingestion and listing
//! - `insights` - Purchase history insights

pub mod core;
pub mod insights;
pub mod parse;
pub mod receipts;

// Re-export command functions for main.rs
pub use core::*;
pub use insights::*;
pub use parse::*;
pub use receipts::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
