//! Receipt ingestion and listing commands

use std::path::Path;

use anyhow::Result;
use nimbly_core::db::Database;
use nimbly_core::{content_hash, NimblyConfig, Receipt, ReceiptParser};
use tracing::info;

use super::parse::status_label;
use super::read_receipt_text;

/// Parse a receipt file and store it for a user
///
/// Returns the stored receipt, or `None` when identical text was already
/// uploaded by this user and `force` is not set.
pub fn cmd_ingest(
    db: &Database,
    config: &NimblyConfig,
    file: &Path,
    user_id: i64,
    force: bool,
) -> Result<Option<Receipt>> {
    let text = read_receipt_text(file)?;

    if !force {
        let hash = content_hash(&text);
        if let Some(existing) = db.find_receipts_by_hash(user_id, &hash)?.first() {
            println!("Receipt already uploaded as #{}", existing.id);
            println!("Use --force to store it again");
            return Ok(None);
        }
    }

    let parser = ReceiptParser::new(config);
    let receipt = db.ingest_receipt_text(user_id, &text, &parser)?;
    info!(
        receipt_id = receipt.id,
        status = %receipt.parse_status,
        "Receipt stored"
    );

    println!(
        "Stored receipt #{}: {}",
        receipt.id,
        status_label(receipt.parse_status)
    );
    if let Some(store) = &receipt.store_name {
        println!("  Store: {}", store);
    }
    if let Some(total) = receipt.total_amount {
        println!("  Total: ${}", total);
    }
    let items = db.get_line_items(receipt.id)?;
    println!("  Items: {}", items.len());
    if let Some(error) = &receipt.parse_error {
        println!("  Error: {}", error);
    }
    for issue in &receipt.parse_issues {
        println!("  - {}", issue);
    }

    Ok(Some(receipt))
}

/// List a user's receipts, most recent upload first
pub fn cmd_receipts_list(db: &Database, user_id: i64, limit: i64, offset: i64) -> Result<()> {
    let receipts = db.list_receipts_for_user(user_id, limit, offset)?;

    if receipts.is_empty() {
        println!("No receipts for user {}", user_id);
        return Ok(());
    }

    let total = db.count_receipts_for_user(user_id)?;
    println!(
        "\nReceipts for user {} (showing {} of {})",
        user_id,
        receipts.len(),
        total
    );
    println!("{}", "─".repeat(70));

    for receipt in &receipts {
        let store = receipt.store_name.as_deref().unwrap_or("Unknown");
        let amount = receipt
            .total_amount
            .map(|t| format!("${}", t))
            .unwrap_or_else(|| "N/A".to_string());
        let date = receipt
            .purchase_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        println!(
            "  #{:<5} {} - {} ({}) {}",
            receipt.id,
            store,
            amount,
            date,
            status_label(receipt.parse_status)
        );
    }

    println!();
    Ok(())
}
