//! Dry-run parsing of receipt text

use std::path::Path;

use anyhow::Result;
use nimbly_core::{NimblyConfig, ParseStatus, ParsedReceipt, ReceiptParser};

use super::{read_receipt_text, truncate};

/// Parse a receipt file and print what was extracted
pub fn cmd_parse(config: &NimblyConfig, file: &Path, json: bool) -> Result<()> {
    let text = read_receipt_text(file)?;
    let parsed = ReceiptParser::new(config).parse(&text);

    if json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
    } else {
        print_parsed(&parsed);
    }

    Ok(())
}

pub(crate) fn status_label(status: ParseStatus) -> &'static str {
    match status {
        ParseStatus::Pending => "⏳ Pending",
        ParseStatus::Success => "✓ Success",
        ParseStatus::NeedsReview => "⚠️  Needs review",
        ParseStatus::Failed => "✗ Failed",
    }
}

fn print_parsed(parsed: &ParsedReceipt) {
    let assessment = &parsed.assessment;

    println!(
        "\n{} (confidence {:.0}%)",
        status_label(assessment.status),
        assessment.details.overall_confidence * 100.0
    );
    println!("{}", "─".repeat(60));

    println!(
        "  Store: {}",
        parsed.store.name.as_deref().unwrap_or("Unknown")
    );
    println!(
        "  Date:  {}",
        parsed
            .date
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    );
    println!(
        "  Total: {}",
        parsed
            .total
            .amount
            .map(|t| format!("${}", t))
            .unwrap_or_else(|| "N/A".to_string())
    );
    if let Some(tax) = parsed.tax {
        println!("  Tax:   ${}", tax);
    }

    let metadata = &parsed.line_items.metadata;
    println!(
        "\n  Items ({} of {} candidate lines):",
        metadata.matched_lines, metadata.processed_lines
    );
    for item in &parsed.line_items.items {
        let quantity = item
            .quantity
            .map(|q| format!(" x{}", q))
            .unwrap_or_default();
        println!(
            "    {:>2}. {:<32} ${:>8}{}",
            item.line_number,
            truncate(&item.product_name, 32),
            item.price,
            quantity
        );
    }

    if let Some(error) = &assessment.error {
        println!("\n  Error: {}", error);
    }
    if !assessment.details.issues.is_empty() {
        println!("\n  Issues:");
        for issue in &assessment.details.issues {
            println!("    - {}", issue);
        }
    }

    println!();
}
