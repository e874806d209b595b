//! Line item extraction
//!
//! A candidate is any non-summary line ending in an amount. Summary lines
//! are recognized by their opening keyword, so product names that merely
//! contain "total" or "change" still count. A candidate is matched when the
//! text before the amount still contains a product name once quantity
//! expressions are peeled off.

use rust_decimal::Decimal;

use super::amounts::parse_amount;
use super::{
    content_lines, is_summary_line, re, ExtractedLineItem, LineItemExtraction, LineItemMetadata,
    AMOUNT_PATTERN,
};

// Description, then the line amount, then an optional tax flag ("T", "F", "TX")
re!(
    re_priced_line,
    &format!(
        r"^(?P<body>.*?)\s*\$?\s*(?P<amount>{})\s*(?:[A-Za-z]{{1,2}})?\s*$",
        AMOUNT_PATTERN
    )
);
// "Avocados 3 @ 1.99", "Limes 4 x 0.25 ea"
re!(
    re_at_quantity,
    r"(?i)^(?P<name>.*?)\s*(?P<qty>\d+(?:\.\d+)?)\s*(?:@|x)\s*\$?(?P<unit>\d+\.\d{2})(?:\s*(?:/|ea\b|each\b)\s*[a-z]*)?$"
);
// "Organic Bananas 2.5 lb", "Organic Eggs 12 ct"
re!(
    re_unit_quantity,
    r"(?i)^(?P<name>.*?)\s+(?P<qty>\d+(?:\.\d+)?)\s*(?:lbs?|oz|kg|g|ct|ea|pk|pack|gal|l|ml)\.?$"
);
// "2 x Almond Milk"
re!(re_leading_quantity, r"(?i)^(?P<qty>\d+)\s*x\s+(?P<name>.+)$");

pub(super) fn extract_line_items(text: &str) -> LineItemExtraction {
    let mut items = Vec::new();
    let mut metadata = LineItemMetadata::default();

    for line in content_lines(text) {
        if is_summary_line(line) {
            continue;
        }
        let Some(caps) = re_priced_line().captures(line) else {
            continue;
        };
        metadata.processed_lines += 1;

        let Some(price) = caps.name("amount").and_then(|m| parse_amount(m.as_str())) else {
            continue;
        };
        let body = caps.name("body").map_or("", |m| m.as_str());
        let Some((product_name, quantity, unit_price)) = split_description(body) else {
            continue;
        };

        metadata.matched_lines += 1;
        items.push(ExtractedLineItem {
            product_name,
            quantity,
            unit_price,
            price,
            line_number: items.len() as u32 + 1,
        });
    }

    LineItemExtraction { items, metadata }
}

/// Split a description into (name, quantity, unit price); None without a name
fn split_description(body: &str) -> Option<(String, Option<Decimal>, Option<Decimal>)> {
    let body = body.trim();

    let (name, quantity, unit_price) = if let Some(caps) = re_at_quantity().captures(body) {
        (
            caps.name("name").map_or("", |m| m.as_str()),
            caps.name("qty").and_then(|m| parse_amount(m.as_str())),
            caps.name("unit").and_then(|m| parse_amount(m.as_str())),
        )
    } else if let Some(caps) = re_unit_quantity().captures(body) {
        (
            caps.name("name").map_or("", |m| m.as_str()),
            caps.name("qty").and_then(|m| parse_amount(m.as_str())),
            None,
        )
    } else if let Some(caps) = re_leading_quantity().captures(body) {
        (
            caps.name("name").map_or("", |m| m.as_str()),
            caps.name("qty").and_then(|m| parse_amount(m.as_str())),
            None,
        )
    } else {
        (body, None, None)
    };

    let name = clean_name(name);
    if name.chars().filter(|c| c.is_alphabetic()).count() < 2 {
        return None;
    }
    Some((name, quantity, unit_price))
}

fn clean_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| matches!(c, '-' | ':' | '*' | '.' | ',' | '#' | '$'))
        .trim()
        .to_string()
}
