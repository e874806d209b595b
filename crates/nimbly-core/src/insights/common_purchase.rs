//! Common purchases
//!
//! Counts how often each normalized product appears across the user's usable
//! receipts.

use std::collections::{HashMap, HashSet};

use serde_json::json;

use crate::history::HistorySnapshot;

use super::language::{plural, quotable};
use super::types::{Insight, InsightType};
use super::scaled_confidence;

/// Occurrences needed before a product is reported
pub const MIN_PURCHASES_FOR_COMMON: usize = 3;

/// Most products reported in one request
pub const MAX_COMMON_PURCHASES: usize = 10;

struct Tally<'a> {
    name: &'a str,
    occurrences: usize,
    receipts: HashSet<i64>,
}

pub(super) fn analyze(snapshot: &HistorySnapshot) -> Vec<Insight> {
    let mut tallies: HashMap<&str, Tally> = HashMap::new();
    for item in &snapshot.line_items {
        if item.normalized_product_name.is_empty() {
            continue;
        }
        let tally = tallies
            .entry(item.normalized_product_name.as_str())
            .or_insert_with(|| Tally {
                name: item.product_name.as_str(),
                occurrences: 0,
                receipts: HashSet::new(),
            });
        tally.occurrences += 1;
        tally.receipts.insert(item.receipt_id);
    }

    let mut frequent: Vec<(&str, Tally)> = tallies
        .into_iter()
        .filter(|(_, t)| t.occurrences >= MIN_PURCHASES_FOR_COMMON)
        .collect();
    frequent.sort_by(|a, b| b.1.occurrences.cmp(&a.1.occurrences).then_with(|| a.0.cmp(b.0)));
    frequent.truncate(MAX_COMMON_PURCHASES);

    frequent
        .into_iter()
        .map(|(product, tally)| {
            let title = match quotable(tally.name) {
                Some(name) => format!("Frequently bought: {}", name),
                None => "Frequently bought item".to_string(),
            };
            Insight::new(
                InsightType::CommonPurchase,
                title,
                format!(
                    "You bought {} {} across {}.",
                    quotable(tally.name).unwrap_or("one item"),
                    plural(tally.occurrences, "time"),
                    plural(tally.receipts.len(), "receipt")
                ),
                tally.occurrences,
                scaled_confidence(tally.occurrences, MIN_PURCHASES_FOR_COMMON),
            )
            .with_data(json!({
                "product": product,
                "product_name": tally.name,
                "occurrences": tally.occurrences,
                "receipts": tally.receipts.len(),
            }))
        })
        .collect()
}
