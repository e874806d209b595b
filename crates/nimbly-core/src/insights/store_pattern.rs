//! Store patterns
//!
//! Distribution of the user's receipts across stores. A single most visited
//! store is named in the title; a tie at the top is described without picking
//! one.

use std::collections::HashMap;

use serde_json::json;

use crate::history::HistorySnapshot;

use super::language::{plural, quotable};
use super::types::{Insight, InsightType};
use super::scaled_confidence;

/// Receipts with a known store needed before the distribution is described
pub const MIN_RECEIPTS_FOR_STORE_PATTERN: usize = 5;

pub(super) fn analyze(snapshot: &HistorySnapshot) -> Vec<Insight> {
    let mut visits: HashMap<i64, (String, usize)> = HashMap::new();
    for receipt in &snapshot.receipts {
        let Some(store_id) = receipt.store_id else {
            continue;
        };
        let entry = visits.entry(store_id).or_insert_with(|| {
            (
                receipt
                    .store_name
                    .clone()
                    .unwrap_or_else(|| format!("Store #{}", store_id)),
                0,
            )
        });
        entry.1 += 1;
    }

    let considered: usize = visits.values().map(|(_, n)| n).sum();
    if considered < MIN_RECEIPTS_FOR_STORE_PATTERN {
        return Vec::new();
    }

    let mut ranked: Vec<(i64, String, usize)> = visits
        .into_iter()
        .map(|(id, (name, n))| (id, name, n))
        .collect();
    ranked.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.1.cmp(&b.1)));

    let (_, top_name, top_count) = &ranked[0];
    let share = share_percent(*top_count, considered);
    let tied = ranked.iter().filter(|(_, _, n)| n == top_count).count();
    let top_label = quotable(top_name);

    let description = if ranked.len() == 1 {
        format!(
            "All {} with a known store came from {}.",
            plural(considered, "receipt"),
            top_label.unwrap_or("one store")
        )
    } else if tied > 1 {
        format!(
            "Your {} came from {}. The {} you visited most each had {}.",
            plural(considered, "receipt"),
            plural(ranked.len(), "store"),
            tied,
            plural(*top_count, "receipt")
        )
    } else {
        format!(
            "{} of your {} came from {} ({}%). You shopped at {} in total.",
            top_count,
            plural(considered, "receipt"),
            top_label.unwrap_or("one store"),
            share,
            plural(ranked.len(), "store")
        )
    };

    let title = match top_label {
        Some(name) if tied == 1 => format!("Most visited store: {}", name),
        _ => "Stores visited".to_string(),
    };

    let distribution: Vec<_> = ranked
        .iter()
        .map(|(id, name, n)| {
            json!({
                "store_id": id,
                "store": name,
                "receipts": n,
                "share_percent": share_percent(*n, considered),
            })
        })
        .collect();

    vec![Insight::new(
        InsightType::StorePattern,
        title,
        description,
        considered,
        scaled_confidence(considered, MIN_RECEIPTS_FOR_STORE_PATTERN),
    )
    .with_data(json!({
        "receipts_considered": considered,
        "store_count": ranked.len(),
        "distribution": distribution,
    }))]
}

fn share_percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 1000.0 / total as f64).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::{find_forbidden_word, generate_store_pattern_insights};
    use crate::test_utils::HistoryBuilder;

    #[test]
    fn test_gate_at_five_receipts() {
        let mut builder = HistoryBuilder::new();
        for day in 1..=4 {
            builder.receipt(1, Some("Safeway"), Some((2026, 1, day)));
        }
        // Storeless receipts do not count toward the gate
        builder.receipt(1, None, Some((2026, 1, 5)));
        assert!(generate_store_pattern_insights(1, &builder).unwrap().is_empty());

        builder.receipt(1, Some("Kroger"), Some((2026, 1, 6)));
        let insights = generate_store_pattern_insights(1, &builder).unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].data_points, 5);
        assert_eq!(insights[0].title, "Most visited store: Safeway");
        assert_eq!(
            insights[0].description,
            "4 of your 5 receipts came from Safeway (80%). You shopped at 2 stores in total."
        );
        assert_eq!(insights[0].underlying_data["distribution"][1]["store"], "Kroger");
    }

    #[test]
    fn test_tied_top_stores_get_neutral_title() {
        let mut builder = HistoryBuilder::new();
        for day in 1..=3 {
            builder.receipt(1, Some("Safeway"), Some((2026, 1, day)));
            builder.receipt(1, Some("Kroger"), Some((2026, 2, day)));
        }

        let insights = generate_store_pattern_insights(1, &builder).unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].title, "Stores visited");
        assert_eq!(
            insights[0].description,
            "Your 6 receipts came from 2 stores. The 2 you visited most each had 3 receipts."
        );
        assert_eq!(insights[0].underlying_data["store_count"], 2);
    }

    #[test]
    fn test_store_name_with_forbidden_word_is_not_quoted() {
        let mut builder = HistoryBuilder::new();
        for day in 1..=4 {
            builder.receipt(1, Some("Will Call Market"), Some((2026, 1, day)));
        }
        builder.receipt(1, Some("Kroger"), Some((2026, 1, 9)));

        let insights = generate_store_pattern_insights(1, &builder).unwrap();
        assert_eq!(insights[0].title, "Stores visited");
        assert_eq!(
            insights[0].description,
            "4 of your 5 receipts came from one store (80%). You shopped at 2 stores in total."
        );
        assert_eq!(find_forbidden_word(&insights[0].title), None);
        assert_eq!(find_forbidden_word(&insights[0].description), None);
        assert_eq!(
            insights[0].underlying_data["distribution"][0]["store"],
            "Will Call Market"
        );
    }

    #[test]
    fn test_single_store() {
        let mut builder = HistoryBuilder::new();
        for day in 1..=5 {
            builder.receipt(1, Some("Trader Joe's"), Some((2026, 1, day)));
        }
        let insights = generate_store_pattern_insights(1, &builder).unwrap();
        assert_eq!(
            insights[0].description,
            "All 5 receipts with a known store came from Trader Joe's."
        );
    }

    #[test]
    fn test_share_percent() {
        assert_eq!(share_percent(1, 3), 33.3);
        assert_eq!(share_percent(2, 3), 66.7);
        assert_eq!(share_percent(0, 0), 0.0);
    }
}
