//! Price trends
//!
//! For every product with at least two recorded prices, compares the earliest
//! observation with the latest one.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde_json::json;

use crate::history::HistorySnapshot;
use crate::models::PriceHistoryEntry;

use super::language::{display_date, plural, quotable};
use super::types::{Insight, InsightType};
use super::scaled_confidence;

/// Price observations needed for one product
pub const MIN_PURCHASES_FOR_PRICE_TREND: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Higher,
    Lower,
    Unchanged,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::Higher => "higher",
            Direction::Lower => "lower",
            Direction::Unchanged => "unchanged",
        }
    }
}

pub(super) fn analyze(snapshot: &HistorySnapshot) -> Vec<Insight> {
    let items = snapshot.line_items_by_id();

    let mut by_product: BTreeMap<&str, Vec<&PriceHistoryEntry>> = BTreeMap::new();
    for entry in &snapshot.prices {
        by_product
            .entry(entry.product_name.as_str())
            .or_default()
            .push(entry);
    }

    let mut insights = Vec::new();
    for (product, mut observations) in by_product {
        if observations.len() < MIN_PURCHASES_FOR_PRICE_TREND {
            continue;
        }
        observations.sort_by(|a, b| {
            a.observed_date
                .cmp(&b.observed_date)
                .then_with(|| a.id.cmp(&b.id))
        });

        let first = observations[0];
        let last = observations[observations.len() - 1];
        let product_name = items
            .get(&last.source_line_item_id)
            .map(|item| item.product_name.as_str())
            .unwrap_or(product);
        let name = quotable(product_name).unwrap_or("A product you bought");

        let change = last.price - first.price;
        let direction = match change.cmp(&Decimal::ZERO) {
            std::cmp::Ordering::Greater => Direction::Higher,
            std::cmp::Ordering::Less => Direction::Lower,
            std::cmp::Ordering::Equal => Direction::Unchanged,
        };
        let percent = percent_change(first.price, last.price);

        let (title, summary) = match direction {
            Direction::Higher => (
                format!("{} cost more", name),
                format!("an increase of ${}", change.abs()),
            ),
            Direction::Lower => (
                format!("{} cost less", name),
                format!("a decrease of ${}", change.abs()),
            ),
            Direction::Unchanged => (format!("{} held its price", name), "no change".to_string()),
        };
        let summary = match (direction, percent) {
            (Direction::Unchanged, _) | (_, None) => summary,
            (_, Some(p)) => format!("{} ({}%)", summary, p.abs()),
        };
        let description = format!(
            "{} was ${} on {} and ${} on {}, {} across {}.",
            name,
            first.price,
            display_date(first.observed_date),
            last.price,
            display_date(last.observed_date),
            summary,
            plural(observations.len(), "recorded price")
        );

        let history: Vec<_> = observations
            .iter()
            .map(|o| {
                json!({
                    "date": o.observed_date,
                    "price": o.price.to_string(),
                    "store_id": o.store_id,
                })
            })
            .collect();

        insights.push(
            Insight::new(
                InsightType::PriceTrend,
                title,
                description,
                observations.len(),
                scaled_confidence(observations.len(), MIN_PURCHASES_FOR_PRICE_TREND),
            )
            .with_data(json!({
                "product": product,
                "product_name": product_name,
                "direction": direction.as_str(),
                "first_price": first.price.to_string(),
                "last_price": last.price.to_string(),
                "change": change.to_string(),
                "percent_change": percent.map(|p| p.to_string()),
                "observations": history,
            })),
        );
    }

    insights
}

/// Percent change from `first` to `last`, one decimal place; None from zero
fn percent_change(first: Decimal, last: Decimal) -> Option<Decimal> {
    if first.is_zero() {
        return None;
    }
    let pct = (last - first) / first * Decimal::ONE_HUNDRED;
    Some(pct.round_dp(1))
}
