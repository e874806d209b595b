//! Purchase frequency
//!
//! Describes how often the user shopped. With at least three dated receipts
//! the gaps between consecutive purchase dates are summarized; otherwise only
//! the receipt count is reported.

use serde_json::json;

use crate::history::HistorySnapshot;

use super::language::{display_date, plural};
use super::types::{Insight, InsightType};
use super::scaled_confidence;

/// Receipts needed before frequency is described
pub const MIN_RECEIPTS_FOR_FREQUENCY: usize = 3;

pub(super) fn analyze(snapshot: &HistorySnapshot) -> Vec<Insight> {
    let total = snapshot.receipts.len();
    if total < MIN_RECEIPTS_FOR_FREQUENCY {
        return Vec::new();
    }

    let mut dates: Vec<_> = snapshot
        .receipts
        .iter()
        .filter_map(|r| r.purchase_date)
        .collect();
    dates.sort();

    if dates.len() < MIN_RECEIPTS_FOR_FREQUENCY {
        let insight = Insight::new(
            InsightType::PurchaseFrequency,
            "Receipts recorded",
            format!(
                "You uploaded {}. Too few had a purchase date to measure the time between visits.",
                plural(total, "receipt")
            ),
            total,
            scaled_confidence(total, MIN_RECEIPTS_FOR_FREQUENCY) * 0.6,
        )
        .with_data(json!({
            "receipt_count": total,
            "dated_receipts": dates.len(),
        }));
        return vec![insight];
    }

    let gaps: Vec<i64> = dates
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days())
        .collect();
    let mut sorted_gaps = gaps.clone();
    sorted_gaps.sort_unstable();
    let median = median_days(&sorted_gaps);
    let average = gaps.iter().sum::<i64>() as f64 / gaps.len() as f64;

    let (first, last) = (dates[0], dates[dates.len() - 1]);
    let description = format!(
        "You made {} between {} and {}. The typical gap between visits was {}.",
        plural(dates.len(), "purchase"),
        display_date(first),
        display_date(last),
        describe_days(median)
    );

    let insight = Insight::new(
        InsightType::PurchaseFrequency,
        "Shopping frequency",
        description,
        dates.len(),
        scaled_confidence(dates.len(), MIN_RECEIPTS_FOR_FREQUENCY),
    )
    .with_data(json!({
        "receipt_count": total,
        "dated_receipts": dates.len(),
        "first_purchase": first,
        "last_purchase": last,
        "intervals_days": gaps,
        "median_interval_days": median,
        "average_interval_days": (average * 10.0).round() / 10.0,
    }));

    vec![insight]
}

fn median_days(sorted: &[i64]) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2] as f64,
        n => (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0,
    }
}

fn describe_days(days: f64) -> String {
    if days < 1.0 {
        "less than a day".to_string()
    } else if days.fract() == 0.0 {
        plural(days as usize, "day")
    } else {
        format!("{:.1} days", days)
    }
}
