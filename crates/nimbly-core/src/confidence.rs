//! Confidence assessment
//!
//! Rolls the per-field extraction results into one `ParseStatus`. The overall
//! confidence is a normalized weighted sum of the store, date and total
//! confidences and the line item extraction rate. Every weight is
//! non-negative (enforced by config validation), so improving any single
//! signal never lowers the overall score.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AssessmentConfig;
use crate::models::ParseStatus;
use crate::parser::{DateExtraction, LineItemExtraction, StoreExtraction, TotalExtraction};

/// Error recorded on receipts that produced nothing usable
pub const UNUSABLE_RECEIPT_ERROR: &str = "no total and no line items found";

/// Breakdown behind a verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentDetails {
    pub overall_confidence: f64,
    /// Weak or absent fields, in store/date/items/total order
    pub issues: Vec<String>,
    pub store_confidence: f64,
    pub date_confidence: f64,
    pub total_confidence: f64,
    /// matched_lines / processed_lines
    pub extraction_rate: f64,
    pub items_found: usize,
    pub has_tax: bool,
}

/// Verdict for one parse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub status: ParseStatus,
    /// Set only when the status is `Failed`
    pub error: Option<String>,
    pub details: AssessmentDetails,
}

#[derive(Debug, Clone, Default)]
pub struct ConfidenceAssessor {
    config: AssessmentConfig,
}

impl ConfidenceAssessor {
    pub fn new(config: AssessmentConfig) -> Self {
        Self { config }
    }

    pub fn assess(
        &self,
        store: &StoreExtraction,
        date: &DateExtraction,
        items: &LineItemExtraction,
        total: &TotalExtraction,
        tax: Option<Decimal>,
    ) -> Assessment {
        let cfg = &self.config;

        // An absent value contributes nothing regardless of the reported score
        let store_conf = signal(store.name.is_some(), store.confidence);
        let date_conf = signal(date.date.is_some(), date.confidence);
        let total_conf = signal(total.amount.is_some(), total.confidence);
        let rate = signal(true, items.metadata.extraction_rate());

        let weight_sum = cfg.store_weight + cfg.date_weight + cfg.total_weight + cfg.line_items_weight;
        let overall = if weight_sum > 0.0 {
            (cfg.store_weight * store_conf
                + cfg.date_weight * date_conf
                + cfg.total_weight * total_conf
                + cfg.line_items_weight * rate)
                / weight_sum
        } else {
            0.0
        };

        let mut issues = Vec::new();
        match store.name {
            None => issues.push("store name not found".to_string()),
            Some(_) if store_conf < cfg.low_field_confidence => issues.push(format!(
                "low confidence store name ({:.2})",
                store_conf
            )),
            Some(_) => {}
        }
        match date.date {
            None => issues.push("purchase date not found".to_string()),
            Some(_) if date_conf < cfg.low_field_confidence => issues.push(format!(
                "low confidence purchase date ({:.2})",
                date_conf
            )),
            Some(_) => {}
        }
        let meta = items.metadata;
        if items.items.is_empty() {
            issues.push("no line items extracted".to_string());
        } else if rate < cfg.low_field_confidence {
            issues.push(format!(
                "low line item extraction rate ({}/{})",
                meta.matched_lines, meta.processed_lines
            ));
        }
        match total.amount {
            None => issues.push("total amount not found".to_string()),
            Some(_) if total_conf < cfg.low_field_confidence => issues.push(format!(
                "low confidence total ({:.2})",
                total_conf
            )),
            Some(_) => {}
        }

        let has_total = total.amount.is_some();
        let has_items = !items.items.is_empty();
        let (status, error) = if !has_total && !has_items {
            (ParseStatus::Failed, Some(UNUSABLE_RECEIPT_ERROR.to_string()))
        } else if !has_total || !has_items || overall < cfg.success_threshold {
            (ParseStatus::NeedsReview, None)
        } else {
            (ParseStatus::Success, None)
        };

        debug!(
            status = status.as_str(),
            overall_confidence = overall,
            issues = issues.len(),
            "Receipt assessed"
        );

        Assessment {
            status,
            error,
            details: AssessmentDetails {
                overall_confidence: overall,
                issues,
                store_confidence: store_conf,
                date_confidence: date_conf,
                total_confidence: total_conf,
                extraction_rate: rate,
                items_found: items.items.len(),
                has_tax: tax.is_some(),
            },
        }
    }
}

fn signal(present: bool, confidence: f64) -> f64 {
    if present && confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Assess with default weights and threshold
pub fn assess_parsing_confidence(
    store: &StoreExtraction,
    date: &DateExtraction,
    items: &LineItemExtraction,
    total: &TotalExtraction,
    tax: Option<Decimal>,
) -> Assessment {
    ConfidenceAssessor::default().assess(store, date, items, total, tax)
}
