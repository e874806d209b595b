//! Insight engine - runs every detector for one user and orders the results

use tracing::{debug, warn};

use crate::history::{HistoryReader, HistorySnapshot, SnapshotScope};
use crate::Result;

use super::types::{Insight, InsightReport, InsightType};
use super::{common_purchase, price_trend, purchase_frequency, store_pattern};

/// Guidance returned when a user has nothing to report yet
pub const NOT_ENOUGH_DATA_MESSAGE: &str =
    "Upload more receipts to see insights about your shopping history.";

/// Runs the fixed set of detectors
#[derive(Debug, Clone, Default)]
pub struct InsightEngine;

impl InsightEngine {
    pub fn new() -> Self {
        Self
    }

    /// Detectors run by `generate`, in report order
    pub fn insight_types(&self) -> Vec<InsightType> {
        InsightType::ALL.to_vec()
    }

    /// Run one detector against a freshly loaded snapshot
    pub fn run<R: HistoryReader + ?Sized>(
        &self,
        insight_type: InsightType,
        user_id: i64,
        reader: &R,
    ) -> Result<Vec<Insight>> {
        let snapshot = HistorySnapshot::load_scoped(reader, user_id, scope_for(insight_type))?;
        if snapshot.is_empty() {
            return Ok(Vec::new());
        }
        let insights = match insight_type {
            InsightType::PurchaseFrequency => purchase_frequency::analyze(&snapshot),
            InsightType::PriceTrend => price_trend::analyze(&snapshot),
            InsightType::CommonPurchase => common_purchase::analyze(&snapshot),
            InsightType::StorePattern => store_pattern::analyze(&snapshot),
        };
        Ok(insights)
    }

    /// Generate every insight for a user
    ///
    /// A detector that fails is logged and skipped; the others still report.
    /// Only failing to read the user's receipts at all is an error.
    pub fn generate<R: HistoryReader + ?Sized>(
        &self,
        user_id: i64,
        reader: &R,
    ) -> Result<InsightReport> {
        let receipts = HistorySnapshot::load_scoped(reader, user_id, SnapshotScope::Receipts)?;
        if receipts.is_empty() {
            debug!(user_id, "No usable receipts, skipping insight detectors");
            return Ok(not_enough_data());
        }

        let mut insights = Vec::new();
        for insight_type in InsightType::ALL {
            match self.run(insight_type, user_id, reader) {
                Ok(found) => {
                    debug!(
                        insight = insight_type.as_str(),
                        count = found.len(),
                        "Insight detector complete"
                    );
                    insights.extend(found);
                }
                Err(e) => {
                    warn!(
                        insight = insight_type.as_str(),
                        error = %e,
                        "Insight detector failed"
                    );
                }
            }
        }

        if insights.is_empty() {
            return Ok(not_enough_data());
        }

        sort_insights(&mut insights);
        Ok(InsightReport {
            insights,
            message: None,
        })
    }
}

fn scope_for(insight_type: InsightType) -> SnapshotScope {
    match insight_type {
        InsightType::PurchaseFrequency | InsightType::StorePattern => SnapshotScope::Receipts,
        InsightType::CommonPurchase => SnapshotScope::LineItems,
        InsightType::PriceTrend => SnapshotScope::Prices,
    }
}

fn not_enough_data() -> InsightReport {
    InsightReport {
        insights: Vec::new(),
        message: Some(NOT_ENOUGH_DATA_MESSAGE.to_string()),
    }
}

/// Grouped by type, then most data points, then highest confidence
fn sort_insights(insights: &mut [Insight]) {
    insights.sort_by(|a, b| {
        a.insight_type
            .order()
            .cmp(&b.insight_type.order())
            .then_with(|| b.data_points.cmp(&a.data_points))
            .then_with(|| b.confidence.total_cmp(&a.confidence))
    });
}
