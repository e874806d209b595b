//! Insights engine - descriptive statements about past purchases
//!
//! Every request recomputes from the user's history; nothing is cached. Each
//! detector has a binary minimum-data gate: below it the detector returns no
//! insights at all.
//!
//! ## Insight Types
//!
//! - **Purchase Frequency** - time between shopping trips
//! - **Price Trend** - earliest vs latest price of a product
//! - **Common Purchase** - products bought repeatedly
//! - **Store Pattern** - where receipts came from
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nimbly_core::insights::InsightEngine;
//!
//! let report = InsightEngine::new().generate(user_id, &db)?;
//! for insight in &report.insights {
//!     println!("{}: {}", insight.title, insight.description);
//! }
//! ```

pub mod common_purchase;
pub mod engine;
pub mod language;
pub mod price_trend;
pub mod purchase_frequency;
pub mod store_pattern;
pub mod types;

pub use common_purchase::{MAX_COMMON_PURCHASES, MIN_PURCHASES_FOR_COMMON};
pub use engine::{InsightEngine, NOT_ENOUGH_DATA_MESSAGE};
pub use language::{find_forbidden_word, FORBIDDEN_WORDS};
pub use price_trend::MIN_PURCHASES_FOR_PRICE_TREND;
pub use purchase_frequency::MIN_RECEIPTS_FOR_FREQUENCY;
pub use store_pattern::MIN_RECEIPTS_FOR_STORE_PATTERN;
pub use types::{Insight, InsightReport, InsightType};

use crate::history::HistoryReader;
use crate::Result;

/// Confidence for `n` observations against a gate: 0.6 at the gate, +0.05 per
/// extra observation, capped at 0.95
pub(crate) fn scaled_confidence(n: usize, gate: usize) -> f64 {
    let extra = n.saturating_sub(gate) as f64;
    (0.6 + 0.05 * extra).min(0.95)
}

/// Purchase frequency insights for one user
pub fn generate_purchase_frequency_insights<R: HistoryReader + ?Sized>(
    user_id: i64,
    reader: &R,
) -> Result<Vec<Insight>> {
    InsightEngine::new().run(InsightType::PurchaseFrequency, user_id, reader)
}

/// Price trend insights for one user
pub fn generate_price_trend_insights<R: HistoryReader + ?Sized>(
    user_id: i64,
    reader: &R,
) -> Result<Vec<Insight>> {
    InsightEngine::new().run(InsightType::PriceTrend, user_id, reader)
}

/// Common purchase insights for one user
pub fn generate_common_purchase_insights<R: HistoryReader + ?Sized>(
    user_id: i64,
    reader: &R,
) -> Result<Vec<Insight>> {
    InsightEngine::new().run(InsightType::CommonPurchase, user_id, reader)
}

/// Store pattern insights for one user
pub fn generate_store_pattern_insights<R: HistoryReader + ?Sized>(
    user_id: i64,
    reader: &R,
) -> Result<Vec<Insight>> {
    InsightEngine::new().run(InsightType::StorePattern, user_id, reader)
}
