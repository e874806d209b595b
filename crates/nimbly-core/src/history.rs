//! Read access to a user's purchase history
//!
//! The insights engine never talks to storage directly. It asks a
//! [`HistoryReader`] for one user's rows and builds a [`HistorySnapshot`],
//! which enforces the ownership chain (price row → line item → receipt →
//! user) before anything is aggregated.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::error::Result;
use crate::models::{LineItem, PriceHistoryEntry, Receipt};

/// Source of one user's purchase history
///
/// Implementations should return only rows owned by `user_id`, but callers
/// re-check ownership, so a leaky implementation cannot mix users.
pub trait HistoryReader {
    fn receipts_for_user(&self, user_id: i64) -> Result<Vec<Receipt>>;

    fn line_items_for_user(&self, user_id: i64) -> Result<Vec<LineItem>>;

    fn price_history_for_user(&self, user_id: i64) -> Result<Vec<PriceHistoryEntry>>;
}

/// How far down the ownership chain a snapshot loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SnapshotScope {
    Receipts,
    LineItems,
    Prices,
}

/// Consistent, single-user view of purchase history
///
/// Only receipts with a usable status (success or needs review) are kept.
#[derive(Debug, Clone, Default)]
pub struct HistorySnapshot {
    pub user_id: i64,
    pub receipts: Vec<Receipt>,
    pub line_items: Vec<LineItem>,
    pub prices: Vec<PriceHistoryEntry>,
}

impl HistorySnapshot {
    /// Load and filter one user's full history
    pub fn load<R: HistoryReader + ?Sized>(reader: &R, user_id: i64) -> Result<Self> {
        Self::load_scoped(reader, user_id, SnapshotScope::Prices)
    }

    /// Load only the tables a computation needs
    pub fn load_scoped<R: HistoryReader + ?Sized>(
        reader: &R,
        user_id: i64,
        scope: SnapshotScope,
    ) -> Result<Self> {
        let receipts = reader.receipts_for_user(user_id)?;
        let line_items = if scope >= SnapshotScope::LineItems {
            reader.line_items_for_user(user_id)?
        } else {
            Vec::new()
        };
        let prices = if scope >= SnapshotScope::Prices {
            reader.price_history_for_user(user_id)?
        } else {
            Vec::new()
        };
        Ok(Self::from_rows(user_id, receipts, line_items, prices))
    }

    /// Filter raw rows down to the consistent subset owned by `user_id`
    pub fn from_rows(
        user_id: i64,
        receipts: Vec<Receipt>,
        line_items: Vec<LineItem>,
        prices: Vec<PriceHistoryEntry>,
    ) -> Self {
        let receipts: Vec<Receipt> = receipts
            .into_iter()
            .filter(|r| {
                if r.user_id != user_id {
                    warn!(
                        receipt_id = r.id,
                        owner = r.user_id,
                        user_id,
                        "Skipping receipt owned by another user"
                    );
                    return false;
                }
                r.parse_status.is_usable()
            })
            .collect();
        let receipt_ids: HashSet<i64> = receipts.iter().map(|r| r.id).collect();

        let line_items: Vec<LineItem> = line_items
            .into_iter()
            .filter(|item| receipt_ids.contains(&item.receipt_id))
            .collect();
        let item_ids: HashSet<i64> = line_items.iter().map(|i| i.id).collect();

        let prices: Vec<PriceHistoryEntry> = prices
            .into_iter()
            .filter(|p| {
                let known = item_ids.contains(&p.source_line_item_id);
                if !known {
                    warn!(
                        price_id = p.id,
                        line_item_id = p.source_line_item_id,
                        "Skipping price row without a usable line item"
                    );
                }
                known
            })
            .collect();

        Self {
            user_id,
            receipts,
            line_items,
            prices,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }

    /// Line items keyed by id
    pub fn line_items_by_id(&self) -> HashMap<i64, &LineItem> {
        self.line_items.iter().map(|i| (i.id, i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParseStatus;
    use crate::test_utils::HistoryBuilder;

    #[test]
    fn test_other_users_rows_are_dropped() {
        let mut builder = HistoryBuilder::new();
        let mine = builder.receipt(1, Some("Safeway"), Some((2026, 1, 2)));
        builder.item(mine, "Milk", "2.99");
        let theirs = builder.receipt(2, Some("Safeway"), Some((2026, 1, 3)));
        builder.item(theirs, "Bread", "3.49");

        let snapshot = HistorySnapshot::load(&builder.leaky(), 1).unwrap();
        assert_eq!(snapshot.receipts.len(), 1);
        assert_eq!(snapshot.line_items.len(), 1);
        assert_eq!(snapshot.line_items[0].product_name, "Milk");
        assert_eq!(snapshot.prices.len(), 1);
    }

    #[test]
    fn test_unusable_receipts_excluded() {
        let mut builder = HistoryBuilder::new();
        let failed = builder.receipt(1, Some("Safeway"), None);
        builder.set_status(failed, ParseStatus::Failed);
        let pending = builder.receipt(1, None, None);
        builder.set_status(pending, ParseStatus::Pending);
        let review = builder.receipt(1, Some("Safeway"), None);
        builder.set_status(review, ParseStatus::NeedsReview);

        let snapshot = HistorySnapshot::load(&builder, 1).unwrap();
        assert_eq!(snapshot.receipts.len(), 1);
        assert_eq!(snapshot.receipts[0].id, review);
    }

    #[test]
    fn test_orphan_price_rows_skipped() {
        let mut builder = HistoryBuilder::new();
        let r = builder.receipt(1, Some("Safeway"), Some((2026, 1, 2)));
        builder.item(r, "Milk", "2.99");
        builder.orphan_price("milk", "1.00");

        let snapshot = HistorySnapshot::load(&builder, 1).unwrap();
        assert_eq!(snapshot.prices.len(), 1);
        assert_eq!(snapshot.prices[0].price.to_string(), "2.99");
    }

    #[test]
    fn test_scoped_load_skips_deeper_tables() {
        let mut builder = HistoryBuilder::new();
        let r = builder.receipt(1, Some("Safeway"), Some((2026, 1, 2)));
        builder.item(r, "Milk", "2.99");

        let snapshot = HistorySnapshot::load_scoped(&builder, 1, SnapshotScope::Receipts).unwrap();
        assert_eq!(snapshot.receipts.len(), 1);
        assert!(snapshot.line_items.is_empty());
        assert!(snapshot.prices.is_empty());
    }
}
