//! Test utilities for nimbly-core
//!
//! [`HistoryBuilder`] assembles a purchase history in memory and serves it
//! through [`HistoryReader`], so insight code can be tested without SQLite.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::error::Result;
use crate::history::HistoryReader;
use crate::models::{LineItem, ParseStatus, PriceHistoryEntry, Receipt};
use crate::normalize::{normalize_product_name, normalize_store_name};

/// In-memory purchase history
#[derive(Debug, Default)]
pub struct HistoryBuilder {
    stores: HashMap<String, (i64, String)>,
    receipts: Vec<Receipt>,
    line_items: Vec<LineItem>,
    prices: Vec<PriceHistoryEntry>,
    next_id: i64,
}

impl HistoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn store_id(&mut self, name: &str) -> i64 {
        let key = normalize_store_name(name);
        if let Some((id, _)) = self.stores.get(&key) {
            return *id;
        }
        let id = self.id();
        self.stores.insert(key, (id, name.to_string()));
        id
    }

    /// Upload time shared by every receipt built here
    pub fn upload_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0)
            .single()
            .unwrap_or_default()
    }

    /// Add a successfully parsed receipt and return its id
    pub fn receipt(
        &mut self,
        user_id: i64,
        store: Option<&str>,
        date: Option<(i32, u32, u32)>,
    ) -> i64 {
        let id = self.id();
        let store_id = store.map(|name| self.store_id(name));
        self.receipts.push(Receipt {
            id,
            user_id,
            store_id,
            store_name: store.map(str::to_string),
            upload_timestamp: Self::upload_timestamp(),
            purchase_date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            total_amount: None,
            tax_amount: None,
            parse_status: ParseStatus::Success,
            parse_error: None,
            parse_issues: Vec::new(),
            overall_confidence: Some(0.95),
            content_hash: None,
        });
        id
    }

    pub fn set_status(&mut self, receipt_id: i64, status: ParseStatus) {
        if let Some(r) = self.receipts.iter_mut().find(|r| r.id == receipt_id) {
            r.parse_status = status;
        }
    }

    /// Add a line item, plus a price row when the receipt has a store
    pub fn item(&mut self, receipt_id: i64, name: &str, price: &str) -> i64 {
        let id = self.id();
        let price = Decimal::from_str(price).expect("valid test price");
        let line_number = self
            .line_items
            .iter()
            .filter(|i| i.receipt_id == receipt_id)
            .count() as u32
            + 1;
        let normalized = normalize_product_name(name);
        self.line_items.push(LineItem {
            id,
            receipt_id,
            product_name: name.to_string(),
            normalized_product_name: normalized.clone(),
            quantity: None,
            unit_price: None,
            total_price: price,
            line_number,
        });

        let receipt = self.receipts.iter().find(|r| r.id == receipt_id).cloned();
        if let Some(receipt) = receipt {
            if let Some(store_id) = receipt.store_id {
                let price_id = self.id();
                self.prices.push(PriceHistoryEntry {
                    id: price_id,
                    product_name: normalized,
                    store_id,
                    price,
                    observed_date: receipt
                        .purchase_date
                        .unwrap_or_else(|| receipt.upload_timestamp.date_naive()),
                    source_line_item_id: id,
                });
            }
        }
        id
    }

    /// Add a price row pointing at a line item that does not exist
    pub fn orphan_price(&mut self, product: &str, price: &str) {
        let id = self.id();
        self.prices.push(PriceHistoryEntry {
            id,
            product_name: product.to_string(),
            store_id: 0,
            price: Decimal::from_str(price).expect("valid test price"),
            observed_date: Self::upload_timestamp().date_naive(),
            source_line_item_id: -id,
        });
    }

    /// A reader that ignores the user filter, for isolation tests
    pub fn leaky(&self) -> LeakyReader<'_> {
        LeakyReader(self)
    }
}

impl HistoryReader for HistoryBuilder {
    fn receipts_for_user(&self, user_id: i64) -> Result<Vec<Receipt>> {
        Ok(self
            .receipts
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    fn line_items_for_user(&self, user_id: i64) -> Result<Vec<LineItem>> {
        let owned: Vec<i64> = self
            .receipts
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.id)
            .collect();
        Ok(self
            .line_items
            .iter()
            .filter(|i| owned.contains(&i.receipt_id))
            .cloned()
            .collect())
    }

    fn price_history_for_user(&self, user_id: i64) -> Result<Vec<PriceHistoryEntry>> {
        let items = self.line_items_for_user(user_id)?;
        let item_ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        // Orphans (negative line item ids) are returned so callers can be tested
        // against them
        Ok(self
            .prices
            .iter()
            .filter(|p| item_ids.contains(&p.source_line_item_id) || p.source_line_item_id < 0)
            .cloned()
            .collect())
    }
}

/// Returns every row regardless of owner
pub struct LeakyReader<'a>(&'a HistoryBuilder);

impl HistoryReader for LeakyReader<'_> {
    fn receipts_for_user(&self, _user_id: i64) -> Result<Vec<Receipt>> {
        Ok(self.0.receipts.clone())
    }

    fn line_items_for_user(&self, _user_id: i64) -> Result<Vec<LineItem>> {
        Ok(self.0.line_items.clone())
    }

    fn price_history_for_user(&self, _user_id: i64) -> Result<Vec<PriceHistoryEntry>> {
        Ok(self.0.prices.clone())
    }
}
