//! Store, receipt and line item operations

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::{decimal_column, optional_decimal_column, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::*;
use crate::normalize::{normalize_product_name, normalize_store_name};
use crate::parser::{ParsedReceipt, ReceiptParser};

pub(super) const RECEIPT_COLUMNS: &str = "r.id, r.user_id, r.store_id, s.name, r.upload_timestamp,
     r.purchase_date, r.total_amount, r.tax_amount, r.parse_status, r.parse_error,
     r.parse_issues, r.overall_confidence, r.content_hash";

/// SHA256 of receipt text, hex encoded
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Find or create a store by normalized name; None when the name normalizes to nothing
fn upsert_store_in(conn: &Connection, name: &str) -> Result<Option<i64>> {
    let normalized = normalize_store_name(name);
    if normalized.is_empty() {
        return Ok(None);
    }

    conn.execute(
        "INSERT INTO stores (name, normalized_name) VALUES (?, ?)
         ON CONFLICT(normalized_name) DO NOTHING",
        params![name.trim(), normalized],
    )?;
    let id = conn.query_row(
        "SELECT id FROM stores WHERE normalized_name = ?",
        params![normalized],
        |row| row.get(0),
    )?;
    Ok(Some(id))
}

impl Database {
    /// Find or create a store, deduplicated by normalized name
    pub fn upsert_store(&self, name: &str) -> Result<i64> {
        let conn = self.conn()?;
        upsert_store_in(&conn, name)?
            .ok_or_else(|| Error::InvalidData(format!("Store name is empty: {:?}", name)))
    }

    /// Get store by ID
    pub fn get_store(&self, id: i64) -> Result<Option<Store>> {
        let conn = self.conn()?;
        let store = conn
            .query_row(
                "SELECT id, name, normalized_name, created_at FROM stores WHERE id = ?",
                params![id],
                |row| {
                    let created_at: String = row.get(3)?;
                    Ok(Store {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        normalized_name: row.get(2)?,
                        created_at: parse_datetime(&created_at),
                    })
                },
            )
            .optional()?;
        Ok(store)
    }

    /// Create a receipt awaiting its parse result
    pub fn create_pending_receipt(&self, user_id: i64, content_hash: Option<&str>) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO receipts (user_id, parse_status, content_hash) VALUES (?, 'pending', ?)",
            params![user_id, content_hash],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Apply a parse result to a pending receipt
    ///
    /// Writes the extracted fields, the line items and (for usable receipts
    /// with a store) one price-history row per line item, all in one
    /// transaction. A receipt that already has a terminal status is never
    /// reassigned: the call fails with `InvalidTransition`.
    pub fn record_parse_result(&self, receipt_id: i64, parsed: &ParsedReceipt) -> Result<Receipt> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let (status, uploaded): (String, String) = tx
            .query_row(
                "SELECT parse_status, upload_timestamp FROM receipts WHERE id = ?",
                params![receipt_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("Receipt {}", receipt_id)))?;

        let current: ParseStatus = status.parse().map_err(Error::InvalidData)?;
        if current.is_terminal() {
            return Err(Error::InvalidTransition(format!(
                "Receipt {} is already {}",
                receipt_id, current
            )));
        }

        let assessment = &parsed.assessment;
        let store_id = match parsed.store.name.as_deref() {
            Some(name) => upsert_store_in(&tx, name)?,
            None => None,
        };

        let updated = tx.execute(
            "UPDATE receipts SET store_id = ?, purchase_date = ?, total_amount = ?, tax_amount = ?,
             parse_status = ?, parse_error = ?, parse_issues = ?, overall_confidence = ?
             WHERE id = ? AND parse_status = 'pending'",
            params![
                store_id,
                parsed.date.date.map(|d| d.to_string()),
                parsed.total.amount.map(|d| d.to_string()),
                parsed.tax.map(|d| d.to_string()),
                assessment.status.as_str(),
                assessment.error,
                serde_json::to_string(&assessment.details.issues)?,
                assessment.details.overall_confidence,
                receipt_id,
            ],
        )?;
        if updated != 1 {
            return Err(Error::InvalidTransition(format!(
                "Receipt {} is no longer pending",
                receipt_id
            )));
        }

        let observed_date = parsed
            .date
            .date
            .unwrap_or_else(|| parse_datetime(&uploaded).date_naive());
        let price_store = store_id.filter(|_| assessment.status.is_usable());
        let mut prices_written = 0;

        for item in &parsed.line_items.items {
            let normalized = normalize_product_name(&item.product_name);
            tx.execute(
                "INSERT INTO line_items (receipt_id, product_name, normalized_product_name,
                 quantity, unit_price, total_price, line_number)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    receipt_id,
                    item.product_name,
                    normalized,
                    item.quantity.map(|d| d.to_string()),
                    item.unit_price.map(|d| d.to_string()),
                    item.price.to_string(),
                    item.line_number,
                ],
            )?;
            let line_item_id = tx.last_insert_rowid();

            if let Some(store_id) = price_store {
                tx.execute(
                    "INSERT INTO price_history (product_name, store_id, price, observed_date,
                     source_line_item_id) VALUES (?, ?, ?, ?, ?)",
                    params![
                        normalized,
                        store_id,
                        item.price.to_string(),
                        observed_date.to_string(),
                        line_item_id,
                    ],
                )?;
                prices_written += 1;
            }
        }

        tx.commit()?;

        info!(
            receipt_id,
            status = assessment.status.as_str(),
            items = parsed.line_items.items.len(),
            prices = prices_written,
            "Parse result recorded"
        );

        self.get_receipt(receipt_id)?
            .ok_or_else(|| Error::NotFound(format!("Receipt {}", receipt_id)))
    }

    /// Store, parse and assess receipt text for a user in one step
    pub fn ingest_receipt_text(
        &self,
        user_id: i64,
        text: &str,
        parser: &ReceiptParser,
    ) -> Result<Receipt> {
        let hash = content_hash(text);
        let receipt_id = self.create_pending_receipt(user_id, Some(&hash))?;
        debug!(receipt_id, user_id, "Pending receipt created");
        let parsed = parser.parse(text);
        self.record_parse_result(receipt_id, &parsed)
    }

    /// Get receipt by ID
    pub fn get_receipt(&self, id: i64) -> Result<Option<Receipt>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM receipts r LEFT JOIN stores s ON s.id = r.store_id WHERE r.id = ?",
            RECEIPT_COLUMNS
        ))?;

        let receipt = stmt
            .query_row(params![id], |row| Self::row_to_receipt(row))
            .optional()?;

        Ok(receipt)
    }

    /// List a user's receipts, most recent upload first
    pub fn list_receipts_for_user(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Receipt>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM receipts r LEFT JOIN stores s ON s.id = r.store_id
             WHERE r.user_id = ?
             ORDER BY r.upload_timestamp DESC, r.id DESC
             LIMIT ? OFFSET ?",
            RECEIPT_COLUMNS
        ))?;

        let receipts = stmt
            .query_map(params![user_id, limit, offset], |row| {
                Self::row_to_receipt(row)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(receipts)
    }

    /// Count a user's receipts (any status)
    pub fn count_receipts_for_user(&self, user_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM receipts WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// A user's receipts with the given content hash (for duplicate detection)
    pub fn find_receipts_by_hash(&self, user_id: i64, content_hash: &str) -> Result<Vec<Receipt>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM receipts r LEFT JOIN stores s ON s.id = r.store_id
             WHERE r.user_id = ? AND r.content_hash = ?
             ORDER BY r.id ASC",
            RECEIPT_COLUMNS
        ))?;

        let receipts = stmt
            .query_map(params![user_id, content_hash], |row| {
                Self::row_to_receipt(row)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(receipts)
    }

    /// Line items of a receipt in receipt order
    pub fn get_line_items(&self, receipt_id: i64) -> Result<Vec<LineItem>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, receipt_id, product_name, normalized_product_name, quantity,
                    unit_price, total_price, line_number
             FROM line_items WHERE receipt_id = ? ORDER BY line_number ASC",
        )?;

        let items = stmt
            .query_map(params![receipt_id], |row| Self::row_to_line_item(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// Helper to convert a row to Receipt
    pub(super) fn row_to_receipt(row: &rusqlite::Row) -> rusqlite::Result<Receipt> {
        let uploaded: String = row.get(4)?;
        let purchase_date: Option<String> = row.get(5)?;
        let status: String = row.get(8)?;
        let issues: String = row.get(10)?;

        Ok(Receipt {
            id: row.get(0)?,
            user_id: row.get(1)?,
            store_id: row.get(2)?,
            store_name: row.get(3)?,
            upload_timestamp: parse_datetime(&uploaded),
            purchase_date: purchase_date
                .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            total_amount: optional_decimal_column(row, 6)?,
            tax_amount: optional_decimal_column(row, 7)?,
            parse_status: status.parse().unwrap_or_default(),
            parse_error: row.get(9)?,
            parse_issues: serde_json::from_str(&issues).unwrap_or_default(),
            overall_confidence: row.get(11)?,
            content_hash: row.get(12)?,
        })
    }

    /// Helper to convert a row to LineItem
    pub(super) fn row_to_line_item(row: &rusqlite::Row) -> rusqlite::Result<LineItem> {
        Ok(LineItem {
            id: row.get(0)?,
            receipt_id: row.get(1)?,
            product_name: row.get(2)?,
            normalized_product_name: row.get(3)?,
            quantity: optional_decimal_column(row, 4)?,
            unit_price: optional_decimal_column(row, 5)?,
            total_price: decimal_column(row, 6)?,
            line_number: row.get(7)?,
        })
    }
}
