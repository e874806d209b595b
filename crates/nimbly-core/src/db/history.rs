//! History reads for the insights engine
//!
//! Every query joins through `receipts.user_id`, so a user only ever sees
//! rows hanging off their own receipts.

use chrono::NaiveDate;
use rusqlite::params;

use super::{decimal_column, Database};
use crate::error::Result;
use crate::history::HistoryReader;
use crate::models::{LineItem, PriceHistoryEntry, Receipt};

impl HistoryReader for Database {
    fn receipts_for_user(&self, user_id: i64) -> Result<Vec<Receipt>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM receipts r LEFT JOIN stores s ON s.id = r.store_id
             WHERE r.user_id = ?
             ORDER BY r.id ASC",
            super::receipts::RECEIPT_COLUMNS
        ))?;

        let receipts = stmt
            .query_map(params![user_id], |row| Self::row_to_receipt(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(receipts)
    }

    fn line_items_for_user(&self, user_id: i64) -> Result<Vec<LineItem>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT li.id, li.receipt_id, li.product_name, li.normalized_product_name,
                    li.quantity, li.unit_price, li.total_price, li.line_number
             FROM line_items li
             JOIN receipts r ON r.id = li.receipt_id
             WHERE r.user_id = ?
             ORDER BY li.receipt_id ASC, li.line_number ASC",
        )?;

        let items = stmt
            .query_map(params![user_id], |row| Self::row_to_line_item(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn price_history_for_user(&self, user_id: i64) -> Result<Vec<PriceHistoryEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT ph.id, ph.product_name, ph.store_id, ph.price, ph.observed_date,
                    ph.source_line_item_id
             FROM price_history ph
             JOIN line_items li ON li.id = ph.source_line_item_id
             JOIN receipts r ON r.id = li.receipt_id
             WHERE r.user_id = ?
             ORDER BY ph.observed_date ASC, ph.id ASC",
        )?;

        let prices = stmt
            .query_map(params![user_id], |row| {
                let observed: String = row.get(4)?;
                let observed_date = NaiveDate::parse_from_str(&observed, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        4,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(PriceHistoryEntry {
                    id: row.get(0)?,
                    product_name: row.get(1)?,
                    store_id: row.get(2)?,
                    price: decimal_column(row, 3)?,
                    observed_date,
                    source_line_item_id: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(prices)
    }
}
