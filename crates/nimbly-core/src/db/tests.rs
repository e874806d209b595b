//! Database tests

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::*;
use crate::history::{HistoryReader, HistorySnapshot};
use crate::models::ParseStatus;
use crate::parser::{parse_receipt, ReceiptParser};

const SAMPLE: &str = "WHOLE FOODS MARKET
123 Main Street
Date: 01/08/2026
Organic Bananas 2.5 lb    3.75
Almond Milk               4.99
Avocados 3 @ 1.99         5.97
Subtotal                 14.71
Tax                       1.18
Total                    15.89";

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[test]
fn test_schema_exists() {
    let db = Database::in_memory().unwrap();
    let conn = db.conn().unwrap();

    for table in ["stores", "receipts", "line_items", "price_history"] {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
                [table],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1, "missing table {}", table);
    }
}

#[test]
fn test_upsert_store_dedupes_by_normalized_name() {
    let db = Database::in_memory().unwrap();

    let a = db.upsert_store("Trader Joe's").unwrap();
    let b = db.upsert_store("TRADER JOES").unwrap();
    let c = db.upsert_store("Safeway").unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);

    let store = db.get_store(a).unwrap().unwrap();
    assert_eq!(store.name, "Trader Joe's");
    assert_eq!(store.normalized_name, "trader joes");

    assert!(db.upsert_store("  !! ").is_err());
}

#[test]
fn test_pending_receipt() {
    let db = Database::in_memory().unwrap();
    let id = db.create_pending_receipt(7, Some("abc")).unwrap();

    let receipt = db.get_receipt(id).unwrap().unwrap();
    assert_eq!(receipt.user_id, 7);
    assert_eq!(receipt.parse_status, ParseStatus::Pending);
    assert!(receipt.store_id.is_none());
    assert!(receipt.parse_issues.is_empty());
    assert_eq!(receipt.content_hash.as_deref(), Some("abc"));

    assert!(db.get_receipt(id + 100).unwrap().is_none());
}

#[test]
fn test_record_parse_result() {
    let db = Database::in_memory().unwrap();
    let id = db.create_pending_receipt(1, None).unwrap();
    let parsed = parse_receipt(SAMPLE);

    let receipt = db.record_parse_result(id, &parsed).unwrap();
    assert_eq!(receipt.parse_status, ParseStatus::Success);
    assert_eq!(receipt.store_name.as_deref(), Some("WHOLE FOODS MARKET"));
    assert_eq!(receipt.purchase_date, NaiveDate::from_ymd_opt(2026, 1, 8));
    assert_eq!(receipt.total_amount, Some(d("15.89")));
    assert_eq!(receipt.tax_amount, Some(d("1.18")));
    assert!(receipt.parse_error.is_none());
    assert!(receipt.overall_confidence.unwrap() > 0.8);

    let items = db.get_line_items(id).unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].product_name, "Organic Bananas");
    assert_eq!(items[0].normalized_product_name, "organic bananas");
    assert_eq!(items[0].quantity, Some(d("2.5")));
    assert_eq!(items[2].unit_price, Some(d("1.99")));
    assert_eq!(
        items.iter().map(|i| i.line_number).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    let prices = db.price_history_for_user(1).unwrap();
    assert_eq!(prices.len(), 3);
    assert!(prices
        .iter()
        .all(|p| p.observed_date == NaiveDate::from_ymd_opt(2026, 1, 8).unwrap()));
    assert_eq!(prices[0].source_line_item_id, items[0].id);
}

#[test]
fn test_prices_round_trip_exactly() {
    let db = Database::in_memory().unwrap();
    let text = "CORNER MARKET\nDate: 2026-03-01\nCaviar 1,299.00\nGum 0.10\nTea 3.5 oz 4.50\nTotal 1303.60";
    let parsed = parse_receipt(text);
    let id = db.create_pending_receipt(1, None).unwrap();
    db.record_parse_result(id, &parsed).unwrap();

    let stored = db.get_line_items(id).unwrap();
    assert_eq!(stored.len(), parsed.line_items.items.len());
    for (row, item) in stored.iter().zip(&parsed.line_items.items) {
        assert_eq!(row.total_price, item.price);
        assert_eq!(row.total_price.to_string(), item.price.to_string());
    }
    assert_eq!(stored[0].total_price.to_string(), "1299.00");
    assert_eq!(stored[1].total_price.to_string(), "0.10");

    let receipt = db.get_receipt(id).unwrap().unwrap();
    assert_eq!(receipt.total_amount.unwrap().to_string(), "1303.60");
}

#[test]
fn test_terminal_status_is_never_reassigned() {
    let db = Database::in_memory().unwrap();
    let id = db.create_pending_receipt(1, None).unwrap();

    let failed = parse_receipt("");
    assert_eq!(failed.assessment.status, ParseStatus::Failed);
    let receipt = db.record_parse_result(id, &failed).unwrap();
    assert_eq!(receipt.parse_status, ParseStatus::Failed);
    assert_eq!(
        receipt.parse_error.as_deref(),
        Some("no total and no line items found")
    );

    let good = parse_receipt(SAMPLE);
    let err = db.record_parse_result(id, &good).unwrap_err();
    assert!(matches!(err, Error::InvalidTransition(_)));

    let receipt = db.get_receipt(id).unwrap().unwrap();
    assert_eq!(receipt.parse_status, ParseStatus::Failed);
    assert!(db.get_line_items(id).unwrap().is_empty());
}

#[test]
fn test_unknown_receipt_not_found() {
    let db = Database::in_memory().unwrap();
    let err = db
        .record_parse_result(999, &parse_receipt(SAMPLE))
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_no_price_history_without_store() {
    let db = Database::in_memory().unwrap();
    let parsed = parse_receipt("Milk 2.99\nBread 3.49\nTotal 6.48");
    assert!(parsed.store.name.is_none());
    assert_eq!(parsed.assessment.status, ParseStatus::NeedsReview);

    let id = db.create_pending_receipt(1, None).unwrap();
    let receipt = db.record_parse_result(id, &parsed).unwrap();
    assert!(receipt.store_id.is_none());
    assert!(!receipt.parse_issues.is_empty());

    assert_eq!(db.get_line_items(id).unwrap().len(), 2);
    assert!(db.price_history_for_user(1).unwrap().is_empty());
}

#[test]
fn test_undated_receipt_observed_on_upload_date() {
    let db = Database::in_memory().unwrap();
    let id = db.create_pending_receipt(1, None).unwrap();
    let parsed = parse_receipt("SAFEWAY\nMilk 2.99\nTotal 2.99");
    assert!(parsed.date.date.is_none());

    let receipt = db.record_parse_result(id, &parsed).unwrap();
    let prices = db.price_history_for_user(1).unwrap();
    assert_eq!(prices.len(), 1);
    assert_eq!(prices[0].observed_date, receipt.upload_timestamp.date_naive());
}

#[test]
fn test_listing_and_counting_are_per_user() {
    let db = Database::in_memory().unwrap();
    let parser = ReceiptParser::default();

    for _ in 0..3 {
        db.ingest_receipt_text(1, SAMPLE, &parser).unwrap();
    }
    db.ingest_receipt_text(2, SAMPLE, &parser).unwrap();

    assert_eq!(db.count_receipts_for_user(1).unwrap(), 3);
    assert_eq!(db.count_receipts_for_user(2).unwrap(), 1);
    assert_eq!(db.count_receipts_for_user(3).unwrap(), 0);

    let page = db.list_receipts_for_user(1, 2, 0).unwrap();
    assert_eq!(page.len(), 2);
    assert!(page[0].id > page[1].id);
    let rest = db.list_receipts_for_user(1, 2, 2).unwrap();
    assert_eq!(rest.len(), 1);
    assert!(page.iter().chain(&rest).all(|r| r.user_id == 1));

    let hash = content_hash(SAMPLE);
    assert_eq!(db.find_receipts_by_hash(1, &hash).unwrap().len(), 3);
    assert_eq!(db.find_receipts_by_hash(2, &hash).unwrap().len(), 1);
    assert!(db.find_receipts_by_hash(1, "nope").unwrap().is_empty());
}

#[test]
fn test_history_reader_isolation() {
    let db = Database::in_memory().unwrap();
    let parser = ReceiptParser::default();
    db.ingest_receipt_text(1, SAMPLE, &parser).unwrap();
    db.ingest_receipt_text(2, "SAFEWAY\nCoffee 9.99\nTotal 9.99", &parser)
        .unwrap();

    let snapshot = HistorySnapshot::load(&db, 2).unwrap();
    assert_eq!(snapshot.receipts.len(), 1);
    assert_eq!(snapshot.line_items.len(), 1);
    assert_eq!(snapshot.line_items[0].product_name, "Coffee");
    assert_eq!(snapshot.prices.len(), 1);
    assert_eq!(snapshot.prices[0].product_name, "coffee");
}

#[test]
fn test_content_hash() {
    let a = content_hash("receipt");
    assert_eq!(a.len(), 64);
    assert_eq!(a, content_hash("receipt"));
    assert_ne!(a, content_hash("receipt "));
}

#[test]
fn test_encrypted_database_opens_with_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("enc.db");
    let path = path.to_string_lossy();

    let db = Database::new_with_key(&path, Some("correct horse")).unwrap();
    let id = db.create_pending_receipt(1, None).unwrap();
    drop(db);

    let reopened = Database::new_with_key(&path, Some("correct horse")).unwrap();
    assert!(reopened.get_receipt(id).unwrap().is_some());
}
