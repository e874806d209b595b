//! Nimbly Core Library
//!
//! Shared functionality for the Nimbly receipt tracker:
//! - Receipt text parser with per-field confidence
//! - Confidence assessment into a terminal parse status
//! - Descriptive, past-tense insights over a user's purchase history
//! - Store and product name normalization
//! - SQLite purchase history store with optional SQLCipher encryption
//! - Parser and assessor configuration

pub mod confidence;
pub mod config;
pub mod db;
pub mod error;
pub mod history;
pub mod insights;
pub mod models;
pub mod normalize;
pub mod parser;

/// Test utilities including an in-memory history builder
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use confidence::{assess_parsing_confidence, Assessment, AssessmentDetails, ConfidenceAssessor};
pub use config::{AssessmentConfig, NimblyConfig, ParserConfig};
pub use db::{content_hash, Database};
pub use error::{Error, Result};
pub use history::{HistoryReader, HistorySnapshot, SnapshotScope};
pub use insights::{Insight, InsightEngine, InsightReport, InsightType};
pub use models::{LineItem, ParseStatus, PriceHistoryEntry, Receipt, Store};
pub use normalize::{normalize_product_name, normalize_store_name};
pub use parser::{
    extract_date, extract_line_items, extract_store_name, extract_tax, extract_total,
    parse_receipt, DateExtraction, ExtractedLineItem, LineItemExtraction, LineItemMetadata,
    ParsedReceipt, ReceiptParser, StoreExtraction, TotalExtraction,
};
