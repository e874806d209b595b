//! Domain models for Nimbly
//!
//! These are the persisted shapes of a user's purchase history. The parser
//! produces transient extraction types (see `parser`); the history store turns
//! them into the rows below, and the insights engine reads them back.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Verdict attached to a receipt after parsing
///
/// `Pending` is the only non-terminal state. Once a receipt has been assessed
/// its status is never reassigned; parsing the same text again creates a new
/// receipt with its own assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParseStatus {
    /// Uploaded, not yet assessed
    #[default]
    Pending,
    /// All core fields extracted with high confidence
    Success,
    /// Nothing usable could be extracted
    Failed,
    /// Usable data, but confidence too low to trust without a look
    NeedsReview,
}

impl ParseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::NeedsReview => "needs_review",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether a receipt with this status contributes to purchase history
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Success | Self::NeedsReview)
    }
}

impl std::str::FromStr for ParseStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "needs_review" => Ok(Self::NeedsReview),
            _ => Err(format!("Unknown parse status: {}", s)),
        }
    }
}

impl std::fmt::Display for ParseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A store, deduplicated by normalized name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub id: i64,
    pub name: String,
    pub normalized_name: String,
    pub created_at: DateTime<Utc>,
}

/// A stored receipt belonging to exactly one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub id: i64,
    pub user_id: i64,
    pub store_id: Option<i64>,
    /// Display name of the linked store (joined, not stored on the row)
    pub store_name: Option<String>,
    pub upload_timestamp: DateTime<Utc>,
    pub purchase_date: Option<NaiveDate>,
    pub total_amount: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub parse_status: ParseStatus,
    /// Short description of what could not be extracted (FAILED only)
    pub parse_error: Option<String>,
    /// Issues collected by the assessor, in order
    pub parse_issues: Vec<String>,
    pub overall_confidence: Option<f64>,
    /// SHA256 of the receipt text
    pub content_hash: Option<String>,
}

/// A line item on a stored receipt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub id: i64,
    pub receipt_id: i64,
    pub product_name: String,
    pub normalized_product_name: String,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub total_price: Decimal,
    /// 1-based position on the receipt
    pub line_number: u32,
}

/// One observed price for a product at a store, traced to its line item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    pub id: i64,
    /// Normalized product name
    pub product_name: String,
    pub store_id: i64,
    pub price: Decimal,
    pub observed_date: NaiveDate,
    pub source_line_item_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_status_round_trip() {
        for status in [
            ParseStatus::Pending,
            ParseStatus::Success,
            ParseStatus::Failed,
            ParseStatus::NeedsReview,
        ] {
            assert_eq!(ParseStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(ParseStatus::from_str("done").is_err());
    }

    #[test]
    fn test_parse_status_terminal() {
        assert!(!ParseStatus::Pending.is_terminal());
        assert!(ParseStatus::Success.is_terminal());
        assert!(ParseStatus::Failed.is_terminal());
        assert!(ParseStatus::NeedsReview.is_terminal());

        assert!(ParseStatus::Success.is_usable());
        assert!(ParseStatus::NeedsReview.is_usable());
        assert!(!ParseStatus::Failed.is_usable());
        assert!(!ParseStatus::Pending.is_usable());
    }

    #[test]
    fn test_parse_status_serde() {
        let json = serde_json::to_string(&ParseStatus::NeedsReview).unwrap();
        assert_eq!(json, "\"needs_review\"");
    }
}
