//! Receipt text parser
//!
//! Turns OCR'd receipt text into structured fields. Every extractor is
//! best-effort and infallible: malformed input yields an absent value with
//! zero or low confidence, never an error. The confidence assessor
//! (`crate::confidence`) rolls the per-field results into a single verdict.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nimbly_core::parser::parse_receipt;
//!
//! let parsed = parse_receipt(text);
//! println!("{:?} {:?}", parsed.store.name, parsed.assessment.status);
//! ```

mod amounts;
mod date;
mod items;
mod store;

use std::sync::OnceLock;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{NimblyConfig, ParserConfig};
use crate::confidence::{Assessment, ConfidenceAssessor};
use crate::normalize::normalize_store_name;

pub use amounts::parse_amount;
pub use store::KNOWN_CHAINS;

/// Compile a pattern once and hand out a static reference
macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static ::regex::Regex {
            static R: ::std::sync::OnceLock<::regex::Regex> = ::std::sync::OnceLock::new();
            R.get_or_init(|| ::regex::Regex::new($pat).expect("valid regex"))
        }
    };
}
pub(crate) use re;

/// Store name found near the top of the receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreExtraction {
    pub name: Option<String>,
    pub confidence: f64,
}

/// Purchase date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateExtraction {
    pub date: Option<NaiveDate>,
    pub confidence: f64,
}

/// One itemized purchase line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedLineItem {
    pub product_name: String,
    /// Weight or count ("2.5 lb", "3 @ 1.99", "2 x")
    pub quantity: Option<Decimal>,
    /// Per-unit price when the line states one ("3 @ 1.99")
    pub unit_price: Option<Decimal>,
    /// Amount charged for the line
    pub price: Decimal,
    /// 1-based position among extracted items
    pub line_number: u32,
}

/// Coverage counters for line item extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemMetadata {
    /// Candidate lines scanned (ending in an amount, not a summary line)
    pub processed_lines: usize,
    /// Candidates that produced a usable (product, price) pair
    pub matched_lines: usize,
}

impl LineItemMetadata {
    /// matched / processed, or 0 when there were no candidates
    pub fn extraction_rate(&self) -> f64 {
        if self.processed_lines == 0 {
            0.0
        } else {
            self.matched_lines as f64 / self.processed_lines as f64
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItemExtraction {
    pub items: Vec<ExtractedLineItem>,
    pub metadata: LineItemMetadata,
}

/// Receipt total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalExtraction {
    pub amount: Option<Decimal>,
    pub confidence: f64,
}

/// Everything extracted from one receipt, plus its assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedReceipt {
    pub store: StoreExtraction,
    pub date: DateExtraction,
    pub line_items: LineItemExtraction,
    pub total: TotalExtraction,
    pub tax: Option<Decimal>,
    pub assessment: Assessment,
}

/// Configurable receipt parser
#[derive(Debug, Clone)]
pub struct ReceiptParser {
    store_scan_lines: usize,
    /// Normalized chain names, built-ins first
    chains: Vec<String>,
    assessor: ConfidenceAssessor,
}

impl Default for ReceiptParser {
    fn default() -> Self {
        Self::new(&NimblyConfig::default())
    }
}

impl ReceiptParser {
    pub fn new(config: &NimblyConfig) -> Self {
        Self {
            store_scan_lines: config.parser.store_scan_lines,
            chains: chain_keys(&config.parser),
            assessor: ConfidenceAssessor::new(config.assessment.clone()),
        }
    }

    pub fn extract_store_name(&self, text: &str) -> StoreExtraction {
        store::extract_store_name(text, self.store_scan_lines, &self.chains)
    }

    pub fn extract_date(&self, text: &str) -> DateExtraction {
        date::extract_date(text)
    }

    pub fn extract_line_items(&self, text: &str) -> LineItemExtraction {
        items::extract_line_items(text)
    }

    pub fn extract_total(&self, text: &str) -> TotalExtraction {
        amounts::extract_total(text)
    }

    pub fn extract_tax(&self, text: &str) -> Option<Decimal> {
        amounts::extract_tax(text)
    }

    /// Run every extractor and assess the result
    pub fn parse(&self, text: &str) -> ParsedReceipt {
        let store = self.extract_store_name(text);
        let date = self.extract_date(text);
        let line_items = self.extract_line_items(text);
        let total = self.extract_total(text);
        let tax = self.extract_tax(text);

        debug!(
            store = store.name.as_deref().unwrap_or("-"),
            store_confidence = store.confidence,
            date = ?date.date,
            items = line_items.items.len(),
            processed = line_items.metadata.processed_lines,
            total = ?total.amount,
            tax = ?tax,
            "Receipt fields extracted"
        );

        let assessment = self
            .assessor
            .assess(&store, &date, &line_items, &total, tax);

        ParsedReceipt {
            store,
            date,
            line_items,
            total,
            tax,
            assessment,
        }
    }
}

fn chain_keys(config: &ParserConfig) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for name in KNOWN_CHAINS
        .iter()
        .copied()
        .chain(config.extra_chains.iter().map(String::as_str))
    {
        let key = normalize_store_name(name);
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

fn default_parser() -> &'static ReceiptParser {
    static PARSER: OnceLock<ReceiptParser> = OnceLock::new();
    PARSER.get_or_init(ReceiptParser::default)
}

/// Extract the store name using default settings
pub fn extract_store_name(text: &str) -> StoreExtraction {
    default_parser().extract_store_name(text)
}

/// Extract the purchase date
pub fn extract_date(text: &str) -> DateExtraction {
    default_parser().extract_date(text)
}

/// Extract itemized lines
pub fn extract_line_items(text: &str) -> LineItemExtraction {
    default_parser().extract_line_items(text)
}

/// Extract the receipt total
pub fn extract_total(text: &str) -> TotalExtraction {
    default_parser().extract_total(text)
}

/// Extract the tax amount
pub fn extract_tax(text: &str) -> Option<Decimal> {
    default_parser().extract_tax(text)
}

/// Parse a receipt with default settings
pub fn parse_receipt(text: &str) -> ParsedReceipt {
    default_parser().parse(text)
}

/// Trimmed, non-empty lines in order
pub(crate) fn content_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// Words that open a summary or payment line
const SUMMARY_LEADS: &[&str] = &[
    "sub", "subtotal", "total", "grand", "tax", "sales", "balance", "amount", "change", "cash",
    "tender", "tendered", "visa", "mastercard", "amex", "discover", "debit", "credit", "payment",
    "ebt",
];

/// Words that may follow the lead on a summary line ("Total Due", "Cash Back")
const SUMMARY_LABELS: &[&str] = &[
    "due", "sale", "purchase", "savings", "card", "back", "received", "paid", "items", "item",
    "count", "rate", "gift", "approved", "auth", "account", "acct", "chip", "contactless", "tend",
    "ending",
];

re!(re_footer, r"(?i)^(?:thank\s*you|thanks)\b");
re!(re_word, r"\p{Alphabetic}+");

/// Whether a line is a summary/payment/footer line rather than a purchase
///
/// The line must open with a summary keyword and carry nothing but labels
/// after it, so "Total Cereal" or "Pocket Change Gum" stay purchases. Words of
/// one or two letters (tax flags, "of") are ignored.
pub(crate) fn is_summary_line(line: &str) -> bool {
    if re_footer().is_match(line) {
        return true;
    }

    let mut words = re_word()
        .find_iter(line)
        .map(|m| m.as_str().to_lowercase());
    let Some(lead) = words.next() else {
        return false;
    };
    if !SUMMARY_LEADS.contains(&lead.as_str()) {
        return false;
    }
    words
        .filter(|w| w.chars().count() > 2)
        .all(|w| SUMMARY_LEADS.contains(&w.as_str()) || SUMMARY_LABELS.contains(&w.as_str()))
}

/// Amount token used across extractors ("1,234.56", "34.00", "-1.00")
pub(crate) const AMOUNT_PATTERN: &str = r"-?(?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2}";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParseStatus;
    use std::str::FromStr;

    pub(crate) const SAMPLE_RECEIPT: &str = "
WHOLE FOODS MARKET
123 Main Street
San Francisco, CA 94102

Date: 01/08/2026
Time: 14:30

Organic Bananas 2.5 lb    3.75
Almond Milk               4.99
Organic Eggs 12 ct        6.49
Avocados 3 @ 1.99         5.97
Whole Wheat Bread         4.29
Greek Yogurt              5.99

Subtotal                 31.48
Tax                       2.52
Total                    34.00

Thank you for shopping!
";

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_full_sample() {
        let parsed = parse_receipt(SAMPLE_RECEIPT);

        assert_eq!(parsed.store.name.as_deref(), Some("WHOLE FOODS MARKET"));
        assert!(parsed.store.confidence > 0.8);

        assert_eq!(parsed.date.date, NaiveDate::from_ymd_opt(2026, 1, 8));
        assert!(parsed.date.confidence > 0.8);

        assert_eq!(parsed.line_items.items.len(), 6);
        assert_eq!(parsed.line_items.metadata.processed_lines, 6);
        assert_eq!(parsed.line_items.metadata.matched_lines, 6);

        assert_eq!(parsed.total.amount, Some(d("34.00")));
        assert!(parsed.total.confidence > 0.8);
        assert_eq!(parsed.tax, Some(d("2.52")));

        assert_eq!(parsed.assessment.status, ParseStatus::Success);
        assert!(parsed.assessment.details.overall_confidence > 0.8);
        assert!(parsed.assessment.error.is_none());
    }

    #[test]
    fn test_parse_compact_example() {
        let text = "WHOLE FOODS MARKET\nDate: 01/08/2026\nOrganic Bananas 2.5 lb 3.75\nAlmond Milk 4.99\nSubtotal 31.48\nTax 2.52\nTotal 34.00";
        let parsed = parse_receipt(text);

        assert_eq!(parsed.store.name.as_deref(), Some("WHOLE FOODS MARKET"));
        assert!(parsed.store.confidence > 0.8);
        assert_eq!(parsed.date.date, NaiveDate::from_ymd_opt(2026, 1, 8));
        assert!(parsed.date.confidence > 0.8);

        let items = &parsed.line_items.items;
        assert!(items.len() >= 2);
        assert_eq!(items[0].product_name, "Organic Bananas");
        assert_eq!(items[0].quantity, Some(d("2.5")));
        assert_eq!(items[0].price, d("3.75"));
        assert_eq!(items[1].product_name, "Almond Milk");
        assert_eq!(items[1].price, d("4.99"));

        assert_eq!(parsed.total.amount, Some(d("34.00")));
        assert!(parsed.total.confidence > 0.8);
        assert_eq!(parsed.tax, Some(d("2.52")));

        assert_eq!(parsed.assessment.status, ParseStatus::Success);
        assert!(parsed.assessment.details.overall_confidence > 0.7);
    }

    #[test]
    fn test_parse_garbage_never_panics() {
        for text in ["", "\n\n\n", "!!!", "1.00", "€€€ 12/99/9999", "Total", "TOTAL TOTAL"] {
            let parsed = parse_receipt(text);
            assert!(parsed.assessment.details.overall_confidence >= 0.0);
        }
        let parsed = parse_receipt("");
        assert_eq!(parsed.assessment.status, ParseStatus::Failed);
        assert!(parsed.store.name.is_none());
        assert_eq!(parsed.store.confidence, 0.0);
    }

    #[test]
    fn test_extra_chain_from_config() {
        let mut config = NimblyConfig::default();
        config.parser.extra_chains = vec!["Corner Grocer".to_string()];
        let parser = ReceiptParser::new(&config);

        let store = parser.extract_store_name("Corner Grocer\nMilk 2.99\nTotal 2.99");
        assert_eq!(store.name.as_deref(), Some("Corner Grocer"));
        assert!(store.confidence > 0.8);

        let default_store = extract_store_name("Corner Grocer\nMilk 2.99\nTotal 2.99");
        assert!(default_store.confidence < 0.8);
    }

    #[test]
    fn test_summary_line_detection() {
        assert!(is_summary_line("Subtotal 31.48"));
        assert!(is_summary_line("SUB TOTAL 31.48"));
        assert!(is_summary_line("Tax 2.52"));
        assert!(is_summary_line("VISA ****1234 34.00"));
        assert!(is_summary_line("Balance Due 34.00"));
        assert!(is_summary_line("Thank you for shopping!"));
        assert!(!is_summary_line("Cashews 5.99"));
        assert!(!is_summary_line("Taxable Goods Bag 0.10"));
        assert!(!is_summary_line("Almond Milk 4.99"));
        assert!(is_summary_line("Grand Total: $34.00"));
        assert!(is_summary_line("Sales Tax 8.25% 2.52 T"));
        assert!(is_summary_line("Cash Back 20.00"));
        assert!(is_summary_line("Change Due 6.00"));
        assert!(is_summary_line("Credit Card ****1234 34.00"));
        assert!(is_summary_line("Thank you for shopping at Target"));
    }

    #[test]
    fn test_summary_keywords_inside_product_names() {
        assert!(!is_summary_line("Total Cereal 4.99"));
        assert!(!is_summary_line("FAGE TOTAL 2% YOGURT 5.99"));
        assert!(!is_summary_line("Pocket Change Gum 1.25"));
        assert!(!is_summary_line("Cash & Carry Rice 3.49"));
    }

    #[test]
    fn test_extraction_rate() {
        let empty = LineItemMetadata::default();
        assert_eq!(empty.extraction_rate(), 0.0);
        let half = LineItemMetadata {
            processed_lines: 4,
            matched_lines: 2,
        };
        assert_eq!(half.extraction_rate(), 0.5);
    }
}
