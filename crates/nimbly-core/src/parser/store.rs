//! Store name extraction
//!
//! Only the top of the receipt is searched. Precedence is fixed:
//! 1. A line naming a known chain (0.95)
//! 2. An all-caps header line (0.85)
//! 3. The first line that reads like a name (0.50)
//!
//! Only lines that read like a name are considered at all: address, phone,
//! date, amount and summary/footer lines never qualify, even when they
//! mention a chain.

use crate::normalize::normalize_store_name;

use super::{content_lines, is_summary_line, re, StoreExtraction, AMOUNT_PATTERN};

pub const KNOWN_CHAIN_CONFIDENCE: f64 = 0.95;
pub const ALL_CAPS_CONFIDENCE: f64 = 0.85;
pub const FALLBACK_CONFIDENCE: f64 = 0.50;

/// Retailers recognized out of the box
pub const KNOWN_CHAINS: &[&str] = &[
    "Whole Foods",
    "Trader Joe's",
    "Safeway",
    "Kroger",
    "Walmart",
    "Target",
    "Costco",
    "Sam's Club",
    "Walgreens",
    "CVS",
    "Aldi",
    "Lidl",
    "Publix",
    "Albertsons",
    "Sprouts",
    "H-E-B",
    "Wegmans",
    "Meijer",
    "Food Lion",
    "Giant Eagle",
    "Stop & Shop",
    "Ralphs",
    "Vons",
    "Smart & Final",
    "Hy-Vee",
    "WinCo",
    "Fred Meyer",
    "Harris Teeter",
    "Rite Aid",
    "Dollar General",
];

re!(re_phone, r"\(?\d{3}\)?[\s.\-]\d{3}[\s.\-]\d{4}");
re!(
    re_date_like,
    r"(?i)\b\d{1,4}[/\-]\d{1,2}[/\-]\d{2,4}\b|\b(?:date|time)\b"
);
re!(re_trailing_amount, &format!(r"{}\s*[A-Za-z]?\s*$", AMOUNT_PATTERN));
re!(re_url, r"(?i)(?:https?://|www\.)\S+");

pub(super) fn extract_store_name(
    text: &str,
    scan_lines: usize,
    chains: &[String],
) -> StoreExtraction {
    let candidates: Vec<&str> = content_lines(text)
        .take(scan_lines)
        .filter(|l| is_name_candidate(l))
        .collect();

    if let Some(line) = candidates.iter().find(|l| names_known_chain(l, chains)) {
        return found(line, KNOWN_CHAIN_CONFIDENCE);
    }

    if let Some(line) = candidates.iter().find(|l| is_all_caps_header(l)) {
        return found(line, ALL_CAPS_CONFIDENCE);
    }

    if let Some(line) = candidates.first() {
        return found(line, FALLBACK_CONFIDENCE);
    }

    StoreExtraction {
        name: None,
        confidence: 0.0,
    }
}

fn found(line: &str, confidence: f64) -> StoreExtraction {
    StoreExtraction {
        name: Some(line.split_whitespace().collect::<Vec<_>>().join(" ")),
        confidence,
    }
}

/// Whole-word match of any chain against the normalized line
fn names_known_chain(line: &str, chains: &[String]) -> bool {
    let padded = format!(" {} ", normalize_store_name(line));
    chains
        .iter()
        .any(|chain| padded.contains(&format!(" {} ", chain)))
}

fn is_name_candidate(line: &str) -> bool {
    let letters = line.chars().filter(|c| c.is_alphabetic()).count();
    if letters < 2 {
        return false;
    }
    let starts_with_digit = line.chars().next().is_some_and(|c| c.is_ascii_digit());
    !(starts_with_digit
        || is_summary_line(line)
        || re_phone().is_match(line)
        || re_date_like().is_match(line)
        || re_trailing_amount().is_match(line)
        || re_url().is_match(line))
}

fn is_all_caps_header(line: &str) -> bool {
    let letters: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 3
        && letters.iter().all(|c| !c.is_lowercase())
        && !line.chars().any(|c| c.is_ascii_digit())
}
