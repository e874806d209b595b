//! Total and tax extraction, plus the shared amount parser

use std::str::FromStr;

use rust_decimal::Decimal;

use super::{content_lines, re, TotalExtraction, AMOUNT_PATTERN};

/// Single labeled total, no competing values
pub const TOTAL_CONFIDENCE: f64 = 0.95;
/// Labeled total, but another total line or the subtotal shows a conflicting picture
pub const AMBIGUOUS_TOTAL_CONFIDENCE: f64 = 0.75;
/// Only an "Amount Due" / "Balance Due" line was found
pub const DUE_LINE_CONFIDENCE: f64 = 0.70;

re!(
    re_total,
    &format!(
        r"(?i)^(?:grand\s+)?total(?:\s+(?:due|amount|sale|purchase))?\s*[:=]?\s*\$?\s*(?P<amount>{})\s*$",
        AMOUNT_PATTERN
    )
);
re!(
    re_due,
    &format!(
        r"(?i)^(?:amount|balance)\s+due\s*[:=]?\s*\$?\s*(?P<amount>{})\s*$",
        AMOUNT_PATTERN
    )
);
re!(
    re_subtotal,
    &format!(
        r"(?i)^sub\s*-?\s*total\s*[:=]?\s*\$?\s*(?P<amount>{})\s*$",
        AMOUNT_PATTERN
    )
);
re!(
    re_tax,
    &format!(
        r"(?i)^(?:sales\s+)?tax(?:\s+\d+(?:\.\d+)?\s*%)?\s*[:=]?\s*\$?\s*(?P<amount>{})\s*$",
        AMOUNT_PATTERN
    )
);

/// Parse an amount token ("$1,299.00", "3.75", "2.5") into an exact decimal
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

fn labeled_amounts(text: &str, regex: &regex::Regex) -> Vec<Decimal> {
    content_lines(text)
        .filter_map(|line| regex.captures(line))
        .filter_map(|caps| caps.name("amount").and_then(|m| parse_amount(m.as_str())))
        .collect()
}

pub(super) fn extract_total(text: &str) -> TotalExtraction {
    let totals = labeled_amounts(text, re_total());

    if let Some(&last) = totals.last() {
        let conflicting_totals = totals.iter().any(|t| *t != last);
        let subtotal_matches = labeled_amounts(text, re_subtotal()).contains(&last);

        return TotalExtraction {
            amount: Some(last),
            confidence: if conflicting_totals || subtotal_matches {
                AMBIGUOUS_TOTAL_CONFIDENCE
            } else {
                TOTAL_CONFIDENCE
            },
        };
    }

    if let Some(&due) = labeled_amounts(text, re_due()).last() {
        return TotalExtraction {
            amount: Some(due),
            confidence: DUE_LINE_CONFIDENCE,
        };
    }

    TotalExtraction {
        amount: None,
        confidence: 0.0,
    }
}

pub(super) fn extract_tax(text: &str) -> Option<Decimal> {
    labeled_amounts(text, re_tax()).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{extract_tax, extract_total};

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_total_not_confused_with_subtotal() {
        let total = extract_total("Subtotal 31.48\nTax 2.52\nTotal 34.00");
        assert_eq!(total.amount, Some(d("34.00")));
        assert_eq!(total.confidence, TOTAL_CONFIDENCE);
    }

    #[test]
    fn test_total_label_variants() {
        assert_eq!(extract_total("Total: 9.77").amount, Some(d("9.77")));
        assert_eq!(extract_total("TOTAL $1,034.50").amount, Some(d("1034.50")));
        assert_eq!(extract_total("Grand Total = 12.00").amount, Some(d("12.00")));
        assert_eq!(extract_total("Total Due 5.00").amount, Some(d("5.00")));
    }

    #[test]
    fn test_subtotal_only_is_not_a_total() {
        let total = extract_total("Sub Total 31.48\nSubtotal: 31.48");
        assert!(total.amount.is_none());
        assert_eq!(total.confidence, 0.0);
    }

    #[test]
    fn test_same_value_subtotal_is_ambiguous() {
        let total = extract_total("Subtotal 10.00\nTotal 10.00");
        assert_eq!(total.amount, Some(d("10.00")));
        assert_eq!(total.confidence, AMBIGUOUS_TOTAL_CONFIDENCE);
    }

    #[test]
    fn test_last_total_line_wins() {
        let total = extract_total("Total 30.00\nCoupon -2.00\nTotal 28.00");
        assert_eq!(total.amount, Some(d("28.00")));
        assert_eq!(total.confidence, AMBIGUOUS_TOTAL_CONFIDENCE);
    }

    #[test]
    fn test_due_line_fallback() {
        let total = extract_total("Milk 2.99\nAmount Due 2.99");
        assert_eq!(total.amount, Some(d("2.99")));
        assert_eq!(total.confidence, DUE_LINE_CONFIDENCE);
    }

    #[test]
    fn test_total_tax_line_is_not_total() {
        let total = extract_total("Total Tax 1.20");
        assert!(total.amount.is_none());
    }

    #[test]
    fn test_tax_extraction() {
        assert_eq!(extract_tax("Tax 2.52"), Some(d("2.52")));
        assert_eq!(extract_tax("SALES TAX 8.25% 1.65"), Some(d("1.65")));
        assert_eq!(extract_tax("Tax: $0.40\nTax 9.99"), Some(d("0.40")));
        assert_eq!(extract_tax("Taxable Goods Bag 0.10"), None);
        assert_eq!(extract_tax("Milk 2.99\nTotal 2.99"), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,299.00"), Some(d("1299.00")));
        assert_eq!(parse_amount(" 3.75 "), Some(d("3.75")));
        assert_eq!(parse_amount("-1.00"), Some(d("-1.00")));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
    }
}
