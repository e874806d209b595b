//! Name normalization for stores and products
//!
//! Normalized names are the join keys of the price history: the same store or
//! product written with different casing or spacing on two receipts must map
//! to the same key. Both functions are deterministic, idempotent and always
//! return lowercase text.

/// Normalize a store name ("Trader Joe's" -> "trader joes")
///
/// Apostrophes are dropped so possessives collapse onto the bare name; every
/// other non-alphanumeric character becomes a word separator.
pub fn normalize_store_name(name: &str) -> String {
    let lowered: String = name
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}' | '`'))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    collapse_whitespace(&lowered)
}

/// Normalize a product name ("  Organic  BANANAS. " -> "organic bananas")
///
/// Inner punctuation is kept ("2% milk"), surrounding punctuation is not.
pub fn normalize_product_name(name: &str) -> String {
    let lowered = collapse_whitespace(&name.to_lowercase());
    lowered
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_string()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
