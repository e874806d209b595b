//! Wording rules for insight text
//!
//! Insights describe what already happened. Titles and descriptions come from
//! fixed past-tense templates and must never contain forward-looking or
//! advisory vocabulary.

/// Words that must not appear in any title or description
pub const FORBIDDEN_WORDS: &[&str] = &[
    "will",
    "predict",
    "forecast",
    "expect",
    "should",
    "recommend",
    "likely",
    "probably",
];

/// First forbidden word used in `text`, matched as a whole word, any case
pub fn find_forbidden_word(text: &str) -> Option<&'static str> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|w| w.trim_matches('\'').to_lowercase())
        .find_map(|word| FORBIDDEN_WORDS.iter().copied().find(|f| *f == word))
}

/// `name` when it can appear in insight text, otherwise `None`
///
/// Product and store names come from receipts and may contain forbidden words
/// themselves. Callers fall back to a generic phrase and keep the real name in
/// `underlying_data`.
pub(crate) fn quotable(name: &str) -> Option<&str> {
    match find_forbidden_word(name) {
        Some(_) => None,
        None => Some(name),
    }
}

/// Short calendar date used in descriptions ("Jan 8, 2026")
pub(crate) fn display_date(date: chrono::NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Count with its noun ("1 receipt", "3 receipts")
pub(crate) fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{} {}", n, noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_finds_whole_words_only() {
        assert_eq!(find_forbidden_word("Prices will rise"), Some("will"));
        assert_eq!(find_forbidden_word("You SHOULD buy"), Some("should"));
        assert_eq!(find_forbidden_word("We recommend it."), Some("recommend"));
        assert_eq!(find_forbidden_word("You bought milk 4 times"), None);
        assert_eq!(find_forbidden_word("Willow Tea"), None);
    }

    #[test]
    fn test_quotable_names() {
        assert_eq!(quotable("Greek Yogurt"), Some("Greek Yogurt"));
        assert_eq!(quotable("Probably Good Oats"), None);
        assert_eq!(quotable("WILL CALL MARKET"), None);
    }

    #[test]
    fn test_display_helpers() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 8).unwrap();
        assert_eq!(display_date(date), "Jan 8, 2026");
        assert_eq!(plural(1, "receipt"), "1 receipt");
        assert_eq!(plural(4, "receipt"), "4 receipts");
    }
}
