//! Purchase date extraction
//!
//! Lines are scanned top to bottom and the first token that forms a real
//! calendar date wins. A date label earlier on the same line ("Date:",
//! "Purchase Date") raises confidence.

use chrono::NaiveDate;
use regex::Captures;

use super::{re, DateExtraction};

pub const LABELED_DATE_CONFIDENCE: f64 = 0.95;
pub const BARE_DATE_CONFIDENCE: f64 = 0.70;

// MM/DD/YYYY, MM-DD-YY (swapped to DD/MM when the first part can't be a month)
re!(re_numeric, r"\b(\d{1,2})[/\-](\d{1,2})[/\-](\d{4}|\d{2})\b");
// YYYY-MM-DD, YYYY/MM/DD
re!(re_iso, r"\b(\d{4})[/\-](\d{1,2})[/\-](\d{1,2})\b");
// Jan 8, 2026 / January 08 2026
re!(
    re_month_first,
    r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2}),?\s+(\d{4})\b"
);
// 8 Jan 2026
re!(
    re_day_first,
    r"(?i)\b(\d{1,2})\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?\s+(\d{4})\b"
);
re!(
    re_label,
    r"(?i)\b(?:date|dated|purchase\s+date|transaction\s+date|trans\s+date|sale\s+date)\b"
);

#[derive(Clone, Copy)]
enum Format {
    Numeric,
    Iso,
    MonthFirst,
    DayFirst,
}

pub(super) fn extract_date(text: &str) -> DateExtraction {
    for line in super::content_lines(text) {
        if let Some((start, date)) = first_date_in_line(line) {
            let labeled = re_label().is_match(&line[..start]);
            return DateExtraction {
                date: Some(date),
                confidence: if labeled {
                    LABELED_DATE_CONFIDENCE
                } else {
                    BARE_DATE_CONFIDENCE
                },
            };
        }
    }

    DateExtraction {
        date: None,
        confidence: 0.0,
    }
}

/// Earliest parseable date token in the line, with its byte offset
fn first_date_in_line(line: &str) -> Option<(usize, NaiveDate)> {
    let patterns = [
        (re_iso(), Format::Iso),
        (re_numeric(), Format::Numeric),
        (re_month_first(), Format::MonthFirst),
        (re_day_first(), Format::DayFirst),
    ];

    let mut found: Vec<(usize, NaiveDate)> = Vec::new();
    for (regex, format) in patterns {
        for caps in regex.captures_iter(line) {
            let start = caps.get(0).map_or(0, |m| m.start());
            if let Some(date) = build_date(&caps, format) {
                found.push((start, date));
            }
        }
    }

    found.into_iter().min_by_key(|(start, _)| *start)
}

fn build_date(caps: &Captures, format: Format) -> Option<NaiveDate> {
    let num = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();
    match format {
        Format::Iso => NaiveDate::from_ymd_opt(num(1)? as i32, num(2)?, num(3)?),
        Format::Numeric => {
            let (first, second) = (num(1)?, num(2)?);
            let year = expand_year(caps.get(3)?.as_str())?;
            let (month, day) = if first > 12 && second <= 12 {
                (second, first)
            } else {
                (first, second)
            };
            NaiveDate::from_ymd_opt(year, month, day)
        }
        Format::MonthFirst => {
            let month = month_number(caps.get(1)?.as_str())?;
            NaiveDate::from_ymd_opt(num(3)? as i32, month, num(2)?)
        }
        Format::DayFirst => {
            let month = month_number(caps.get(2)?.as_str())?;
            NaiveDate::from_ymd_opt(num(3)? as i32, month, num(1)?)
        }
    }
}

fn expand_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    Some(if s.len() == 2 { 2000 + year } else { year })
}

fn month_number(abbr: &str) -> Option<u32> {
    match abbr.to_lowercase().as_str() {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}
