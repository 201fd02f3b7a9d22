//! Lenient parsing of free-form cell values.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parses amounts such as `"$1,200"`, `"2.5 million"`, `"15k"`,
/// `"50k to 100k"` (midpoint), `"under 20k"` (half) or `"1m and over"`
/// (one and a half times). Returns 0 for anything unreadable.
pub fn parse_amount(raw: &str) -> f64 {
    let lowered = raw.trim().to_lowercase();
    if matches!(lowered.as_str(), "" | "nan" | "none" | "null") {
        return 0.0;
    }
    let text = lowered.replace(['$', ','], "");

    if text.contains("under") {
        let rest = text.replace("under", "");
        return scaled(&rest).map_or(0.0, |value| value / 2.0);
    }
    if text.contains("over") {
        let rest = text.replace("and over", "").replace("andover", "").replace("over", "");
        return scaled(&rest).map_or(0.0, |value| value * 1.5);
    }
    if let Some((low, high)) = text.split_once(" to ") {
        return match (scaled(low), scaled(high)) {
            (Some(low), Some(high)) => (low + high) / 2.0,
            _ => 0.0,
        };
    }
    if let Some(value) = scaled(&text) {
        return value;
    }

    let digits: String = text
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.')
        .collect();
    digits.parse().unwrap_or(0.0)
}

/// `"<number>[suffix] [suffix]"` with an optional magnitude word.
fn scaled(text: &str) -> Option<f64> {
    let mut tokens = text.split_whitespace();
    let first = tokens.next()?;
    let split = first
        .find(|ch: char| !(ch.is_ascii_digit() || ch == '.' || ch == '-'))
        .unwrap_or(first.len());
    let (number, glued) = first.split_at(split);
    let number: f64 = number.parse().ok()?;
    let suffix = if glued.is_empty() {
        tokens.next().unwrap_or("")
    } else {
        glued
    };
    Some(number * multiplier(suffix))
}

fn multiplier(suffix: &str) -> f64 {
    match suffix.trim() {
        "thousand" | "k" => 1e3,
        "million" | "m" | "mil" => 1e6,
        "billion" | "b" | "bil" => 1e9,
        "trillion" | "t" => 1e12,
        _ => 1.0,
    }
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%b %d %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parses the date part of common date and timestamp layouts.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim().replace(',', "");
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&value) {
        return Some(parsed.date_naive());
    }
    let without_fraction = value.split('.').next().unwrap_or(&value);
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(without_fraction, format).ok())
        .map(|parsed| parsed.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(&value, format).ok())
        })
}
