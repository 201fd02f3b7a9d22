//! Keyword and content patterns used by the matcher.

use std::sync::LazyLock;

use lead_model::Field;
use regex::Regex;

/// Substring keywords per field, checked against the normalized column name
/// in declaration order.
pub const KEYWORDS: &[(Field, &[&str])] = &[
    (Field::Email, &["email", "mail", "sha256", "hem"]),
    (
        Field::Phone,
        &[
            "phone", "mobile", "cell", "number", "direct", "wireless", "landline",
        ],
    ),
    (Field::Name, &["name", "first", "last", "full"]),
    (Field::Address, &["address", "street", "addr"]),
    (Field::City, &["city", "town"]),
    (Field::State, &["state", "province"]),
    (Field::ZipCode, &["zip", "postal", "postcode"]),
    (
        Field::Revenue,
        &["revenue", "worth", "income", "amount", "price"],
    ),
    (Field::CompanyName, &["company", "business", "org"]),
    (Field::JobTitle, &["job", "title", "role", "position"]),
    (Field::AgeRange, &["age", "dob"]),
    (Field::Gender, &["gender", "sex"]),
    (Field::NetWorth, &["net", "worth"]),
    (Field::Income, &["income", "salary"]),
];

static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+\d|\d{3}[-.\s]?\d{3}[-.\s]?\d{4}").expect("valid phone regex")
});

static DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}|\d{2}/\d{2}/\d{4}").expect("valid date regex")
});

static MAGNITUDE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$|\d+k|\d+m").expect("valid magnitude regex"));

/// Content shapes recognized in sample values, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Email,
    Phone,
    Date,
    Money,
    Url,
}

impl ContentKind {
    pub const ORDERED: [ContentKind; 5] = [
        ContentKind::Email,
        ContentKind::Phone,
        ContentKind::Date,
        ContentKind::Money,
        ContentKind::Url,
    ];

    /// True when the lowercased, space-joined sample text has this shape.
    pub fn detect(&self, text: &str) -> bool {
        match self {
            ContentKind::Email => text.contains('@'),
            ContentKind::Phone => PHONE_REGEX.is_match(text),
            ContentKind::Date => DATE_REGEX.is_match(text),
            ContentKind::Money => MAGNITUDE_REGEX.is_match(text),
            ContentKind::Url => text.contains("http") || text.contains("www."),
        }
    }

    /// Fields this shape can resolve to, most preferred first.
    pub fn targets(&self) -> &'static [Field] {
        match self {
            ContentKind::Email => &[Field::Email],
            ContentKind::Phone => &[Field::Phone],
            ContentKind::Date => &[Field::OrderDate, Field::VisitDate],
            ContentKind::Money => &[Field::Revenue],
            ContentKind::Url => &[Field::PageUrl, Field::Referrer],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_pattern_accepts_common_layouts() {
        assert!(ContentKind::Phone.detect("555-123-4567"));
        assert!(ContentKind::Phone.detect("555.123.4567"));
        assert!(ContentKind::Phone.detect("5551234567"));
        assert!(ContentKind::Phone.detect("+44 20 7946 0958"));
        assert!(!ContentKind::Phone.detect("12-34"));
    }

    #[test]
    fn date_pattern_accepts_iso_and_us() {
        assert!(ContentKind::Date.detect("2024-01-05"));
        assert!(ContentKind::Date.detect("01/05/2024"));
        assert!(!ContentKind::Date.detect("jan 5"));
    }

    #[test]
    fn money_pattern_accepts_symbols_and_magnitudes() {
        assert!(ContentKind::Money.detect("$100"));
        assert!(ContentKind::Money.detect("15k"));
        assert!(ContentKind::Money.detect("2m"));
        assert!(!ContentKind::Money.detect("blue"));
    }

    #[test]
    fn keyword_table_has_fourteen_entries() {
        assert_eq!(KEYWORDS.len(), 14);
        assert_eq!(KEYWORDS[0].0, Field::Email);
        assert_eq!(KEYWORDS[13].0, Field::Income);
    }
}
