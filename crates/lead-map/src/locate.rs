//! Finding the column that plays a logical role in an uploaded table.
//!
//! Reporting code needs "the revenue column" or "the gender column" without
//! knowing the upload's header names. A confirmed [`ColumnMapping`] is the
//! first source of truth; otherwise the locator falls back to alias lists,
//! ignoring URL-like and ID-like columns for the looser partial matches.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use lead_model::{ColumnMapping, Field, Table};

use crate::values::{parse_amount, parse_date};

const URL_NAME_INDICATORS: &[&str] = &["url", "link", "path", "domain", "website", "http", "www", ".com"];
const URL_VALUE_INDICATORS: &[&str] = &["http://", "https://", "www.", ".com/"];
const DATE_NAME_INDICATORS: &[&str] = &["date", "time", "timestamp", "created", "updated"];

/// Partial matches skip columns with more distinct values than this.
const MAX_PARTIAL_MATCH_UNIQUE: usize = 100;
/// Share of rows that must hold a positive amount for a numeric column.
const NUMERIC_ROW_SHARE: f64 = 0.1;
pub const DEFAULT_MAX_CATEGORIES: usize = 50;

/// Logical columns that reports ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Email,
    Revenue,
    Spend,
    Gender,
    Age,
    Income,
    State,
    City,
    Source,
    Campaign,
    EventType,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 11] = [
        ColumnRole::Email,
        ColumnRole::Revenue,
        ColumnRole::Spend,
        ColumnRole::Gender,
        ColumnRole::Age,
        ColumnRole::Income,
        ColumnRole::State,
        ColumnRole::City,
        ColumnRole::Source,
        ColumnRole::Campaign,
        ColumnRole::EventType,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnRole::Email => "email",
            ColumnRole::Revenue => "revenue",
            ColumnRole::Spend => "spend",
            ColumnRole::Gender => "gender",
            ColumnRole::Age => "age",
            ColumnRole::Income => "income",
            ColumnRole::State => "state",
            ColumnRole::City => "city",
            ColumnRole::Source => "source",
            ColumnRole::Campaign => "campaign",
            ColumnRole::EventType => "event_type",
        }
    }

    /// Header names tried, exact first then as substrings, in this order.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            ColumnRole::Email => &[
                "email",
                "personal_emails",
                "user_email",
                "customer_email",
                "contact_email",
                "e-mail",
                "e_mail",
                "business_email",
                "hemsha256",
                "sha256_personal_email",
                "user",
                "customer",
                "customer_id",
            ],
            ColumnRole::Revenue => &[
                "revenue",
                "amount",
                "total",
                "price",
                "order_value",
                "net_worth",
                "income",
                "company_revenue",
                "value",
                "purchase_amount",
            ],
            ColumnRole::Spend => &[
                "ad_spend",
                "marketing_cost",
                "campaign_cost",
                "advertising",
                "marketing_budget",
                "spend",
                "cost",
                "cpc",
                "cpm",
                "ad_cost",
            ],
            ColumnRole::Gender => &["gender", "sex", "customer_gender"],
            ColumnRole::Age => &[
                "age",
                "age_range",
                "age_group",
                "agegroup",
                "age_bucket",
                "age_bracket",
                "customer_age",
                "age_category",
            ],
            ColumnRole::Income => &[
                "income",
                "income_range",
                "annual_income",
                "household_income",
                "salary",
                "salary_range",
                "net_worth",
                "personal_income",
                "income_bracket",
            ],
            ColumnRole::State => &[
                "state",
                "region",
                "province",
                "personal_state",
                "company_state",
                "location_state",
                "address_state",
                "customer_state",
                "billing_state",
            ],
            ColumnRole::City => &["city", "personal_city", "company_city", "location"],
            ColumnRole::Source => &["source", "utm_source", "traffic_source", "referrerurl", "channel"],
            ColumnRole::Campaign => &["campaign", "utm_campaign", "campaign_name", "eventtype"],
            ColumnRole::EventType => &["eventtype", "event_type", "type", "action", "activity"],
        }
    }

    /// Mapped fields that satisfy the role, most specific first.
    pub fn fields(&self) -> &'static [Field] {
        match self {
            ColumnRole::Email => &[Field::Email],
            ColumnRole::Revenue => &[Field::Revenue],
            ColumnRole::Spend => &[],
            ColumnRole::Gender => &[Field::Gender],
            ColumnRole::Age => &[Field::AgeRange],
            ColumnRole::Income => &[Field::Income, Field::NetWorth],
            ColumnRole::State => &[Field::State],
            ColumnRole::City => &[Field::City, Field::Location],
            ColumnRole::Source => &[Field::Source, Field::UtmSource],
            ColumnRole::Campaign => &[Field::Campaign, Field::UtmCampaign],
            ColumnRole::EventType => &[Field::EventType],
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Demographic columns located in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    pub gender: Option<String>,
    pub age: Option<String>,
    pub income: Option<String>,
    pub state: Option<String>,
}

/// Looks up role columns in one table.
#[derive(Debug, Clone, Copy)]
pub struct ColumnLocator<'a> {
    table: &'a Table,
    mapping: Option<&'a ColumnMapping>,
}

impl<'a> ColumnLocator<'a> {
    pub fn new(table: &'a Table) -> Self {
        Self {
            table,
            mapping: None,
        }
    }

    /// Prefers columns the mapping assigns to a role's fields.
    #[must_use]
    pub fn with_mapping(mut self, mapping: &'a ColumnMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    pub fn find(&self, role: ColumnRole) -> Option<&'a str> {
        let found = self
            .find_mapped(role.fields())
            .or_else(|| self.find_by_aliases(role.aliases()));
        match found {
            Some(column) => debug!(role = %role, column, "role column located"),
            None => debug!(role = %role, "no column for role"),
        }
        found
    }

    pub fn demographics(&self) -> Demographics {
        let owned = |role| self.find(role).map(str::to_string);
        Demographics {
            gender: owned(ColumnRole::Gender),
            age: owned(ColumnRole::Age),
            income: owned(ColumnRole::Income),
            state: owned(ColumnRole::State),
        }
    }

    /// First column mapped to the earliest of `fields`; a column mapped to a
    /// more specific field wins even when it comes later in the table.
    fn find_mapped(&self, fields: &[Field]) -> Option<&'a str> {
        let mapping = self.mapping?;
        fields.iter().find_map(|wanted| {
            mapping
                .columns_for(*wanted)
                .find(|column| self.table.column_index(column).is_some())
                .and_then(|column| self.header(column))
        })
    }

    /// Exact case-insensitive match on any alias, then substring match.
    ///
    /// URL-like columns never match. Substring matches also skip columns
    /// whose distinct count exceeds `min(rows / 2, 100)`.
    pub fn find_by_aliases(&self, aliases: &[&str]) -> Option<&'a str> {
        if self.table.headers.is_empty() {
            return None;
        }

        for alias in aliases {
            let alias = alias.to_lowercase();
            let Some(header) = self
                .table
                .headers
                .iter()
                .find(|header| header.to_lowercase() == alias)
            else {
                continue;
            };
            if self.is_url_column(header) {
                continue;
            }
            return Some(header.as_str());
        }

        let unique_cap = (self.table.row_count() as f64 * 0.5).min(MAX_PARTIAL_MATCH_UNIQUE as f64);
        for alias in aliases {
            let alias = alias.to_lowercase();
            for header in &self.table.headers {
                if self.is_url_column(header) || self.unique_count(header) as f64 > unique_cap {
                    continue;
                }
                if header.to_lowercase().contains(&alias) {
                    return Some(header.as_str());
                }
            }
        }
        None
    }

    /// First non-URL column where more than a tenth of the rows hold a
    /// positive amount. `exclude` is compared case-insensitively.
    pub fn find_numeric_column(&self, exclude: &[&str]) -> Option<&'a str> {
        let threshold = self.table.row_count() as f64 * NUMERIC_ROW_SHARE;
        self.table
            .headers
            .iter()
            .filter(|header| !exclude.iter().any(|ex| ex.eq_ignore_ascii_case(header)))
            .filter(|header| !self.is_url_column(header))
            .find(|header| {
                let positive = self
                    .table
                    .column_values(header)
                    .filter(|value| parse_amount(value) > 0.0)
                    .count();
                positive as f64 > threshold
            })
            .map(String::as_str)
    }

    /// First column named like a date whose first value parses as one.
    pub fn find_date_column(&self) -> Option<&'a str> {
        self.table
            .headers
            .iter()
            .filter(|header| {
                let lower = header.to_lowercase();
                DATE_NAME_INDICATORS.iter().any(|kw| lower.contains(kw))
            })
            .find(|header| {
                self.table
                    .non_empty_values(header)
                    .next()
                    .and_then(parse_date)
                    .is_some()
            })
            .map(String::as_str)
    }

    /// First non-URL text column with more than two and fewer than
    /// `max_unique` distinct values.
    pub fn find_categorical_column(&self, max_unique: usize) -> Option<&'a str> {
        self.table
            .headers
            .iter()
            .filter(|header| !self.is_url_column(header))
            .filter(|header| !self.is_numeric_text(header))
            .find(|header| {
                let unique = self.unique_count(header);
                unique > 2 && unique < max_unique
            })
            .map(String::as_str)
    }

    /// Name mentions a URL part, or the first cell looks like a link.
    pub fn is_url_column(&self, column: &str) -> bool {
        let lower = column.to_lowercase();
        if URL_NAME_INDICATORS.iter().any(|ind| lower.contains(ind)) {
            return true;
        }
        self.table
            .column_values(column)
            .next()
            .map(str::to_lowercase)
            .is_some_and(|first| URL_VALUE_INDICATORS.iter().any(|ind| first.contains(ind)))
    }

    fn unique_count(&self, column: &str) -> usize {
        self.table
            .non_empty_values(column)
            .collect::<BTreeSet<_>>()
            .len()
    }

    fn is_numeric_text(&self, column: &str) -> bool {
        let mut values = self.table.non_empty_values(column).peekable();
        values.peek().is_some() && values.all(|value| value.parse::<f64>().is_ok())
    }

    fn header(&self, name: &str) -> Option<&'a str> {
        self.table
            .headers
            .iter()
            .find(|header| header.as_str() == name)
            .map(String::as_str)
    }
}
