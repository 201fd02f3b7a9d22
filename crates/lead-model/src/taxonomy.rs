//! Canonical field taxonomy for uploaded record sets.
//!
//! Every uploaded file is declared as either a buyers file or a visitors
//! file. Each category carries an ordered list of required fields followed by
//! an ordered list of optional fields; a column can only ever be mapped to one
//! of these. Enumeration order matters to the matcher, so both lists are kept
//! exactly as declared here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// The declared kind of an uploaded record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Buyers,
    Visitors,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Buyers, Category::Visitors];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Buyers => "buyers",
            Category::Visitors => "visitors",
        }
    }

    /// Returns the field set declared for this category.
    pub fn fields(&self) -> &'static FieldSet {
        fields_for(*self)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buyers" => Ok(Category::Buyers),
            "visitors" => Ok(Category::Visitors),
            _ => Err(ModelError::UnknownCategory(s.to_string())),
        }
    }
}

/// A canonical field a column can be mapped to.
///
/// The vocabulary is closed: it is the union of the buyers and visitors
/// taxonomies. Serialized in snake_case (`order_date`, `utm_source`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Email,
    Name,
    OrderDate,
    Revenue,
    Product,
    Quantity,
    CustomerId,
    Phone,
    Address,
    City,
    State,
    Country,
    ZipCode,
    PaymentMethod,
    OrderId,
    Status,
    Discount,
    Tax,
    ShippingCost,
    NetWorth,
    Income,
    AgeRange,
    Gender,
    CompanyName,
    CompanyRevenue,
    JobTitle,
    Department,
    SeniorityLevel,
    VisitDate,
    Source,
    Campaign,
    Device,
    PageUrl,
    SessionId,
    Referrer,
    UtmSource,
    UtmMedium,
    UtmCampaign,
    Browser,
    Os,
    IpAddress,
    Location,
    Duration,
    EventType,
    PixelId,
    Uuid,
    UserAgent,
}

impl Field {
    pub const ALL: [Field; 47] = [
        Field::Email,
        Field::Name,
        Field::OrderDate,
        Field::Revenue,
        Field::Product,
        Field::Quantity,
        Field::CustomerId,
        Field::Phone,
        Field::Address,
        Field::City,
        Field::State,
        Field::Country,
        Field::ZipCode,
        Field::PaymentMethod,
        Field::OrderId,
        Field::Status,
        Field::Discount,
        Field::Tax,
        Field::ShippingCost,
        Field::NetWorth,
        Field::Income,
        Field::AgeRange,
        Field::Gender,
        Field::CompanyName,
        Field::CompanyRevenue,
        Field::JobTitle,
        Field::Department,
        Field::SeniorityLevel,
        Field::VisitDate,
        Field::Source,
        Field::Campaign,
        Field::Device,
        Field::PageUrl,
        Field::SessionId,
        Field::Referrer,
        Field::UtmSource,
        Field::UtmMedium,
        Field::UtmCampaign,
        Field::Browser,
        Field::Os,
        Field::IpAddress,
        Field::Location,
        Field::Duration,
        Field::EventType,
        Field::PixelId,
        Field::Uuid,
        Field::UserAgent,
    ];

    /// Returns the canonical snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Email => "email",
            Field::Name => "name",
            Field::OrderDate => "order_date",
            Field::Revenue => "revenue",
            Field::Product => "product",
            Field::Quantity => "quantity",
            Field::CustomerId => "customer_id",
            Field::Phone => "phone",
            Field::Address => "address",
            Field::City => "city",
            Field::State => "state",
            Field::Country => "country",
            Field::ZipCode => "zip_code",
            Field::PaymentMethod => "payment_method",
            Field::OrderId => "order_id",
            Field::Status => "status",
            Field::Discount => "discount",
            Field::Tax => "tax",
            Field::ShippingCost => "shipping_cost",
            Field::NetWorth => "net_worth",
            Field::Income => "income",
            Field::AgeRange => "age_range",
            Field::Gender => "gender",
            Field::CompanyName => "company_name",
            Field::CompanyRevenue => "company_revenue",
            Field::JobTitle => "job_title",
            Field::Department => "department",
            Field::SeniorityLevel => "seniority_level",
            Field::VisitDate => "visit_date",
            Field::Source => "source",
            Field::Campaign => "campaign",
            Field::Device => "device",
            Field::PageUrl => "page_url",
            Field::SessionId => "session_id",
            Field::Referrer => "referrer",
            Field::UtmSource => "utm_source",
            Field::UtmMedium => "utm_medium",
            Field::UtmCampaign => "utm_campaign",
            Field::Browser => "browser",
            Field::Os => "os",
            Field::IpAddress => "ip_address",
            Field::Location => "location",
            Field::Duration => "duration",
            Field::EventType => "event_type",
            Field::PixelId => "pixel_id",
            Field::Uuid => "uuid",
            Field::UserAgent => "user_agent",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = ModelError;

    /// Exact match on the canonical name. External suggestions are validated
    /// through this, so no case folding or fuzzy repair happens here.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| ModelError::UnknownField(s.to_string()))
    }
}

/// Required and optional fields of one category, in declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSet {
    pub required: &'static [Field],
    pub optional: &'static [Field],
}

impl FieldSet {
    /// Required fields first, then optional fields.
    pub fn candidates(&self) -> impl Iterator<Item = Field> + '_ {
        self.required.iter().chain(self.optional.iter()).copied()
    }

    pub fn to_vec(&self) -> Vec<Field> {
        self.candidates().collect()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.candidates().any(|candidate| candidate == field)
    }

    pub fn is_required(&self, field: Field) -> bool {
        self.required.contains(&field)
    }

    pub fn len(&self) -> usize {
        self.required.len() + self.optional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

static BUYERS: FieldSet = FieldSet {
    required: &[Field::Email, Field::Name, Field::OrderDate, Field::Revenue],
    optional: &[
        Field::Product,
        Field::Quantity,
        Field::CustomerId,
        Field::Phone,
        Field::Address,
        Field::City,
        Field::State,
        Field::Country,
        Field::ZipCode,
        Field::PaymentMethod,
        Field::OrderId,
        Field::Status,
        Field::Discount,
        Field::Tax,
        Field::ShippingCost,
        Field::NetWorth,
        Field::Income,
        Field::AgeRange,
        Field::Gender,
        Field::CompanyName,
        Field::CompanyRevenue,
        Field::JobTitle,
        Field::Department,
        Field::SeniorityLevel,
    ],
};

static VISITORS: FieldSet = FieldSet {
    required: &[Field::Email, Field::VisitDate],
    optional: &[
        Field::Source,
        Field::Campaign,
        Field::Device,
        Field::PageUrl,
        Field::SessionId,
        Field::Referrer,
        Field::UtmSource,
        Field::UtmMedium,
        Field::UtmCampaign,
        Field::Browser,
        Field::Os,
        Field::IpAddress,
        Field::Location,
        Field::Duration,
        Field::EventType,
        Field::PixelId,
        Field::Uuid,
        Field::UserAgent,
    ],
};

/// Returns the closed vocabulary for a category.
pub fn fields_for(category: Category) -> &'static FieldSet {
    match category {
        Category::Buyers => &BUYERS,
        Category::Visitors => &VISITORS,
    }
}
