// 🏢 Company Entity - the record under review
//
// "Company id is IDENTITY (never reassigned), everything else is a VALUE"
//
// A Company is what comes OUT of validation: typed, coerced, normalized.
// While a record is being edited it lives as a loosely-typed JSON draft
// (see session.rs); `to_draft` / `CompanyValidator::validate_company` move
// between the two shapes.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::{Director, Location};

// ============================================================================
// COMPANY STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanyStatus {
    Active,
    Inactive,
    Pending,
    Dissolved,
}

impl CompanyStatus {
    pub const ALL: [CompanyStatus; 4] = [
        CompanyStatus::Active,
        CompanyStatus::Inactive,
        CompanyStatus::Pending,
        CompanyStatus::Dissolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyStatus::Active => "active",
            CompanyStatus::Inactive => "inactive",
            CompanyStatus::Pending => "pending",
            CompanyStatus::Dissolved => "dissolved",
        }
    }
}

// ============================================================================
// ENTITY TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Corporation,
    #[serde(rename = "LLC")]
    Llc,
    Partnership,
    #[serde(rename = "Sole Proprietorship")]
    SoleProprietorship,
    #[serde(rename = "Non-Profit")]
    NonProfit,
}

impl EntityType {
    pub const ALL: [EntityType; 5] = [
        EntityType::Corporation,
        EntityType::Llc,
        EntityType::Partnership,
        EntityType::SoleProprietorship,
        EntityType::NonProfit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Corporation => "Corporation",
            EntityType::Llc => "LLC",
            EntityType::Partnership => "Partnership",
            EntityType::SoleProprietorship => "Sole Proprietorship",
            EntityType::NonProfit => "Non-Profit",
        }
    }
}

// ============================================================================
// FUNDING STAGE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FundingStage {
    PreSeed,
    Seed,
    SeriesA,
    SeriesB,
    SeriesC,
    SeriesD,
    SeriesE,
    /// Listed company: ticker and stock exchange become mandatory
    Public,
    PrivateEquity,
    Bootstrapped,
}

impl FundingStage {
    pub const ALL: [FundingStage; 10] = [
        FundingStage::PreSeed,
        FundingStage::Seed,
        FundingStage::SeriesA,
        FundingStage::SeriesB,
        FundingStage::SeriesC,
        FundingStage::SeriesD,
        FundingStage::SeriesE,
        FundingStage::Public,
        FundingStage::PrivateEquity,
        FundingStage::Bootstrapped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FundingStage::PreSeed => "pre-seed",
            FundingStage::Seed => "seed",
            FundingStage::SeriesA => "series-a",
            FundingStage::SeriesB => "series-b",
            FundingStage::SeriesC => "series-c",
            FundingStage::SeriesD => "series-d",
            FundingStage::SeriesE => "series-e",
            FundingStage::Public => "public",
            FundingStage::PrivateEquity => "private-equity",
            FundingStage::Bootstrapped => "bootstrapped",
        }
    }
}

/// Shared by the three enums: parse the wire string, reject anything else.
macro_rules! impl_wire_enum {
    ($ty:ty) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| format!("unknown {}: {}", stringify!($ty), s))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_wire_enum!(CompanyStatus);
impl_wire_enum!(EntityType);
impl_wire_enum!(FundingStage);

// ============================================================================
// COMPANY ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    /// Stable identity - NEVER reassigned
    pub id: String,

    pub name: String,
    pub legal_name: String,
    pub description: String,
    pub website_url: String,
    pub company_status: CompanyStatus,
    pub entity_type: EntityType,

    /// NAICS sector; `sub_vertical` must be listed under it
    pub vertical: String,
    pub sub_vertical: String,

    #[serde(serialize_with = "serialize_amount")]
    pub annual_revenue_usd: f64,

    pub funding_stage: FundingStage,

    // Required only when funding_stage is Public
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub stock_exchange: Option<String>,

    #[serde(default)]
    pub parent_company_id: Option<String>,

    pub directors: Vec<Director>,
    pub locations: Vec<Location>,
}

impl Company {
    /// JSON draft form of this company (the shape the editor works on).
    ///
    /// Infallible: serializing into a `Value` only errors on non-string map
    /// keys, and nothing here is a map. A non-finite amount becomes null.
    pub fn to_draft(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn is_public(&self) -> bool {
        self.funding_stage == FundingStage::Public
    }

    pub fn find_director(&self, id: &str) -> Option<&Director> {
        self.directors.iter().find(|d| d.id == id)
    }

    pub fn find_location(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }
}

/// Largest integer an f64 holds exactly (2^53 - 1)
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Non-negative whole amount that fits an integer exactly
pub(crate) fn is_whole_amount(value: f64) -> bool {
    value.fract() == 0.0 && (0.0..=MAX_EXACT_INTEGER).contains(&value)
}

/// Whole amounts are written as integers (`1000000`, not `1000000.0`).
fn serialize_amount<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if is_whole_amount(*value) {
        serializer.serialize_u64(*value as u64)
    } else {
        serializer.serialize_f64(*value)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_company() -> Company {
        Company {
            id: "c1".to_string(),
            name: "Acme Corp".to_string(),
            legal_name: "Acme Corporation Inc.".to_string(),
            description: "A test company".to_string(),
            website_url: "https://acme.example.com".to_string(),
            company_status: CompanyStatus::Active,
            entity_type: EntityType::Llc,
            vertical: "Utilities".to_string(),
            sub_vertical: "Electric Power Distribution".to_string(),
            annual_revenue_usd: 1_000_000.0,
            funding_stage: FundingStage::SeriesA,
            ticker: None,
            stock_exchange: None,
            parent_company_id: None,
            directors: vec![Director {
                id: "d1".to_string(),
                name: "Jane Doe".to_string(),
                email: "jane@example.com".to_string(),
                phone: "+1-555-000-1234".to_string(),
            }],
            locations: vec![Location {
                id: "l1".to_string(),
                name: "HQ".to_string(),
                address_line1: "123 Main St".to_string(),
                city: "NYC".to_string(),
                region: "NY".to_string(),
                postal_code: "10001".to_string(),
                country_code: "US".to_string(),
            }],
        }
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(FundingStage::SeriesA.as_str(), "series-a");
        assert_eq!(FundingStage::PrivateEquity.as_str(), "private-equity");
        assert_eq!(EntityType::SoleProprietorship.as_str(), "Sole Proprietorship");

        // serde and as_str must agree for every variant
        for stage in FundingStage::ALL {
            assert_eq!(json!(stage), json!(stage.as_str()));
        }
        for entity_type in EntityType::ALL {
            assert_eq!(json!(entity_type), json!(entity_type.as_str()));
        }
        for status in CompanyStatus::ALL {
            assert_eq!(json!(status), json!(status.as_str()));
        }
    }

    #[test]
    fn test_enum_from_str() {
        assert_eq!("public".parse::<FundingStage>(), Ok(FundingStage::Public));
        assert_eq!("LLC".parse::<EntityType>(), Ok(EntityType::Llc));
        assert!("Public".parse::<FundingStage>().is_err());
        assert!("closed".parse::<CompanyStatus>().is_err());
    }

    #[test]
    fn test_draft_of_non_finite_amount() {
        let mut company = sample_company();
        company.annual_revenue_usd = f64::NAN;

        let draft = company.to_draft();

        assert!(draft.is_object());
        assert_eq!(draft["annualRevenueUsd"], serde_json::Value::Null);
        assert_eq!(draft["name"], json!("Acme Corp"));
    }

    #[test]
    fn test_draft_uses_camel_case_and_nulls() {
        let draft = sample_company().to_draft();

        assert_eq!(draft["legalName"], json!("Acme Corporation Inc."));
        assert_eq!(draft["entityType"], json!("LLC"));
        assert_eq!(draft["ticker"], json!(null));
        assert_eq!(draft["locations"][0]["addressLine1"], json!("123 Main St"));
        assert_eq!(draft["locations"][0]["countryCode"], json!("US"));
    }

    #[test]
    fn test_whole_revenue_serializes_as_integer() {
        let draft = sample_company().to_draft();
        assert_eq!(draft["annualRevenueUsd"], json!(1000000));
        assert_eq!(
            serde_json::to_string(&draft["annualRevenueUsd"]).unwrap(),
            "1000000"
        );

        let mut fractional = sample_company();
        fractional.annual_revenue_usd = 1234.5;
        assert_eq!(fractional.to_draft()["annualRevenueUsd"], json!(1234.5));
    }

    #[test]
    fn test_round_trip_through_draft() {
        let company = sample_company();
        let back: Company = serde_json::from_value(company.to_draft()).unwrap();
        assert_eq!(back, company);
    }

    #[test]
    fn test_find_items_by_id() {
        let company = sample_company();
        assert_eq!(company.find_director("d1").map(|d| d.name.as_str()), Some("Jane Doe"));
        assert!(company.find_director("d2").is_none());
        assert_eq!(company.find_location("l1").map(|l| l.city.as_str()), Some("NYC"));
        assert!(!company.is_public());
    }
}
