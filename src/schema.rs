// 📐 Shape Layer - Schema Validation
// Validates company drafts against field rules and cross-field rules
//
// Two passes, always both:
// 1. Field pass   - types, required strings, formats, enum membership, coercion
// 2. Cross pass   - vertical/sub-vertical pairing, public-company listing,
//                   non-empty director/location collections
//
// Every issue from both passes is returned together, so a blocked export
// can show the user everything that is wrong at once.

use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use url::Url;

use crate::entities::company::is_whole_amount;
use crate::entities::{Company, CompanyStatus, Director, EntityType, FundingStage, Location};
use crate::path::Collection;
use crate::reference::ReferenceData;

// ============================================================================
// ISSUES
// ============================================================================

/// A single validation failure: where, and what is wrong
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Dot/index path, e.g. `directors.0.email` (empty for the whole record)
    pub path: String,
    pub message: String,
}

impl Issue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Issue {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

impl std::error::Error for Issue {}

pub type ValidationResult<T> = Result<T, Vec<Issue>>;

// ============================================================================
// PATTERNS
// ============================================================================

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
            .expect("email pattern compiles")
    })
}

fn phone_pattern() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^\+?[\d\s\-()]{7,}$").expect("phone pattern compiles"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email) && !email.starts_with('.') && !email.contains("..")
}

/// Optional leading `+`, then digits/spaces/hyphens/parentheses, at least
/// 7 characters and at least 3 digits
pub fn is_valid_phone(phone: &str) -> bool {
    phone_pattern().is_match(phone) && phone.chars().filter(|c| c.is_ascii_digit()).count() >= 3
}

/// Absolute URL written with a literal `http://` or `https://` prefix.
/// `Url::parse` repairs `HTTPS://` and `https:x.com`, so the raw text is
/// checked as well.
pub fn check_website_url(raw: &str) -> Result<Url, &'static str> {
    let url = Url::parse(raw).map_err(|_| "Must be a valid URL")?;
    let literal_scheme = raw.starts_with("http://") || raw.starts_with("https://");
    match url.scheme() {
        "http" | "https" if literal_scheme && url.has_host() => Ok(url),
        _ => Err("Must be an HTTP or HTTPS URL"),
    }
}

/// Finite number written in `s` (surrounding whitespace ignored).
/// Accepts in-progress input such as `"1234."`.
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Keystroke filter for amount input: digits and `.` only
pub fn sanitize_amount_input(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect()
}

/// JSON number for an amount; whole amounts become integers, as on export
pub fn amount_value(n: f64) -> Value {
    if is_whole_amount(n) {
        Value::from(n as u64)
    } else {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

/// Loose numeric coercion: numbers pass through, numeric strings are
/// parsed. Blank, non-numeric and non-finite input yields `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// FIELD CHECKER
// ============================================================================

/// Collects issues for one object, prefixing every path
struct FieldChecker<'a> {
    obj: &'a Map<String, Value>,
    prefix: String,
    issues: &'a mut Vec<Issue>,
}

impl<'a> FieldChecker<'a> {
    fn path(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn push(&mut self, key: &str, message: impl Into<String>) {
        let path = self.path(key);
        self.issues.push(Issue::new(path, message));
    }

    /// Present and a string (may be empty)
    fn string(&mut self, key: &str) -> Option<String> {
        match self.obj.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                let message = format!("Expected string, received {}", type_name(other));
                self.push(key, message);
                None
            }
            None => {
                self.push(key, "Required");
                None
            }
        }
    }

    /// Present, a string, and non-empty
    fn required_string(&mut self, key: &str, message: &str) -> Option<String> {
        let s = self.string(key)?;
        if s.is_empty() {
            self.push(key, message);
            return None;
        }
        Some(s)
    }

    /// String or null; empty string becomes null when `empty_is_null`
    fn nullable_string(&mut self, key: &str, empty_is_null: bool) -> Option<Option<String>> {
        match self.obj.get(key) {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(s)) if s.is_empty() && empty_is_null => Some(None),
            Some(Value::String(s)) => Some(Some(s.clone())),
            Some(other) => {
                let message = format!("Expected string, received {}", type_name(other));
                self.push(key, message);
                None
            }
        }
    }

    fn choice<T: FromStr + Copy>(&mut self, key: &str, options: &[&str]) -> Option<T> {
        let s = self.string(key)?;
        match s.parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                let expected = options
                    .iter()
                    .map(|o| format!("\"{}\"", o))
                    .collect::<Vec<_>>()
                    .join("|");
                self.push(key, format!("Invalid option: expected one of {}", expected));
                None
            }
        }
    }

    fn non_negative_number(&mut self, key: &str, negative_message: &str) -> Option<f64> {
        match self.obj.get(key).and_then(coerce_number) {
            Some(n) if n < 0.0 => {
                self.push(key, negative_message);
                None
            }
            Some(n) => Some(n),
            None => {
                self.push(key, "Must be a number");
                None
            }
        }
    }
}

// ============================================================================
// COMPANY VALIDATOR
// ============================================================================

pub struct CompanyValidator {
    reference: ReferenceData,
}

impl CompanyValidator {
    pub fn new(reference: ReferenceData) -> Self {
        CompanyValidator { reference }
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Validate a full company draft (both passes).
    ///
    /// On success returns the coerced record: revenue as a number, empty
    /// ticker/stock exchange as null.
    pub fn validate_company(&self, candidate: &Value) -> ValidationResult<Company> {
        let mut issues = Vec::new();

        let obj = match candidate.as_object() {
            Some(obj) => obj,
            None => {
                return Err(vec![Issue::new(
                    "",
                    format!("Expected object, received {}", type_name(candidate)),
                )])
            }
        };

        let fields = self.check_company_fields(obj, &mut issues);
        self.check_cross_field(obj, &mut issues);

        if !issues.is_empty() {
            return Err(issues);
        }

        fields
            .into_company()
            .ok_or_else(|| vec![Issue::new("", "Company could not be built")])
    }

    /// Validate a single director item on its own
    pub fn validate_director(&self, candidate: &Value) -> ValidationResult<Director> {
        let mut issues = Vec::new();
        let director = self.check_director(candidate, "", &mut issues);
        finish(director, issues)
    }

    /// Validate a single location item on its own
    pub fn validate_location(&self, candidate: &Value) -> ValidationResult<Location> {
        let mut issues = Vec::new();
        let location = self.check_location(candidate, "", &mut issues);
        finish(location, issues)
    }

    /// Every issue in a draft, empty when it is valid
    pub fn issues(&self, candidate: &Value) -> Vec<Issue> {
        self.validate_company(candidate).err().unwrap_or_default()
    }

    // ------------------------------------------------------------------------
    // Pass 1: field rules
    // ------------------------------------------------------------------------

    fn check_company_fields(&self, obj: &Map<String, Value>, issues: &mut Vec<Issue>) -> CompanyFields {
        let mut c = FieldChecker {
            obj,
            prefix: String::new(),
            issues: &mut *issues,
        };

        let statuses: Vec<&str> = self.reference.statuses().iter().map(|s| s.as_str()).collect();
        let entity_types: Vec<&str> = self.reference.entity_types().iter().map(|e| e.as_str()).collect();
        let stages: Vec<&str> = self.reference.funding_stages().iter().map(|f| f.as_str()).collect();

        let mut fields = CompanyFields {
            id: c.string("id"),
            name: c.required_string("name", "Company name is required"),
            legal_name: c.required_string("legalName", "Legal name is required"),
            description: c.required_string("description", "Description is required"),
            website_url: None,
            company_status: c.choice::<CompanyStatus>("companyStatus", &statuses),
            entity_type: c.choice::<EntityType>("entityType", &entity_types),
            vertical: None,
            sub_vertical: None,
            annual_revenue_usd: c.non_negative_number("annualRevenueUsd", "Revenue must be non-negative"),
            funding_stage: c.choice::<FundingStage>("fundingStage", &stages),
            ticker: c.nullable_string("ticker", true),
            stock_exchange: c.nullable_string("stockExchange", true),
            parent_company_id: c.nullable_string("parentCompanyId", false),
            directors: None,
            locations: None,
        };

        fields.website_url = c.string("websiteUrl").and_then(|raw| match check_website_url(&raw) {
            Ok(_) => Some(raw),
            Err(message) => {
                c.push("websiteUrl", message);
                None
            }
        });

        fields.vertical = c.string("vertical").and_then(|v| {
            if self.reference.is_valid_vertical(&v) {
                Some(v)
            } else {
                c.push("vertical", "Must be a valid NAICS sector");
                None
            }
        });
        fields.sub_vertical = c.required_string("subVertical", "Sub-vertical is required");

        fields.directors = self.check_items(obj, Collection::Directors, issues, |v, prefix, issues| {
            self.check_director(v, prefix, issues)
        });
        fields.locations = self.check_items(obj, Collection::Locations, issues, |v, prefix, issues| {
            self.check_location(v, prefix, issues)
        });

        fields
    }

    /// Validate every item of an array field; `None` if any item failed
    fn check_items<T>(
        &self,
        obj: &Map<String, Value>,
        collection: Collection,
        issues: &mut Vec<Issue>,
        check: impl Fn(&Value, &str, &mut Vec<Issue>) -> Option<T>,
    ) -> Option<Vec<T>> {
        let key = collection.key();
        let items = match obj.get(key) {
            Some(Value::Array(items)) => items,
            Some(other) => {
                issues.push(Issue::new(
                    key,
                    format!("Expected array, received {}", type_name(other)),
                ));
                return None;
            }
            None => {
                issues.push(Issue::new(key, "Required"));
                return None;
            }
        };

        let checked: Vec<Option<T>> = items
            .iter()
            .enumerate()
            .map(|(i, item)| check(item, &format!("{}.{}.", key, i), issues))
            .collect();

        checked.into_iter().collect()
    }

    fn check_director(&self, candidate: &Value, prefix: &str, issues: &mut Vec<Issue>) -> Option<Director> {
        let obj = match object_or_issue(candidate, prefix, issues) {
            Some(obj) => obj,
            None => return None,
        };
        let mut c = FieldChecker {
            obj,
            prefix: prefix.to_string(),
            issues,
        };

        let id = c.string("id");
        let name = c.required_string("name", "Name is required");

        let email = c.string("email").and_then(|email| {
            if is_valid_email(&email) {
                Some(email)
            } else {
                c.push("email", "Valid email is required");
                None
            }
        });

        let phone = c.required_string("phone", "Phone is required").and_then(|phone| {
            if is_valid_phone(&phone) {
                Some(phone)
            } else {
                c.push("phone", "Must be a valid phone number");
                None
            }
        });

        Some(Director {
            id: id?,
            name: name?,
            email: email?,
            phone: phone?,
        })
    }

    fn check_location(&self, candidate: &Value, prefix: &str, issues: &mut Vec<Issue>) -> Option<Location> {
        let obj = match object_or_issue(candidate, prefix, issues) {
            Some(obj) => obj,
            None => return None,
        };
        let mut c = FieldChecker {
            obj,
            prefix: prefix.to_string(),
            issues,
        };

        let id = c.string("id");
        let name = c.required_string("name", "Location name is required");
        let address_line1 = c.required_string("addressLine1", "Address is required");
        let city = c.required_string("city", "City is required");
        let region = c.required_string("region", "Region is required");
        let postal_code = c.required_string("postalCode", "Postal code is required");

        let country_code = c
            .required_string("countryCode", "Country code is required")
            .and_then(|code| {
                if self.reference.is_valid_country(&code) {
                    Some(code)
                } else {
                    c.push("countryCode", "Must be a valid ISO 3166-1 alpha-2 country code");
                    None
                }
            });

        Some(Location {
            id: id?,
            name: name?,
            address_line1: address_line1?,
            city: city?,
            region: region?,
            postal_code: postal_code?,
            country_code: country_code?,
        })
    }

    // ------------------------------------------------------------------------
    // Pass 2: cross-field / cross-entity rules
    // ------------------------------------------------------------------------

    /// Reads raw values leniently, so it runs whatever pass 1 found
    fn check_cross_field(&self, obj: &Map<String, Value>, issues: &mut Vec<Issue>) {
        let text = |key: &str| obj.get(key).and_then(Value::as_str).unwrap_or("");

        let vertical = text("vertical");
        let sub_vertical = text("subVertical");
        if let Some(naics) = self.reference.find_vertical(vertical) {
            // An empty sub-vertical is already reported as required
            if !sub_vertical.is_empty() && !naics.contains(sub_vertical) {
                issues.push(Issue::new(
                    "subVertical",
                    format!(
                        "\"{}\" is not a valid sub-vertical for \"{}\"",
                        sub_vertical, vertical
                    ),
                ));
            }
        }

        if text("fundingStage") == FundingStage::Public.as_str() {
            if text("ticker").is_empty() {
                issues.push(Issue::new("ticker", "Ticker is required for public companies"));
            }
            if text("stockExchange").is_empty() {
                issues.push(Issue::new(
                    "stockExchange",
                    "Stock exchange is required for public companies",
                ));
            }
        }

        for (collection, message) in [
            (Collection::Directors, "At least one director is required"),
            (Collection::Locations, "At least one location is required"),
        ] {
            if let Some(Value::Array(items)) = obj.get(collection.key()) {
                if items.is_empty() {
                    issues.push(Issue::new(collection.key(), message));
                }
            }
        }
    }
}

fn object_or_issue<'a>(
    candidate: &'a Value,
    prefix: &str,
    issues: &mut Vec<Issue>,
) -> Option<&'a Map<String, Value>> {
    match candidate.as_object() {
        Some(obj) => Some(obj),
        None => {
            issues.push(Issue::new(
                prefix.trim_end_matches('.'),
                format!("Expected object, received {}", type_name(candidate)),
            ));
            None
        }
    }
}

fn finish<T>(value: Option<T>, issues: Vec<Issue>) -> ValidationResult<T> {
    match value {
        Some(v) if issues.is_empty() => Ok(v),
        _ => Err(issues),
    }
}

/// Pass-1 results, one slot per company field
struct CompanyFields {
    id: Option<String>,
    name: Option<String>,
    legal_name: Option<String>,
    description: Option<String>,
    website_url: Option<String>,
    company_status: Option<CompanyStatus>,
    entity_type: Option<EntityType>,
    vertical: Option<String>,
    sub_vertical: Option<String>,
    annual_revenue_usd: Option<f64>,
    funding_stage: Option<FundingStage>,
    ticker: Option<Option<String>>,
    stock_exchange: Option<Option<String>>,
    parent_company_id: Option<Option<String>>,
    directors: Option<Vec<Director>>,
    locations: Option<Vec<Location>>,
}

impl CompanyFields {
    fn into_company(self) -> Option<Company> {
        Some(Company {
            id: self.id?,
            name: self.name?,
            legal_name: self.legal_name?,
            description: self.description?,
            website_url: self.website_url?,
            company_status: self.company_status?,
            entity_type: self.entity_type?,
            vertical: self.vertical?,
            sub_vertical: self.sub_vertical?,
            annual_revenue_usd: self.annual_revenue_usd?,
            funding_stage: self.funding_stage?,
            ticker: self.ticker?,
            stock_exchange: self.stock_exchange?,
            parent_company_id: self.parent_company_id?,
            directors: self.directors?,
            locations: self.locations?,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
