// 🏛️ Attribute Registry - every editable field, described once
//
// The registry answers, for any field path:
// - Is this field editable at all?
// - What kind of value does it hold (free text, choice, number, ...)?
// - How should the editor label it?
//
// Validation rules live in schema.rs; the registry only describes shape.

use crate::path::{Collection, FieldPath};

// ============================================================================
// ATTRIBUTE TYPES
// ============================================================================

/// Where a choice field takes its options from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceSource {
    CompanyStatus,
    EntityType,
    FundingStage,
    Vertical,
    /// Depends on the currently selected vertical
    SubVertical,
    Country,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    Text,
    LongText,
    Url,
    Email,
    Phone,
    /// Loosely typed while editing, coerced to a number on validation
    Number,
    /// Empty input is stored as null
    NullableText,
    Choice(ChoiceSource),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Company,
    Item(Collection),
}

// ============================================================================
// ATTRIBUTE DEFINITION
// ============================================================================

#[derive(Debug, Clone)]
pub struct AttributeDefinition {
    pub scope: Scope,

    /// Draft key (camelCase, as in the JSON document)
    pub key: &'static str,

    /// Human-readable label
    pub label: &'static str,

    pub type_: AttributeType,

    pub placeholder: Option<&'static str>,

    /// Only shown/required while funding stage is "public"
    pub public_only: bool,
}

impl AttributeDefinition {
    pub fn new(scope: Scope, key: &'static str, label: &'static str, type_: AttributeType) -> Self {
        AttributeDefinition {
            scope,
            key,
            label,
            type_,
            placeholder: None,
            public_only: false,
        }
    }

    /// Builder: add placeholder text
    pub fn with_placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    /// Builder: mark as public-company only
    pub fn public_only(mut self) -> Self {
        self.public_only = true;
        self
    }
}

// ============================================================================
// ATTRIBUTE REGISTRY
// ============================================================================

pub struct AttributeRegistry {
    attributes: Vec<AttributeDefinition>,
}

impl AttributeRegistry {
    /// Registry with every field of the company review form
    pub fn new() -> Self {
        let mut registry = AttributeRegistry {
            attributes: Vec::new(),
        };

        registry.register_company_attributes();
        registry.register_item_attributes();
        registry
    }

    fn register_company_attributes(&mut self) {
        use AttributeType::*;
        let company = Scope::Company;

        // ====================================================================
        // IDENTITY
        // ====================================================================
        self.register(AttributeDefinition::new(company, "name", "Company Name", Text));
        self.register(AttributeDefinition::new(company, "legalName", "Legal Name", Text));
        self.register(AttributeDefinition::new(company, "description", "Description", LongText));
        self.register(
            AttributeDefinition::new(company, "websiteUrl", "Website URL", Url)
                .with_placeholder("https://"),
        );
        self.register(AttributeDefinition::new(
            company,
            "companyStatus",
            "Company Status",
            Choice(ChoiceSource::CompanyStatus),
        ));
        self.register(AttributeDefinition::new(
            company,
            "entityType",
            "Entity Type",
            Choice(ChoiceSource::EntityType),
        ));

        // ====================================================================
        // CLASSIFICATION
        // ====================================================================
        self.register(AttributeDefinition::new(
            company,
            "vertical",
            "Vertical",
            Choice(ChoiceSource::Vertical),
        ));
        self.register(AttributeDefinition::new(
            company,
            "subVertical",
            "Sub-Vertical",
            Choice(ChoiceSource::SubVertical),
        ));

        // ====================================================================
        // FINANCIALS
        // ====================================================================
        self.register(
            AttributeDefinition::new(company, "annualRevenueUsd", "Annual Revenue (USD)", Number)
                .with_placeholder("0"),
        );
        self.register(AttributeDefinition::new(
            company,
            "fundingStage",
            "Funding Stage",
            Choice(ChoiceSource::FundingStage),
        ));
        self.register(
            AttributeDefinition::new(company, "ticker", "Ticker", NullableText)
                .with_placeholder("e.g. AAPL")
                .public_only(),
        );
        self.register(
            AttributeDefinition::new(company, "stockExchange", "Stock Exchange", NullableText)
                .with_placeholder("e.g. NYSE")
                .public_only(),
        );
    }

    fn register_item_attributes(&mut self) {
        use AttributeType::*;
        let directors = Scope::Item(Collection::Directors);
        let locations = Scope::Item(Collection::Locations);

        self.register(AttributeDefinition::new(directors, "name", "Name", Text));
        self.register(
            AttributeDefinition::new(directors, "email", "Email", Email)
                .with_placeholder("name@example.com"),
        );
        self.register(
            AttributeDefinition::new(directors, "phone", "Phone", Phone)
                .with_placeholder("+1 555 000 0000"),
        );

        self.register(
            AttributeDefinition::new(locations, "name", "Location Name", Text)
                .with_placeholder("e.g. Head Office"),
        );
        self.register(
            AttributeDefinition::new(locations, "addressLine1", "Address", Text)
                .with_placeholder("Street address"),
        );
        self.register(AttributeDefinition::new(locations, "city", "City", Text));
        self.register(
            AttributeDefinition::new(locations, "region", "Region", Text)
                .with_placeholder("State / Province"),
        );
        self.register(AttributeDefinition::new(locations, "postalCode", "Postal Code", Text));
        self.register(AttributeDefinition::new(
            locations,
            "countryCode",
            "Country",
            Choice(ChoiceSource::Country),
        ));
    }

    pub fn register(&mut self, attribute: AttributeDefinition) {
        self.attributes.push(attribute);
    }

    pub fn get(&self, scope: Scope, key: &str) -> Option<&AttributeDefinition> {
        self.attributes
            .iter()
            .find(|a| a.scope == scope && a.key == key)
    }

    /// Definition behind a field path, `None` if the field is not editable
    pub fn resolve(&self, path: &FieldPath) -> Option<&AttributeDefinition> {
        match path {
            FieldPath::Scalar(key) => self.get(Scope::Company, key),
            FieldPath::Item {
                collection, field, ..
            } => self.get(Scope::Item(*collection), field),
        }
    }

    /// Attributes of one scope, in form order
    pub fn in_scope(&self, scope: Scope) -> impl Iterator<Item = &AttributeDefinition> {
        self.attributes.iter().filter(move |a| a.scope == scope)
    }

    pub fn count(&self) -> usize {
        self.attributes.len()
    }
}

impl Default for AttributeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_initialization() {
        let registry = AttributeRegistry::new();

        assert_eq!(registry.in_scope(Scope::Company).count(), 12);
        assert_eq!(registry.in_scope(Scope::Item(Collection::Directors)).count(), 3);
        assert_eq!(registry.in_scope(Scope::Item(Collection::Locations)).count(), 6);
        assert_eq!(registry.count(), 21);
    }

    #[test]
    fn test_resolve_paths() {
        let registry = AttributeRegistry::new();

        let email = registry.resolve(&"directors.3.email".parse().unwrap()).unwrap();
        assert_eq!(email.type_, AttributeType::Email);

        let country = registry.resolve(&"locations.0.countryCode".parse().unwrap()).unwrap();
        assert_eq!(country.type_, AttributeType::Choice(ChoiceSource::Country));

        let ticker = registry.resolve(&FieldPath::scalar("ticker")).unwrap();
        assert!(ticker.public_only);
        assert_eq!(ticker.type_, AttributeType::NullableText);
    }

    #[test]
    fn test_identity_fields_are_not_editable() {
        let registry = AttributeRegistry::new();

        assert!(registry.resolve(&FieldPath::scalar("id")).is_none());
        assert!(registry.resolve(&"directors.0.id".parse().unwrap()).is_none());
        assert!(registry.resolve(&FieldPath::scalar("parentCompanyId")).is_none());
        assert!(registry.resolve(&"directors.0.city".parse().unwrap()).is_none());
    }

    #[test]
    fn test_form_order_preserved() {
        let registry = AttributeRegistry::new();
        let keys: Vec<&str> = registry
            .in_scope(Scope::Item(Collection::Directors))
            .map(|a| a.key)
            .collect();

        assert_eq!(keys, vec!["name", "email", "phone"]);
    }
}
