// 📦 Dataset - the pristine records under review
//
// A dataset is one JSON document:
//
//   { "naicsReference": [ { "vertical": ..., "subVerticals": [...] } ],
//     "companies":      [ { "id": ..., "name": ..., ... } ] }
//
// Records stay loosely typed (serde_json::Value): the review exists to
// correct data that may not validate yet. Loading never fails on bad
// records; the shape check reports them as diagnostics and moves on.

use serde_json::Value;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

use crate::error::Result;
use crate::reference::{NaicsReference, ReferenceData};

const SAMPLE_DATASET: &str = include_str!("../data/sample-companies.json");

// ============================================================================
// SHAPE DIAGNOSTICS
// ============================================================================

/// Non-fatal structural problem found while loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeDiagnostic {
    pub path: String,
    pub message: String,
}

impl ShapeDiagnostic {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ShapeDiagnostic {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ShapeDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

// ============================================================================
// SOURCE RECORD
// ============================================================================

/// One company exactly as loaded. Never mutated after load.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub id: String,

    /// Display name at load time (empty if the record had none)
    pub name: String,

    pub value: Value,
}

// ============================================================================
// DATASET
// ============================================================================

#[derive(Debug, Clone)]
pub struct Dataset {
    naics: Vec<NaicsReference>,
    records: Vec<SourceRecord>,
    diagnostics: Vec<ShapeDiagnostic>,
}

impl Dataset {
    /// Parse a dataset document. Only malformed JSON is an error.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(root))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let dataset = Self::from_json_str(&contents)?;

        info!(
            path = %path.display(),
            companies = dataset.records.len(),
            verticals = dataset.naics.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    /// The dataset bundled with the binary
    pub fn sample() -> Result<Self> {
        Self::from_json_str(SAMPLE_DATASET)
    }

    fn from_value(root: Value) -> Self {
        let mut diagnostics = Vec::new();

        let naics = parse_naics(root.get("naicsReference"), &mut diagnostics);
        diagnostics.extend(ReferenceData::with_iso_countries(naics.clone()).check_shape());
        let records = parse_companies(root.get("companies"), &mut diagnostics);

        for diagnostic in &diagnostics {
            warn!(path = %diagnostic.path, "dataset shape: {}", diagnostic.message);
        }

        Dataset {
            naics,
            records,
            diagnostics,
        }
    }

    /// Reference data for validation: this dataset's NAICS mapping plus
    /// the ISO country list
    pub fn reference(&self) -> ReferenceData {
        ReferenceData::with_iso_countries(self.naics.clone())
    }

    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    pub fn find(&self, id: &str) -> Option<&SourceRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Everything the shape check found at load time
    pub fn diagnostics(&self) -> &[ShapeDiagnostic] {
        &self.diagnostics
    }
}

// ============================================================================
// SHAPE CHECK
// ============================================================================

fn parse_naics(value: Option<&Value>, diagnostics: &mut Vec<ShapeDiagnostic>) -> Vec<NaicsReference> {
    let entries = match value.and_then(Value::as_array) {
        Some(entries) => entries,
        None => {
            diagnostics.push(ShapeDiagnostic::new("naicsReference", "Expected an array"));
            return Vec::new();
        }
    };

    let mut naics = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        let vertical = entry.get("vertical").and_then(Value::as_str);
        let subs = entry.get("subVerticals").and_then(Value::as_array);

        let (vertical, subs) = match (vertical, subs) {
            (Some(v), Some(s)) => (v, s),
            _ => {
                diagnostics.push(ShapeDiagnostic::new(
                    format!("naicsReference.{}", i),
                    "Expected {vertical: string, subVerticals: string[]}",
                ));
                continue;
            }
        };

        let mut sub_verticals = Vec::with_capacity(subs.len());
        for (j, sub) in subs.iter().enumerate() {
            match sub.as_str() {
                Some(s) => sub_verticals.push(s.to_string()),
                None => diagnostics.push(ShapeDiagnostic::new(
                    format!("naicsReference.{}.subVerticals.{}", i, j),
                    "Expected string",
                )),
            }
        }

        naics.push(NaicsReference {
            vertical: vertical.to_string(),
            sub_verticals,
        });
    }

    naics
}

fn parse_companies(value: Option<&Value>, diagnostics: &mut Vec<ShapeDiagnostic>) -> Vec<SourceRecord> {
    let entries = match value.and_then(Value::as_array) {
        Some(entries) => entries,
        None => {
            diagnostics.push(ShapeDiagnostic::new("companies", "Expected an array"));
            return Vec::new();
        }
    };

    let mut records: Vec<SourceRecord> = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let path = format!("companies.{}", i);

        let id = match entry.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                diagnostics.push(ShapeDiagnostic::new(
                    format!("{}.id", path),
                    "Record has no string id and was skipped",
                ));
                continue;
            }
        };

        if records.iter().any(|r| r.id == id) {
            diagnostics.push(ShapeDiagnostic::new(
                format!("{}.id", path),
                format!("Duplicate id \"{}\"; record skipped", id),
            ));
            continue;
        }

        check_company_shape(entry, &path, diagnostics);

        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        records.push(SourceRecord {
            id,
            name,
            value: entry.clone(),
        });
    }

    records
}

fn check_company_shape(entry: &Value, path: &str, diagnostics: &mut Vec<ShapeDiagnostic>) {
    for key in ["name", "legalName"] {
        if !entry.get(key).is_some_and(Value::is_string) {
            diagnostics.push(ShapeDiagnostic::new(format!("{}.{}", path, key), "Expected string"));
        }
    }

    for key in ["directors", "locations"] {
        let items = match entry.get(key).and_then(Value::as_array) {
            Some(items) if !items.is_empty() => items,
            Some(_) => {
                diagnostics.push(ShapeDiagnostic::new(
                    format!("{}.{}", path, key),
                    "Expected at least one item",
                ));
                continue;
            }
            None => {
                diagnostics.push(ShapeDiagnostic::new(format!("{}.{}", path, key), "Expected an array"));
                continue;
            }
        };

        for (i, item) in items.iter().enumerate() {
            for field in ["id", "name"] {
                if !item.get(field).is_some_and(Value::is_string) {
                    diagnostics.push(ShapeDiagnostic::new(
                        format!("{}.{}.{}.{}", path, key, i, field),
                        "Expected string",
                    ));
                }
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CompanyValidator;
    use serde_json::json;

    #[test]
    fn test_sample_dataset_loads_cleanly() {
        let dataset = Dataset::sample().unwrap();

        assert_eq!(dataset.len(), 4);
        assert!(dataset.diagnostics().is_empty(), "{:?}", dataset.diagnostics());
        assert_eq!(dataset.find("cmp-002").unwrap().name, "Northwind Power");

        let reference = dataset.reference();
        assert!(reference.is_valid_vertical("Utilities"));
        assert!(reference.is_valid_country("SE"));
    }

    #[test]
    fn test_sample_dataset_has_one_record_to_fix() {
        let dataset = Dataset::sample().unwrap();
        let validator = CompanyValidator::new(dataset.reference());

        let invalid: Vec<&str> = dataset
            .records()
            .iter()
            .filter(|r| !validator.issues(&r.value).is_empty())
            .map(|r| r.id.as_str())
            .collect();

        assert_eq!(invalid, vec!["cmp-003"]);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(Dataset::from_json_str("{ not json").is_err());
    }

    #[test]
    fn test_shape_problems_are_diagnostics() {
        let doc = json!({
            "naicsReference": [
                { "vertical": "Utilities", "subVerticals": ["Electric Power Distribution"] },
                { "vertical": 7 }
            ],
            "companies": [
                { "id": "a", "name": "A", "legalName": "A Inc",
                  "directors": [], "locations": [ { "id": "l1", "name": "HQ" } ] },
                { "name": "No id" },
                { "id": "a", "name": "Duplicate" }
            ]
        });

        let dataset = Dataset::from_json_str(&doc.to_string()).unwrap();
        let paths: Vec<&str> = dataset.diagnostics().iter().map(|d| d.path.as_str()).collect();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.reference().naics().len(), 1);
        assert!(paths.contains(&"naicsReference.1"));
        assert!(paths.contains(&"companies.0.directors"));
        assert!(paths.contains(&"companies.1.id"));
        assert!(paths.contains(&"companies.2.id"));
    }

    #[test]
    fn test_missing_sections() {
        let dataset = Dataset::from_json_str("{}").unwrap();

        assert!(dataset.is_empty());
        assert_eq!(dataset.diagnostics().len(), 2);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("companies.json");
        std::fs::write(&path, SAMPLE_DATASET).unwrap();

        let dataset = Dataset::load(&path).unwrap();
        assert_eq!(dataset.len(), 4);

        assert!(Dataset::load(&dir.path().join("missing.json")).is_err());
    }
}
