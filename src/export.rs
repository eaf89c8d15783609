// 📤 Export Pipeline
//
// Single record: validate the draft, export the normalized record, or
// block with the full issue list. Never a partial file.
//
// All records: validate each record on its own. Invalid records are still
// exported (as their raw draft) and named in one warning afterwards. One
// bad record never blocks the rest.

use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::Result;
use crate::schema::{CompanyValidator, Issue};
use crate::session::Notice;

pub const ALL_COMPANIES_FILE_NAME: &str = "all-companies-export.json";

/// Issue messages shown before the overflow count
const MAX_LISTED_ISSUES: usize = 5;

// ============================================================================
// FILE NAMES
// ============================================================================

/// `"Acme Analytics, Inc."` → `"acme-analytics-inc"`; `"company"` if nothing survives
pub fn safe_file_name(name: &str) -> String {
    let lowered = name.to_lowercase();

    let mut hyphenated = String::with_capacity(lowered.len());
    let mut in_whitespace = false;
    for c in lowered.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                hyphenated.push('-');
            }
            in_whitespace = true;
        } else {
            hyphenated.push(c);
            in_whitespace = false;
        }
    }

    let safe: String = hyphenated
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect();

    if safe.is_empty() {
        "company".to_string()
    } else {
        safe
    }
}

// ============================================================================
// EXPORT DOCUMENT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    pub file_name: String,
    pub contents: Value,
}

impl ExportDocument {
    /// Two-space indented JSON
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.contents)?)
    }

    /// Write to `<dir>/<file_name>`, replacing any existing file
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, self.to_pretty_json()?)?;

        info!(path = %path.display(), "export written");
        Ok(path)
    }
}

// ============================================================================
// SINGLE RECORD
// ============================================================================

/// Single-record export refused: the draft has validation issues
#[derive(Debug, Clone, Error)]
#[error("{} validation error(s) found", .issues.len())]
pub struct ExportBlocked {
    pub issues: Vec<Issue>,
}

impl ExportBlocked {
    pub fn summary(&self) -> String {
        self.to_string()
    }

    /// First five messages joined with " • ", then an overflow count
    pub fn details(&self) -> String {
        let listed: Vec<&str> = self
            .issues
            .iter()
            .take(MAX_LISTED_ISSUES)
            .map(|issue| issue.message.as_str())
            .collect();

        let mut details = listed.join(" • ");
        if self.issues.len() > MAX_LISTED_ISSUES {
            details.push_str(&format!(" …and {} more", self.issues.len() - MAX_LISTED_ISSUES));
        }
        details
    }

    pub fn notice(&self) -> Notice {
        Notice::error(self.summary(), self.details())
    }
}

pub fn export_record(validator: &CompanyValidator, draft: &Value) -> std::result::Result<ExportDocument, ExportBlocked> {
    match validator.validate_company(draft) {
        Ok(company) => {
            let file_name = format!("{}-export.json", safe_file_name(&company.name));
            info!(id = %company.id, file_name = %file_name, "record exported");

            Ok(ExportDocument {
                file_name,
                contents: company.to_draft(),
            })
        }
        Err(issues) => {
            warn!(issues = issues.len(), "export blocked by validation");
            Err(ExportBlocked { issues })
        }
    }
}

pub fn export_success_notice() -> Notice {
    Notice::success("Company data exported successfully!")
}

// ============================================================================
// ALL RECORDS
// ============================================================================

#[derive(Debug, Clone)]
pub struct BulkExport {
    pub document: ExportDocument,

    /// Records in the document (valid and invalid)
    pub exported: usize,

    /// Display names of records exported without passing validation
    pub invalid_names: Vec<String>,
}

impl BulkExport {
    pub fn has_warnings(&self) -> bool {
        !self.invalid_names.is_empty()
    }

    pub fn notice(&self) -> Notice {
        if self.has_warnings() {
            Notice::warning(
                format!("Exported {} companies with warnings", self.exported),
                format!("{} may contain invalid data.", self.invalid_names.join(", ")),
            )
        } else {
            Notice::success(format!("Exported {} companies", self.exported))
        }
    }
}

/// Export `(display name, working copy)` pairs in order.
///
/// Valid records are exported normalized, invalid ones as given.
pub fn export_all<'a, I>(validator: &CompanyValidator, records: I) -> BulkExport
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    let mut contents = Vec::new();
    let mut invalid_names = Vec::new();

    for (name, value) in records {
        match validator.validate_company(value) {
            Ok(company) => contents.push(company.to_draft()),
            Err(issues) => {
                warn!(name, issues = issues.len(), "exporting record with invalid data");
                invalid_names.push(name.to_string());
                contents.push(value.clone());
            }
        }
    }

    let exported = contents.len();
    info!(exported, invalid = invalid_names.len(), "all records exported");

    BulkExport {
        document: ExportDocument {
            file_name: ALL_COMPANIES_FILE_NAME.to_string(),
            contents: Value::Array(contents),
        },
        exported,
        invalid_names,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{NaicsReference, ReferenceData};
    use crate::session::NoticeLevel;
    use serde_json::json;

    fn create_test_validator() -> CompanyValidator {
        let naics = vec![NaicsReference::new(
            "Finance and Insurance",
            &["Insurance Agencies and Brokerages", "Real Estate Credit"],
        )];
        CompanyValidator::new(ReferenceData::new(naics, ["US"]))
    }

    fn valid_company(id: &str, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "legalName": format!("{} Inc.", name),
            "description": "Brokerage",
            "websiteUrl": "https://example.com",
            "companyStatus": "active",
            "entityType": "Corporation",
            "vertical": "Finance and Insurance",
            "subVertical": "Insurance Agencies and Brokerages",
            "annualRevenueUsd": "500000",
            "fundingStage": "seed",
            "ticker": "",
            "stockExchange": null,
            "parentCompanyId": null,
            "directors": [ { "id": "d1", "name": "Ann", "email": "ann@example.com", "phone": "+1 555 123 4567" } ],
            "locations": [ { "id": "l1", "name": "HQ", "addressLine1": "1 Main St", "city": "Springfield",
                             "region": "IL", "postalCode": "62701", "countryCode": "US" } ]
        })
    }

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("Acme Corp"), "acme-corp");
        assert_eq!(safe_file_name("  Acme   Corp  "), "-acme-corp-");
        assert_eq!(safe_file_name("Harbor & Pine Realty"), "harbor--pine-realty");
        assert_eq!(safe_file_name("Ünïcødé 2024!"), "ncd-2024");
        assert_eq!(safe_file_name("!!!"), "company");
        assert_eq!(safe_file_name(""), "company");
    }

    #[test]
    fn test_export_valid_record_is_normalized() {
        let validator = create_test_validator();

        let document = export_record(&validator, &valid_company("c1", "Acme Corp")).unwrap();

        assert_eq!(document.file_name, "acme-corp-export.json");
        assert_eq!(document.contents["annualRevenueUsd"], json!(500000));
        assert_eq!(document.contents["ticker"], Value::Null);
    }

    #[test]
    fn test_export_blocked_lists_every_issue() {
        let validator = create_test_validator();
        let mut company = valid_company("c1", "Acme");
        company["name"] = json!("");
        company["legalName"] = json!("");
        company["description"] = json!("");
        company["websiteUrl"] = json!("ftp://x.com");
        company["annualRevenueUsd"] = json!(-1);
        company["subVertical"] = json!("");
        company["directors"] = json!([]);

        let blocked = export_record(&validator, &company).unwrap_err();

        assert_eq!(blocked.issues.len(), 7);
        assert_eq!(blocked.summary(), "7 validation error(s) found");
        assert!(blocked.details().ends_with(" …and 2 more"));
        assert_eq!(blocked.details().matches(" • ").count(), 4);
        assert_eq!(blocked.notice().level, NoticeLevel::Error);
    }

    #[test]
    fn test_export_blocked_without_overflow() {
        let blocked = ExportBlocked {
            issues: vec![Issue::new("name", "Company name is required")],
        };
        assert_eq!(blocked.details(), "Company name is required");
    }

    #[test]
    fn test_export_all_keeps_invalid_records() {
        let validator = create_test_validator();
        let good_a = valid_company("a", "Alpha");
        let good_b = valid_company("b", "Beta");
        let mut bad = valid_company("c", "Gamma");
        bad["websiteUrl"] = json!("not a url");

        let bulk = export_all(
            &validator,
            vec![("Alpha", &good_a), ("Gamma", &bad), ("Beta", &good_b)],
        );

        assert_eq!(bulk.exported, 3);
        assert_eq!(bulk.invalid_names, vec!["Gamma".to_string()]);
        assert_eq!(bulk.document.file_name, ALL_COMPANIES_FILE_NAME);

        let items = bulk.document.contents.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1], bad);
        // Valid records come out coerced
        assert_eq!(items[0]["annualRevenueUsd"], json!(500000));

        let notice = bulk.notice();
        assert_eq!(notice.message, "Exported 3 companies with warnings");
        assert_eq!(notice.detail.as_deref(), Some("Gamma may contain invalid data."));
    }

    #[test]
    fn test_export_all_clean() {
        let validator = create_test_validator();
        let good = valid_company("a", "Alpha");

        let bulk = export_all(&validator, vec![("Alpha", &good)]);

        assert!(!bulk.has_warnings());
        assert_eq!(bulk.notice(), Notice::success("Exported 1 companies"));
    }

    #[test]
    fn test_write_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let document = ExportDocument {
            file_name: "acme-export.json".to_string(),
            contents: json!({ "name": "Acme", "tags": [1] }),
        };

        let path = document.write_to(dir.path()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();

        assert_eq!(path, dir.path().join("acme-export.json"));
        assert_eq!(written, "{\n  \"name\": \"Acme\",\n  \"tags\": [\n    1\n  ]\n}");
    }
}
