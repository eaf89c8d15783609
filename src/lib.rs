// Company Review - Core Library
// Edit-state and validation engine behind the company review editor.
// Used by the CLI, the TUI, and tests.

pub mod error;
pub mod entities;       // Data model: Company, Director, Location
pub mod reference;      // Reference Data Store
pub mod dataset;        // Pristine records + shape diagnostics
pub mod path;           // Dot/index field paths into drafts
pub mod attributes;     // Editable field registry
pub mod schema;         // Validation Engine
pub mod tracker;        // Edit-State Tracker
pub mod session;        // Record Session Controller
pub mod export;         // Export Pipeline
pub mod format;         // Display formatting

// Re-export commonly used types
pub use error::{Result, ReviewError};
pub use entities::{
    Company, CompanyStatus, EntityType, FundingStage,
    Director, Location,
};
pub use reference::{NaicsReference, ReferenceData, country_name};
pub use dataset::{Dataset, SourceRecord, ShapeDiagnostic};
pub use path::{Collection, FieldPath};
pub use attributes::{
    AttributeRegistry, AttributeDefinition, AttributeType, ChoiceSource, Scope,
};
pub use schema::{CompanyValidator, Issue, ValidationResult};
pub use tracker::{
    normalize_value, original_value, is_field_dirty, is_record_dirty,
    Baseline, ChangeWatcher, SideEffect,
};
pub use session::{ReviewSession, RecordState, Notice, NoticeLevel};
pub use export::{
    safe_file_name, export_record, export_all,
    ExportDocument, ExportBlocked, BulkExport,
};
pub use format::{format_revenue, format_revenue_full, format_label};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
