// 🎛️ Record Session - one mounted draft, many parked buffers
//
// Per record:
//
//   Pristine ──(field change)──▶ Dirty
//      ▲                           │
//      └──(reset, or a change that restores the original)──┘
//
// - Exactly one record is active (mounted) at a time
// - A Dirty record's draft lives in `edit_buffers`, keyed by record id
// - Navigating away keeps the buffer; navigating back resumes from it
// - Pristine records have no buffer at all
//
// Single-threaded and synchronous: every operation runs to completion and
// leaves the buffer map consistent with the active draft.

use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::attributes::{AttributeRegistry, AttributeType};
use crate::dataset::{Dataset, SourceRecord};
use crate::entities::{Director, Location};
use crate::error::{Result, ReviewError};
use crate::export::{self, BulkExport, ExportBlocked, ExportDocument};
use crate::path::{get_by_path, set_by_path, Collection, FieldPath};
use crate::schema::{self, CompanyValidator, Issue};
use crate::tracker::{self, ChangeWatcher, SideEffect};

/// Keys that may be absent in source data but are always present in a
/// snapshot, as null
const NULLABLE_KEYS: [&str; 3] = ["ticker", "stockExchange", "parentCompanyId"];

// ============================================================================
// NOTICES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// User-facing notification (toast in a GUI, status line in the TUI)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub detail: Option<String>,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Success,
            message: message.into(),
            detail: None,
        }
    }

    pub fn warning(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Warning,
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    pub fn error(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            message: message.into(),
            detail: Some(detail.into()),
        }
    }
}

// ============================================================================
// ACTIVE RECORD
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    Pristine,
    Dirty,
}

#[derive(Debug)]
struct ActiveRecord {
    id: String,

    /// Baseline for every diff. Never written after mount.
    original: Value,

    draft: Value,
    state: RecordState,
    watcher: ChangeWatcher,
}

/// Source record as a diff baseline: nullable keys always present
fn snapshot_of(source: &SourceRecord) -> Value {
    let mut snapshot = source.value.clone();
    if let Value::Object(map) = &mut snapshot {
        for key in NULLABLE_KEYS {
            map.entry(key).or_insert(Value::Null);
        }
    }
    snapshot
}

// ============================================================================
// REVIEW SESSION
// ============================================================================

pub struct ReviewSession {
    dataset: Dataset,
    validator: CompanyValidator,
    registry: AttributeRegistry,

    /// Record id → dirty draft. Only ever holds drafts that differ from
    /// their original.
    edit_buffers: HashMap<String, Value>,

    active: Option<ActiveRecord>,
}

impl ReviewSession {
    pub fn new(dataset: Dataset) -> Self {
        let validator = CompanyValidator::new(dataset.reference());

        ReviewSession {
            dataset,
            validator,
            registry: AttributeRegistry::new(),
            edit_buffers: HashMap::new(),
            active: None,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn validator(&self) -> &CompanyValidator {
        &self.validator
    }

    pub fn registry(&self) -> &AttributeRegistry {
        &self.registry
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Mount a record for editing.
    ///
    /// Resumes from the record's edit buffer if it has one. The previously
    /// active record needs no saving: its buffer is always current.
    pub fn select(&mut self, id: &str) -> Result<()> {
        let source = self
            .dataset
            .find(id)
            .ok_or_else(|| ReviewError::UnknownRecord(id.to_string()))?;

        let original = snapshot_of(source);
        let (draft, state) = match self.edit_buffers.get(id) {
            Some(buffer) => (buffer.clone(), RecordState::Dirty),
            None => (original.clone(), RecordState::Pristine),
        };

        debug!(id, resumed = (state == RecordState::Dirty), "record selected");

        self.active = Some(ActiveRecord {
            id: id.to_string(),
            original,
            draft,
            state,
            watcher: ChangeWatcher::new(),
        });
        Ok(())
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.id.as_str())
    }

    fn active(&self) -> Result<&ActiveRecord> {
        self.active.as_ref().ok_or(ReviewError::NoActiveRecord)
    }

    fn active_mut(&mut self) -> Result<&mut ActiveRecord> {
        self.active.as_mut().ok_or(ReviewError::NoActiveRecord)
    }

    pub fn draft(&self) -> Result<&Value> {
        Ok(&self.active()?.draft)
    }

    pub fn original(&self) -> Result<&Value> {
        Ok(&self.active()?.original)
    }

    pub fn state(&self) -> Result<RecordState> {
        Ok(self.active()?.state)
    }

    pub fn is_dirty(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| a.state == RecordState::Dirty)
    }

    /// Whether a record (active or not) has unsaved edits
    pub fn is_edited(&self, id: &str) -> bool {
        self.edit_buffers.contains_key(id)
    }

    /// Ids of every record with an edit buffer, in dataset order
    pub fn edited_ids(&self) -> Vec<&str> {
        self.dataset
            .records()
            .iter()
            .map(|r| r.id.as_str())
            .filter(|id| self.edit_buffers.contains_key(*id))
            .collect()
    }

    /// Buffer if the record has one, pristine source otherwise
    pub fn working_copy(&self, id: &str) -> Option<&Value> {
        self.edit_buffers
            .get(id)
            .or_else(|| self.dataset.find(id).map(|r| &r.value))
    }

    // ------------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------------

    /// Write one field of the active draft and run its dependent rules.
    ///
    /// Only registered attributes are editable. Empty input on a nullable
    /// text field (ticker, stock exchange) is stored as null.
    pub fn set_field(&mut self, path: &str, value: impl Into<Value>) -> Result<Vec<SideEffect>> {
        let path: FieldPath = path
            .parse()
            .map_err(|_| ReviewError::UnknownField(path.to_string()))?;
        let attribute = self
            .registry
            .resolve(&path)
            .ok_or_else(|| ReviewError::UnknownField(path.to_string()))?;

        let mut value = value.into();
        if attribute.type_ == AttributeType::NullableText && value.as_str() == Some("") {
            value = Value::Null;
        }

        let reference = self.validator.reference();
        let active = self.active.as_mut().ok_or(ReviewError::NoActiveRecord)?;

        let old = set_by_path(&mut active.draft, &path.to_string(), value.clone())
            .ok_or_else(|| ReviewError::UnknownField(path.to_string()))?;

        let effects = tracker::apply_transitions(reference, &mut active.draft, &path, &old, &value);
        for effect in &effects {
            info!(id = %active.id, ?effect, "dependent field updated");
        }

        self.notify_change();
        Ok(effects)
    }

    /// Commit text typed into a field.
    ///
    /// Amount fields store a JSON number when the trimmed text parses
    /// (`"1234."` becomes `1234`) and keep the text as typed otherwise.
    /// Every other field stores the text, as `set_field` does.
    pub fn commit_field(&mut self, path: &str, input: &str) -> Result<Vec<SideEffect>> {
        let is_amount = path
            .parse::<FieldPath>()
            .ok()
            .and_then(|p| self.registry.resolve(&p))
            .is_some_and(|attribute| attribute.type_ == AttributeType::Number);

        let value = match schema::parse_number(input) {
            Some(n) if is_amount => schema::amount_value(n),
            _ => Value::String(input.to_string()),
        };
        self.set_field(path, value)
    }

    /// Append a blank director; returns its fresh id
    pub fn add_director(&mut self) -> Result<String> {
        let director = Director::blank();
        let id = director.id.clone();
        self.push_item(Collection::Directors, director.to_draft())?;
        Ok(id)
    }

    /// Append a blank location; returns its fresh id
    pub fn add_location(&mut self) -> Result<String> {
        let location = Location::blank();
        let id = location.id.clone();
        self.push_item(Collection::Locations, location.to_draft())?;
        Ok(id)
    }

    pub fn remove_director(&mut self, id: &str) -> Result<()> {
        self.remove_item(Collection::Directors, id)
    }

    pub fn remove_location(&mut self, id: &str) -> Result<()> {
        self.remove_item(Collection::Locations, id)
    }

    /// Ids of the active draft's items, in display order
    pub fn item_ids(&self, collection: Collection) -> Result<Vec<String>> {
        let draft = &self.active()?.draft;
        Ok(draft
            .get(collection.key())
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("id").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn push_item(&mut self, collection: Collection, item: Value) -> Result<()> {
        let active = self.active_mut()?;

        let slot = match &mut active.draft {
            Value::Object(map) => map
                .entry(collection.key())
                .or_insert_with(|| Value::Array(Vec::new())),
            _ => return Err(ReviewError::UnknownField(collection.key().to_string())),
        };
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(items) = slot {
            items.push(item);
        }

        debug!(id = %active.id, %collection, "item added");
        self.notify_change();
        Ok(())
    }

    fn remove_item(&mut self, collection: Collection, item_id: &str) -> Result<()> {
        let active = self.active_mut()?;

        let items = active
            .draft
            .get_mut(collection.key())
            .and_then(Value::as_array_mut)
            .ok_or_else(|| ReviewError::UnknownItem {
                collection: collection.key(),
                id: item_id.to_string(),
            })?;

        let index = items
            .iter()
            .position(|item| item.get("id").and_then(Value::as_str) == Some(item_id))
            .ok_or_else(|| ReviewError::UnknownItem {
                collection: collection.key(),
                id: item_id.to_string(),
            })?;

        if items.len() <= 1 {
            return Err(ReviewError::LastItem(collection.key()));
        }
        items.remove(index);

        debug!(id = %active.id, %collection, item_id, "item removed");
        self.notify_change();
        Ok(())
    }

    /// Discard every edit of the active record.
    ///
    /// The draft replacement is not reported as a user edit: the watcher
    /// swallows the notification it causes.
    pub fn reset(&mut self) -> Result<Notice> {
        let active = self.active_mut()?;

        active.watcher.suppress_next();
        active.draft = active.original.clone();
        active.state = RecordState::Pristine;

        let id = active.id.clone();
        self.edit_buffers.remove(&id);
        self.notify_change();

        info!(id = %id, "record reset to original values");
        Ok(Notice::success("Reset to original values"))
    }

    /// Re-derive the active record's state after a draft change, then
    /// promote its draft to a buffer or evict the buffer
    fn notify_change(&mut self) {
        let active = match self.active.as_mut() {
            Some(active) => active,
            None => return,
        };

        match active.watcher.observe(&active.original, &active.draft) {
            None => {}
            Some(true) => {
                if active.state == RecordState::Pristine {
                    debug!(id = %active.id, "record dirty");
                }
                active.state = RecordState::Dirty;
                self.edit_buffers.insert(active.id.clone(), active.draft.clone());
            }
            Some(false) => {
                if active.state == RecordState::Dirty {
                    debug!(id = %active.id, "record back to original");
                }
                active.state = RecordState::Pristine;
                self.edit_buffers.remove(&active.id);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Diff & validation views
    // ------------------------------------------------------------------------

    pub fn field_dirty(&self, path: &str) -> Result<bool> {
        let path: FieldPath = path
            .parse()
            .map_err(|_| ReviewError::UnknownField(path.to_string()))?;
        let active = self.active()?;
        Ok(tracker::is_field_dirty(&active.original, &active.draft, &path))
    }

    /// Current value of a field in the active draft
    pub fn field_value(&self, path: &str) -> Result<Option<&Value>> {
        Ok(get_by_path(&self.active()?.draft, path))
    }

    /// Every issue of the active draft, both validation passes
    pub fn issues(&self) -> Result<Vec<Issue>> {
        Ok(self.validator.issues(&self.active()?.draft))
    }

    /// First issue reported at exactly `path`, for inline display
    pub fn field_error(&self, path: &str) -> Result<Option<Issue>> {
        Ok(self.issues()?.into_iter().find(|issue| issue.path == path))
    }

    // ------------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------------

    /// Validate and export the active draft; blocked on any issue
    pub fn export_current(&self) -> Result<std::result::Result<ExportDocument, ExportBlocked>> {
        Ok(export::export_record(&self.validator, &self.active()?.draft))
    }

    /// Export every record: buffer if edited, pristine source otherwise
    pub fn export_all(&self) -> BulkExport {
        let records = self.dataset.records().iter().map(|r| {
            let value = self.edit_buffers.get(&r.id).unwrap_or(&r.value);
            (r.name.as_str(), value)
        });
        export::export_all(&self.validator, records)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_session() -> ReviewSession {
        let mut session = ReviewSession::new(Dataset::sample().unwrap());
        session.select("cmp-001").unwrap();
        session
    }

    #[test]
    fn test_operations_need_an_active_record() {
        let mut session = ReviewSession::new(Dataset::sample().unwrap());

        assert!(matches!(session.draft(), Err(ReviewError::NoActiveRecord)));
        assert!(matches!(session.set_field("name", "X"), Err(ReviewError::NoActiveRecord)));
        assert!(matches!(session.reset(), Err(ReviewError::NoActiveRecord)));
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_select_unknown_record() {
        let mut session = create_test_session();
        assert!(matches!(session.select("nope"), Err(ReviewError::UnknownRecord(_))));
        assert_eq!(session.active_id(), Some("cmp-001"));
    }

    #[test]
    fn test_fresh_record_is_pristine() {
        let session = create_test_session();

        assert_eq!(session.state().unwrap(), RecordState::Pristine);
        assert!(!session.is_dirty());
        assert!(session.edited_ids().is_empty());
        assert!(!session.field_dirty("name").unwrap());
    }

    #[test]
    fn test_snapshot_fills_absent_nullable_keys() {
        let doc = json!({
            "naicsReference": [],
            "companies": [ { "id": "x", "name": "X", "legalName": "X",
                             "directors": [ { "id": "d", "name": "D" } ],
                             "locations": [ { "id": "l", "name": "L" } ] } ]
        });
        let mut session = ReviewSession::new(Dataset::from_json_str(&doc.to_string()).unwrap());
        session.select("x").unwrap();

        assert_eq!(session.original().unwrap()["ticker"], Value::Null);
        assert_eq!(session.original().unwrap()["parentCompanyId"], Value::Null);
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_edit_makes_record_dirty_and_buffers_it() {
        let mut session = create_test_session();

        session.set_field("name", "Acme Analytics Group").unwrap();

        assert_eq!(session.state().unwrap(), RecordState::Dirty);
        assert!(session.field_dirty("name").unwrap());
        assert!(!session.field_dirty("legalName").unwrap());
        assert_eq!(session.edited_ids(), vec!["cmp-001"]);
    }

    #[test]
    fn test_restoring_original_value_clears_dirty() {
        let mut session = create_test_session();

        session.set_field("name", "Something Else").unwrap();
        session.set_field("name", "Acme Analytics").unwrap();

        assert_eq!(session.state().unwrap(), RecordState::Pristine);
        assert!(!session.is_edited("cmp-001"));
    }

    #[test]
    fn test_buffer_survives_navigation() {
        let mut session = create_test_session();
        session.set_field("description", "Edited").unwrap();

        session.select("cmp-002").unwrap();
        assert!(!session.is_dirty());
        assert!(session.is_edited("cmp-001"));

        session.select("cmp-001").unwrap();
        assert!(session.is_dirty());
        assert_eq!(session.draft().unwrap()["description"], json!("Edited"));
        assert!(session.field_dirty("description").unwrap());
    }

    #[test]
    fn test_switching_records_leaves_other_buffers_alone() {
        let mut session = create_test_session();
        session.set_field("description", "Edited 1").unwrap();

        session.select("cmp-002").unwrap();
        session.set_field("description", "Edited 2").unwrap();
        session.reset().unwrap();

        assert_eq!(session.edited_ids(), vec!["cmp-001"]);
        assert_eq!(
            session.working_copy("cmp-001").unwrap()["description"],
            json!("Edited 1")
        );
    }

    #[test]
    fn test_reset_restores_original() {
        let mut session = create_test_session();
        session.set_field("name", "Changed").unwrap();
        session.add_director().unwrap();

        let notice = session.reset().unwrap();

        assert_eq!(notice.message, "Reset to original values");
        assert_eq!(session.state().unwrap(), RecordState::Pristine);
        assert!(session.edited_ids().is_empty());
        assert_eq!(session.draft().unwrap(), session.original().unwrap());
    }

    #[test]
    fn test_edit_after_reset_is_observed() {
        let mut session = create_test_session();
        session.set_field("name", "Changed").unwrap();
        session.reset().unwrap();

        // The suppressed notification was the reset's own; this one counts
        session.set_field("name", "Changed again").unwrap();
        assert!(session.is_dirty());
        assert!(session.is_edited("cmp-001"));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let mut session = create_test_session();

        assert!(matches!(session.set_field("id", "x"), Err(ReviewError::UnknownField(_))));
        assert!(matches!(session.set_field("favouriteColour", "x"), Err(ReviewError::UnknownField(_))));
        assert!(matches!(
            session.set_field("directors.9.name", "x"),
            Err(ReviewError::UnknownField(_))
        ));
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_empty_ticker_is_stored_as_null() {
        let mut session = create_test_session();
        session.set_field("ticker", "").unwrap();

        assert_eq!(session.draft().unwrap()["ticker"], Value::Null);
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_vertical_change_clears_sub_vertical_and_dirties() {
        let mut session = create_test_session();

        let effects = session.set_field("vertical", "Utilities").unwrap();

        assert_eq!(
            effects,
            vec![SideEffect::SubVerticalCleared {
                previous: "Software Publishers".to_string()
            }]
        );
        assert_eq!(session.draft().unwrap()["subVertical"], json!(""));
        assert!(session.field_dirty("subVertical").unwrap());
        assert!(session.is_dirty());
        assert_eq!(
            session.field_error("subVertical").unwrap().unwrap().message,
            "Sub-vertical is required"
        );
    }

    #[test]
    fn test_leaving_public_clears_listing() {
        let mut session = create_test_session();
        session.select("cmp-002").unwrap();

        let effects = session.set_field("fundingStage", "private-equity").unwrap();

        assert_eq!(effects, vec![SideEffect::ListingCleared]);
        assert_eq!(session.draft().unwrap()["ticker"], Value::Null);
        assert_eq!(session.draft().unwrap()["stockExchange"], Value::Null);
        assert!(session.issues().unwrap().is_empty());
    }

    #[test]
    fn test_becoming_public_requires_listing() {
        let mut session = create_test_session();
        session.set_field("fundingStage", "public").unwrap();

        let paths: Vec<String> = session.issues().unwrap().into_iter().map(|i| i.path).collect();
        assert!(paths.contains(&"ticker".to_string()));
        assert!(paths.contains(&"stockExchange".to_string()));
    }

    #[test]
    fn test_add_and_remove_items() {
        let mut session = create_test_session();

        let new_id = session.add_director().unwrap();
        assert!(session.is_dirty());
        assert_eq!(session.item_ids(Collection::Directors).unwrap().len(), 3);

        // Fields of the new item have no baseline
        assert!(!session.field_dirty("directors.2.name").unwrap());
        assert!(session.field_error("directors.2.name").unwrap().is_some());

        session.remove_director(&new_id).unwrap();
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_removal_diffs_by_id() {
        let mut session = create_test_session();

        session.remove_director("dir-001").unwrap();

        // dir-002 moved to index 0 and is compared against itself
        assert!(!session.field_dirty("directors.0.name").unwrap());
        assert!(!session.field_dirty("directors.0.email").unwrap());
        assert!(session.is_dirty());
    }

    #[test]
    fn test_cannot_remove_last_item() {
        let mut session = create_test_session();

        assert!(matches!(
            session.remove_location("loc-001"),
            Err(ReviewError::LastItem("locations"))
        ));
        assert!(matches!(
            session.remove_location("loc-999"),
            Err(ReviewError::UnknownItem { .. })
        ));
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_add_location() {
        let mut session = create_test_session();
        let id = session.add_location().unwrap();

        let ids = session.item_ids(Collection::Locations).unwrap();
        assert_eq!(ids.last(), Some(&id));
        assert_eq!(session.draft().unwrap()["locations"][1]["countryCode"], json!(""));
    }

    #[test]
    fn test_revenue_typing_is_not_a_field_change() {
        let mut session = create_test_session();
        session.set_field("annualRevenueUsd", "48500000.").unwrap();

        assert!(!session.field_dirty("annualRevenueUsd").unwrap());
        // Whole-record comparison is structural: a string is not a number
        assert!(session.is_dirty());
        assert!(session.issues().unwrap().is_empty());
    }

    #[test]
    fn test_committing_revenue_unchanged_stays_pristine() {
        let mut session = create_test_session();
        session.commit_field("annualRevenueUsd", "48500000").unwrap();

        assert_eq!(session.draft().unwrap()["annualRevenueUsd"], json!(48500000));
        assert_eq!(session.state().unwrap(), RecordState::Pristine);
        assert!(!session.is_edited("cmp-001"));
    }

    #[test]
    fn test_committed_revenue_becomes_a_number() {
        let mut session = create_test_session();

        session.commit_field("annualRevenueUsd", " 1234. ").unwrap();
        assert_eq!(session.draft().unwrap()["annualRevenueUsd"], json!(1234));
        assert!(session.field_dirty("annualRevenueUsd").unwrap());

        session.commit_field("annualRevenueUsd", "1234.5").unwrap();
        assert_eq!(session.draft().unwrap()["annualRevenueUsd"], json!(1234.5));

        // Unparseable text is kept so validation can report it
        session.commit_field("annualRevenueUsd", "12.3.4").unwrap();
        assert_eq!(session.draft().unwrap()["annualRevenueUsd"], json!("12.3.4"));
        assert_eq!(session.field_error("annualRevenueUsd").unwrap().unwrap().message, "Must be a number");
    }

    #[test]
    fn test_commit_keeps_text_fields_as_text() {
        let mut session = create_test_session();
        session.commit_field("name", "1234").unwrap();
        assert_eq!(session.draft().unwrap()["name"], json!("1234"));

        assert!(matches!(
            session.commit_field("nope", "1"),
            Err(ReviewError::UnknownField(_))
        ));
    }

    #[test]
    fn test_export_current_and_all() {
        let mut session = create_test_session();
        let document = session.export_current().unwrap().unwrap();
        assert_eq!(document.file_name, "acme-analytics-export.json");

        session.set_field("name", "").unwrap();
        let blocked = session.export_current().unwrap().unwrap_err();
        assert_eq!(blocked.issues.len(), 1);

        let bulk = session.export_all();
        assert_eq!(bulk.exported, 4);
        assert_eq!(
            bulk.invalid_names,
            vec!["Acme Analytics".to_string(), "Harbor & Pine Realty".to_string()]
        );
    }
}
