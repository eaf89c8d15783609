// 🔍 Edit-State Tracker - what changed, compared to what
//
// Three derived facts for the active record:
// 1. Per-field dirty   - normalized draft value vs normalized original value
// 2. Identity lookup   - array item fields compare against the original item
//                        with the SAME id, never the same index
// 3. Whole-record dirty - structural comparison of draft and original
//
// Plus the edge-triggered field transitions (vertical → sub-vertical,
// leaving "public" → clear listing) that fire when a governing field changes.
//
// Every function takes the original snapshot and the draft explicitly.

use serde_json::Value;
use tracing::debug;

use crate::entities::FundingStage;
use crate::path::{get_by_path, set_by_path, FieldPath};
use crate::reference::ReferenceData;
use crate::schema::parse_number;

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Comparison form of a field value.
///
/// - missing, null and "" are all the empty string
/// - anything that reads as a finite number becomes its canonical numeric
///   string, so `1234`, `"1234"` and `"1234."` compare equal
/// - other strings compare literally
pub fn normalize_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) if s.is_empty() => String::new(),
        Some(Value::String(s)) => parse_number(s)
            .map(canonical_number)
            .unwrap_or_else(|| s.clone()),
        Some(Value::Number(n)) => match n.as_f64().filter(|f| f.is_finite()) {
            Some(f) => canonical_number(f),
            None => n.to_string(),
        },
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

fn canonical_number(n: f64) -> String {
    // -0 and 0 are the same amount
    if n == 0.0 {
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

// ============================================================================
// BASELINE LOOKUP
// ============================================================================

/// What a field is compared against
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Baseline<'a> {
    /// Original value at the equivalent path (`None` if absent there)
    Known(Option<&'a Value>),

    /// Array item whose id does not exist in the original: appended in
    /// this session, so there is nothing to compare against
    Unmatched,
}

/// Resolve the original value for `path`.
///
/// For array item paths the original item is located by `current_id`, so
/// insertions and removals that shift indices don't produce false diffs.
/// Without an id the lookup falls back to the same index.
pub fn original_value<'a>(original: &'a Value, path: &FieldPath, current_id: Option<&str>) -> Baseline<'a> {
    match (path, current_id) {
        (
            FieldPath::Item {
                collection, field, ..
            },
            Some(id),
        ) => {
            let items = original.get(collection.key()).and_then(Value::as_array);
            let item = items.and_then(|items| {
                items
                    .iter()
                    .find(|item| item.get("id").and_then(Value::as_str) == Some(id))
            });

            match item {
                Some(item) => Baseline::Known(get_by_path(item, field)),
                None => Baseline::Unmatched,
            }
        }
        _ => Baseline::Known(get_by_path(original, &path.to_string())),
    }
}

/// Stable id of the draft item a path points into
pub fn current_item_id<'a>(draft: &'a Value, path: &FieldPath) -> Option<&'a str> {
    let id_path = path.item_id_path()?;
    get_by_path(draft, &id_path.to_string()).and_then(Value::as_str)
}

// ============================================================================
// DIRTY CHECKS
// ============================================================================

/// Per-field dirty flag.
///
/// Fields of newly appended items are never dirty by value mismatch; the
/// whole-record check covers them.
pub fn is_field_dirty(original: &Value, draft: &Value, path: &FieldPath) -> bool {
    let current = get_by_path(draft, &path.to_string());
    let current_id = current_item_id(draft, path);

    match original_value(original, path, current_id) {
        Baseline::Unmatched => false,
        Baseline::Known(baseline) => normalize_value(current) != normalize_value(baseline),
    }
}

/// Whole-record dirty flag: any structural difference at all.
///
/// Object key order is irrelevant and numbers compare by value
/// (`1000000` equals `1000000.0`). No other normalization applies: a
/// revenue typed as `"1000000"` over an original `1000000` IS a change here.
pub fn is_record_dirty(original: &Value, draft: &Value) -> bool {
    !structurally_equal(original, draft)
}

pub fn structurally_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| structurally_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| structurally_equal(x, y)))
        }
        _ => a == b,
    }
}

// ============================================================================
// CHANGE WATCHER
// ============================================================================

/// Turns change notifications into dirty/clean verdicts.
///
/// `suppress_next` swallows exactly one notification: a reset replaces the
/// whole draft, and that replacement must not be reported as a user edit.
#[derive(Debug, Default)]
pub struct ChangeWatcher {
    skip_next: bool,
}

impl ChangeWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suppress_next(&mut self) {
        self.skip_next = true;
    }

    /// `None` when the notification was suppressed, otherwise whether the
    /// draft now differs from the original
    pub fn observe(&mut self, original: &Value, draft: &Value) -> Option<bool> {
        if self.skip_next {
            self.skip_next = false;
            return None;
        }
        Some(is_record_dirty(original, draft))
    }
}

// ============================================================================
// FIELD TRANSITIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// New vertical doesn't list the selected sub-vertical
    SubVerticalCleared { previous: String },

    /// Funding stage left "public": ticker and stock exchange nulled
    ListingCleared,
}

/// Run the dependent-field rules for a change of `path` from `old` to `new`.
///
/// Edge-triggered: nothing happens unless the governing value actually
/// changed. Side effects write the draft directly and never re-enter this
/// function, so they cannot loop.
pub fn apply_transitions(
    reference: &ReferenceData,
    draft: &mut Value,
    path: &FieldPath,
    old: &Value,
    new: &Value,
) -> Vec<SideEffect> {
    let mut effects = Vec::new();

    if old == new {
        return effects;
    }

    let field = match path {
        FieldPath::Scalar(field) => field.as_str(),
        FieldPath::Item { .. } => return effects,
    };

    match field {
        "vertical" => {
            let vertical = new.as_str().unwrap_or("");
            let sub_vertical = draft
                .get("subVertical")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();

            let still_listed = reference.sub_verticals(vertical).iter().any(|s| *s == sub_vertical);
            if !sub_vertical.is_empty() && !still_listed {
                set_by_path(draft, "subVertical", Value::String(String::new()));
                debug!(vertical, previous = %sub_vertical, "sub-vertical cleared");
                effects.push(SideEffect::SubVerticalCleared {
                    previous: sub_vertical,
                });
            }
        }
        "fundingStage" => {
            let public = FundingStage::Public.as_str();
            let was_public = old.as_str() == Some(public);
            let is_public = new.as_str() == Some(public);

            if was_public && !is_public {
                set_by_path(draft, "ticker", Value::Null);
                set_by_path(draft, "stockExchange", Value::Null);
                debug!("left public funding stage, listing cleared");
                effects.push(SideEffect::ListingCleared);
            }
        }
        _ => {}
    }

    effects
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::NaicsReference;
    use serde_json::json;

    fn original() -> Value {
        json!({
            "name": "Acme",
            "annualRevenueUsd": 1234,
            "ticker": null,
            "directors": [
                { "id": "d1", "name": "Alice", "email": "alice@example.com" },
                { "id": "d2", "name": "Bob", "email": "bob@example.com" }
            ]
        })
    }

    fn path(s: &str) -> FieldPath {
        s.parse().unwrap()
    }

    fn reference() -> ReferenceData {
        ReferenceData::new(
            vec![
                NaicsReference::new(
                    "Finance and Insurance",
                    &["Insurance Agencies and Brokerages", "Real Estate Credit"],
                ),
                NaicsReference::new("Utilities", &["Electric Power Distribution"]),
                NaicsReference::new(
                    "Real Estate",
                    &["Real Estate Credit", "Offices of Real Estate Agents"],
                ),
            ],
            ["US"],
        )
    }

    #[test]
    fn test_normalize_empty_values() {
        assert_eq!(normalize_value(None), "");
        assert_eq!(normalize_value(Some(&json!(null))), "");
        assert_eq!(normalize_value(Some(&json!(""))), "");
    }

    #[test]
    fn test_normalize_numeric_equivalence() {
        let n = normalize_value(Some(&json!(1234)));
        assert_eq!(n, normalize_value(Some(&json!("1234"))));
        assert_eq!(n, normalize_value(Some(&json!("1234."))));
        assert_eq!(n, normalize_value(Some(&json!(1234.0))));
        assert_eq!(n, "1234");
    }

    #[test]
    fn test_normalize_preserves_decimals_and_text() {
        assert_eq!(normalize_value(Some(&json!("1234.5"))), "1234.5");
        assert_eq!(normalize_value(Some(&json!("hello"))), "hello");
        assert_eq!(normalize_value(Some(&json!("-0"))), "0");
    }

    #[test]
    fn test_original_value_scalar() {
        let original = original();
        assert_eq!(
            original_value(&original, &path("name"), None),
            Baseline::Known(Some(&json!("Acme")))
        );
        assert_eq!(
            original_value(&original, &path("legalName"), None),
            Baseline::Known(None)
        );
    }

    #[test]
    fn test_original_value_looks_up_by_id() {
        let original = original();
        assert_eq!(
            original_value(&original, &path("directors.0.name"), Some("d2")),
            Baseline::Known(Some(&json!("Bob")))
        );
    }

    #[test]
    fn test_original_value_new_item() {
        let original = original();
        assert_eq!(
            original_value(&original, &path("directors.2.name"), Some("d-new")),
            Baseline::Unmatched
        );
    }

    #[test]
    fn test_original_value_without_id_uses_index() {
        let original = original();
        assert_eq!(
            original_value(&original, &path("directors.1.name"), None),
            Baseline::Known(Some(&json!("Bob")))
        );
    }

    #[test]
    fn test_deleted_item_shifts_indices() {
        let original = original();
        // d1 removed: d2 now sits at index 0
        let draft = json!({
            "name": "Acme",
            "annualRevenueUsd": 1234,
            "ticker": null,
            "directors": [ { "id": "d2", "name": "Bob", "email": "bob@x.com" } ]
        });

        assert!(is_field_dirty(&original, &draft, &path("directors.0.email")));
        assert!(!is_field_dirty(&original, &draft, &path("directors.0.name")));
    }

    #[test]
    fn test_reordering_is_not_a_field_change() {
        let original = original();
        let mut draft = original.clone();
        draft["directors"] = json!([
            { "id": "d2", "name": "Bob", "email": "bob@example.com" },
            { "id": "d1", "name": "Alice", "email": "alice@example.com" }
        ]);

        for p in ["directors.0.name", "directors.0.email", "directors.1.name", "directors.1.email"] {
            assert!(!is_field_dirty(&original, &draft, &path(p)), "{} flagged", p);
        }
        // The array itself did change shape
        assert!(is_record_dirty(&original, &draft));
    }

    #[test]
    fn test_new_item_fields_never_dirty_by_mismatch() {
        let original = original();
        let mut draft = original.clone();
        draft["directors"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "id": "d-new", "name": "Carol", "email": "" }));

        assert!(!is_field_dirty(&original, &draft, &path("directors.2.name")));
        assert!(is_record_dirty(&original, &draft));
    }

    #[test]
    fn test_field_dirty_uses_normalization() {
        let original = original();
        let mut draft = original.clone();

        draft["annualRevenueUsd"] = json!("1234.");
        draft["ticker"] = json!("");
        assert!(!is_field_dirty(&original, &draft, &path("annualRevenueUsd")));
        assert!(!is_field_dirty(&original, &draft, &path("ticker")));

        draft["annualRevenueUsd"] = json!("12345");
        assert!(is_field_dirty(&original, &draft, &path("annualRevenueUsd")));
    }

    #[test]
    fn test_record_dirty_is_structural() {
        let a = json!({ "x": 1, "y": { "p": [1, 2], "q": "s" } });
        let b = json!({ "y": { "q": "s", "p": [1, 2] }, "x": 1.0 });

        assert!(!is_record_dirty(&a, &b));
        assert!(is_record_dirty(&a, &json!({ "x": 1, "y": { "p": [2, 1], "q": "s" } })));
        assert!(is_record_dirty(&a, &json!({ "x": "1", "y": { "p": [1, 2], "q": "s" } })));
        assert!(is_record_dirty(&a, &json!({ "x": 1 })));
    }

    #[test]
    fn test_watcher_suppresses_exactly_one_notification() {
        let original = original();
        let mut draft = original.clone();
        draft["name"] = json!("Acme 2");

        let mut watcher = ChangeWatcher::new();
        assert_eq!(watcher.observe(&original, &draft), Some(true));

        watcher.suppress_next();
        assert_eq!(watcher.observe(&original, &draft), None);
        assert_eq!(watcher.observe(&original, &original), Some(false));
    }

    #[test]
    fn test_vertical_change_clears_unlisted_sub_vertical() {
        let mut draft = json!({ "vertical": "Utilities", "subVertical": "Insurance Agencies and Brokerages" });
        let effects = apply_transitions(
            &reference(),
            &mut draft,
            &path("vertical"),
            &json!("Finance and Insurance"),
            &json!("Utilities"),
        );

        assert_eq!(
            effects,
            vec![SideEffect::SubVerticalCleared {
                previous: "Insurance Agencies and Brokerages".to_string()
            }]
        );
        assert_eq!(draft["subVertical"], json!(""));
    }

    #[test]
    fn test_vertical_change_keeps_listed_sub_vertical() {
        let mut draft = json!({ "vertical": "Real Estate", "subVertical": "Real Estate Credit" });
        let effects = apply_transitions(
            &reference(),
            &mut draft,
            &path("vertical"),
            &json!("Finance and Insurance"),
            &json!("Real Estate"),
        );

        assert!(effects.is_empty());
        assert_eq!(draft["subVertical"], json!("Real Estate Credit"));
    }

    #[test]
    fn test_transitions_are_edge_triggered() {
        let mut draft = json!({ "vertical": "Utilities", "subVertical": "Real Estate Credit" });

        // Same value again: no edge, nothing happens even though the pair is invalid
        let effects = apply_transitions(
            &reference(),
            &mut draft,
            &path("vertical"),
            &json!("Utilities"),
            &json!("Utilities"),
        );
        assert!(effects.is_empty());
        assert_eq!(draft["subVertical"], json!("Real Estate Credit"));
    }

    #[test]
    fn test_leaving_public_clears_listing() {
        let mut draft = json!({ "fundingStage": "seed", "ticker": "ACME", "stockExchange": "NYSE" });
        let effects = apply_transitions(
            &reference(),
            &mut draft,
            &path("fundingStage"),
            &json!("public"),
            &json!("seed"),
        );

        assert_eq!(effects, vec![SideEffect::ListingCleared]);
        assert_eq!(draft["ticker"], json!(null));
        assert_eq!(draft["stockExchange"], json!(null));
    }

    #[test]
    fn test_other_stage_changes_keep_listing() {
        let mut draft = json!({ "fundingStage": "public", "ticker": "ACME", "stockExchange": "NYSE" });

        let effects = apply_transitions(
            &reference(),
            &mut draft,
            &path("fundingStage"),
            &json!("seed"),
            &json!("public"),
        );
        assert!(effects.is_empty());

        let effects = apply_transitions(
            &reference(),
            &mut draft,
            &path("fundingStage"),
            &json!("seed"),
            &json!("series-a"),
        );
        assert!(effects.is_empty());
        assert_eq!(draft["ticker"], json!("ACME"));
    }
}
