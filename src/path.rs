// 🧭 Field Paths - dot/index addressing into a draft
//
// "name", "annualRevenueUsd", "directors.2.email", "locations.0.countryCode"
//
// Array items are addressed by POSITION in a path, but compared by ID:
// the tracker resolves `directors.2` to the item's stable id before it
// looks anything up in the original snapshot.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// COLLECTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Directors,
    Locations,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Directors, Collection::Locations];

    pub fn key(&self) -> &'static str {
        match self {
            Collection::Directors => "directors",
            Collection::Locations => "locations",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.key() == key)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ============================================================================
// FIELD PATH
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldPath {
    /// Top-level attribute of the company
    Scalar(String),

    /// Attribute of the `index`-th item of a sub-entity array
    Item {
        collection: Collection,
        index: usize,
        field: String,
    },
}

impl FieldPath {
    pub fn scalar(field: impl Into<String>) -> Self {
        FieldPath::Scalar(field.into())
    }

    pub fn item(collection: Collection, index: usize, field: impl Into<String>) -> Self {
        FieldPath::Item {
            collection,
            index,
            field: field.into(),
        }
    }

    /// Leaf attribute name ("email" for `directors.0.email`)
    pub fn field(&self) -> &str {
        match self {
            FieldPath::Scalar(field) => field,
            FieldPath::Item { field, .. } => field,
        }
    }

    /// Path of the `id` of the item this path points into
    pub fn item_id_path(&self) -> Option<FieldPath> {
        match self {
            FieldPath::Scalar(_) => None,
            FieldPath::Item {
                collection, index, ..
            } => Some(FieldPath::item(*collection, *index, "id")),
        }
    }
}

impl FromStr for FieldPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();

        match parts.as_slice() {
            [field] if is_word(field) => Ok(FieldPath::scalar(*field)),
            [collection, index, field] if is_word(field) => {
                let collection = Collection::from_key(collection)
                    .ok_or_else(|| format!("not an array field: {}", collection))?;
                let index = index
                    .parse::<usize>()
                    .map_err(|_| format!("bad array index in path: {}", s))?;
                Ok(FieldPath::item(collection, index, *field))
            }
            _ => Err(format!("unsupported field path: {}", s)),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Scalar(field) => f.write_str(field),
            FieldPath::Item {
                collection,
                index,
                field,
            } => write!(f, "{}.{}.{}", collection, index, field),
        }
    }
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ============================================================================
// GENERIC TRAVERSAL
// ============================================================================

/// Look up a dot-separated path in a JSON value.
///
/// Numeric segments index arrays. Missing keys, out-of-bounds indices and
/// descending into scalars all yield `None`.
pub fn get_by_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |acc, key| match acc {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Mutable counterpart of [`get_by_path`].
pub fn get_by_path_mut<'a>(value: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    path.split('.').try_fold(value, |acc, key| match acc {
        Value::Object(map) => map.get_mut(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(move |i| items.get_mut(i)),
        _ => None,
    })
}

/// Write `new_value` at `path`, creating the leaf key if the parent object
/// exists. Returns the previous value, or `None` when the parent is missing.
pub fn set_by_path(value: &mut Value, path: &str, new_value: Value) -> Option<Value> {
    let (parent_path, leaf) = match path.rsplit_once('.') {
        Some((parent, leaf)) => (Some(parent), leaf),
        None => (None, path),
    };

    let parent = match parent_path {
        Some(p) => get_by_path_mut(value, p)?,
        None => value,
    };

    match parent {
        Value::Object(map) => {
            let previous = map.insert(leaf.to_string(), new_value);
            Some(previous.unwrap_or(Value::Null))
        }
        Value::Array(items) => {
            let slot = leaf.parse::<usize>().ok().and_then(|i| items.get_mut(i))?;
            Some(std::mem::replace(slot, new_value))
        }
        _ => None,
    }
}

// ============================================================================
// TESTS
// ============================================================================
