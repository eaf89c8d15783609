// 📍 Location Entity
//
// Same identity rule as directors: the id survives insert/remove/reorder.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    pub address_line1: String,
    pub city: String,
    pub region: String,
    pub postal_code: String,

    /// ISO 3166-1 alpha-2, checked against the reference country set
    pub country_code: String,
}

impl Location {
    /// Empty location with a fresh UUID, as appended by "Add Location"
    pub fn blank() -> Self {
        Location {
            id: uuid::Uuid::new_v4().to_string(),
            name: String::new(),
            address_line1: String::new(),
            city: String::new(),
            region: String::new(),
            postal_code: String::new(),
            country_code: String::new(),
        }
    }

    /// Infallible: a struct of strings always serializes into a `Value`
    pub fn to_draft(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
