// 👤 Director Entity
//
// "Director id is IDENTITY, assigned at creation - never the array index"

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Director {
    /// Stable identity (UUID for directors created in the editor)
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl Director {
    /// Empty director with a fresh UUID, as appended by "Add Director"
    pub fn blank() -> Self {
        Director {
            id: uuid::Uuid::new_v4().to_string(),
            name: String::new(),
            email: String::new(),
            phone: String::new(),
        }
    }

    /// Infallible: a struct of strings always serializes into a `Value`
    pub fn to_draft(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
