// Entity Models
// Following the same rule everywhere: "Identity persists, values change"
//
// Each entity has:
// - Stable identity (string id) that NEVER changes
// - Plain values that the review editor corrects
// - A draft form (serde_json::Value) used while editing

pub mod company;
pub mod director;
pub mod location;

pub use company::{Company, CompanyStatus, EntityType, FundingStage};
pub use director::Director;
pub use location::Location;
