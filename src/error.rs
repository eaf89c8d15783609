// ⚠️ Error Taxonomy
// Everything a caller can get wrong while driving a review session.
//
// Validation failures are NOT errors here: they are data (Vec<Issue>)
// rendered next to the offending field. See schema.rs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("no company with id '{0}' in the dataset")]
    UnknownRecord(String),

    #[error("no record is active")]
    NoActiveRecord,

    #[error("'{0}' is not an editable field")]
    UnknownField(String),

    #[error("no {collection} item with id '{id}'")]
    UnknownItem { collection: &'static str, id: String },

    #[error("cannot remove the last item from {0}")]
    LastItem(&'static str),

    #[error("dataset is not valid JSON: {0}")]
    DatasetParse(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReviewError>;
