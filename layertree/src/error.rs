use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort catalog construction, augmentation or placement.
///
/// Functions in this crate return [anyhow::Result]. When the caller needs to react to a specific
/// failure, use `err.downcast_ref::<Error>()`.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum Error {
    #[error("Failed to decode file name '{file_name}': {reason}")]
    Decode { file_name: String, reason: String },

    #[error(
        "Catalog creation failed. Expected {expected} records from the input files but found {actual}. \
        Are there duplicate file names?"
    )]
    RecordCount { expected: usize, actual: usize },

    #[error("Metadata tag '{tag}' not found in {}.", .path.display())]
    MissingTag { tag: String, path: PathBuf },

    #[error("File {} does not exist.", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Field '{field}' has no value for {}.", .path.display())]
    MissingField { field: String, path: PathBuf },

    #[error("Field '{field}' of {} is not a timestamp: '{value}'.", .path.display())]
    NotATimestamp {
        field: String,
        value: String,
        path: PathBuf,
    },

    #[error("'{format}' is not a valid strftime format.")]
    InvalidFormat { format: String },

    #[error("A {days} day window starting {start} is out of range.")]
    WindowOverflow { start: String, days: u32 },
}
