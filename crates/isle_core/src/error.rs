//! Error types for data loading and session persistence.
//!
//! Legality failures (placement, border expansion) have their own error
//! enums next to the code that produces them; this module covers data
//! and serialization failures.

use thiserror::Error;

/// Result type alias using [`IsleError`].
pub type Result<T> = std::result::Result<T, IsleError>;

/// Top-level error type for data and persistence failures.
#[derive(Debug, Error)]
pub enum IsleError {
    /// Data file parsing error.
    #[error("Failed to parse data '{source_name}': {message}")]
    DataParseError {
        /// Name of the document that failed to parse.
        source_name: String,
        /// Error message.
        message: String,
    },

    /// A structure catalog entry failed validation.
    #[error("Invalid structure definition '{kind}': {message}")]
    InvalidStructureDef {
        /// Structure kind key.
        kind: String,
        /// What was wrong with it.
        message: String,
    },

    /// Snapshot could not be encoded or decoded.
    #[error("Snapshot serialization failed: {0}")]
    Serialization(String),

    /// Snapshot was written by an incompatible format version.
    #[error("Snapshot version mismatch: expected {expected}, got {found}")]
    VersionMismatch {
        /// Version this build understands.
        expected: u32,
        /// Version found in the snapshot.
        found: u32,
    },

    /// Filesystem error while reading or writing a snapshot.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
