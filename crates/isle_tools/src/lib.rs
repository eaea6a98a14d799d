//! # Isle Development Tools
//!
//! Command-line tools for development:
//! - World preview (ASCII map and resource summary)
//! - Structure catalog and world config validators
//! - Placement demo

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod report;
pub mod validate;

use thiserror::Error;

/// Errors surfaced by the tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Core data or persistence failure.
    #[error(transparent)]
    Isle(#[from] isle_core::error::IsleError),

    /// JSON output failure.
    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A structure name on the command line is not a known kind.
    #[error("Unknown structure '{0}'")]
    UnknownStructure(String),
}

/// Result type alias using [`ToolError`].
pub type Result<T> = std::result::Result<T, ToolError>;
