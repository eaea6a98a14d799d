//! # Isle Core
//!
//! Deterministic world generation and structure placement for Isleforge.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No ambient randomness (every draw comes from an explicit [`rng::SeededRng`])
//! - No IO outside the snapshot file helpers on [`session::Session`]
//!
//! This separation enables:
//! - Exact save/load (persist one RNG integer plus the grid and registry)
//! - Headless tools and benchmarks
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`rng`] - Seeded xorshift random source
//! - [`grid`] - Terrain grid and territory partition
//! - [`worldgen`] - Ocean, biome, river, sand and zoning pipeline
//! - [`catalog`] - Data-driven structure definitions
//! - [`placement`] - Placement search and structure registry
//! - [`expansion`] - Player border expansion
//! - [`session`] - Session ownership, snapshots, persistence
//! - [`math`] - Fixed-point helpers for placement scoring

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod expansion;
pub mod grid;
pub mod math;
pub mod placement;
pub mod rng;
pub mod session;
pub mod worldgen;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{Footprint, StructureCatalog, StructureDef, StructureKind};
    pub use crate::config::{GenerationParams, WorldConfig};
    pub use crate::error::{IsleError, Result};
    pub use crate::expansion::{ExpansionDirection, ExpansionError, ExpansionReport};
    pub use crate::grid::{PlayerSummary, Terrain, WorldGrid, ZoneId};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::placement::{
        NoPlacementReason, PlacementCandidate, PlacementEngine, PlacementError, StructureId,
        StructureInstance, StructureView,
    };
    pub use crate::rng::SeededRng;
    pub use crate::session::{Session, SessionSnapshot, SNAPSHOT_VERSION};
    pub use crate::worldgen::{generate_world, GeneratedWorld, GenerationReport, OceanLayout};
}
