//! Procedural world generation.
//!
//! Produces a terrain grid and a territory partition from one draw
//! sequence on the shared [`SeededRng`]. Stages run in a fixed order and
//! each consumes the random source and the partially built grid:
//!
//! 1. Base fill (plains)
//! 2. Ocean layout ([`ocean`])
//! 3. Clustered rocks and forest ([`biomes`])
//! 4. Rivers ([`rivers`])
//! 5. Sand ([`sand`])
//! 6. Zoning ([`zoning`])
//!
//! Changing the order or the number of draws in any stage changes every
//! world generated from a given seed.

pub mod biomes;
pub mod ocean;
pub mod rivers;
pub mod sand;
pub mod zoning;

use serde::{Deserialize, Serialize};

use crate::config::WorldConfig;
use crate::grid::{Terrain, WorldGrid, ZoneId};
use crate::rng::SeededRng;

pub use ocean::OceanLayout;

/// Width range used when regeneration draws a new size.
pub const DRAWN_WIDTH_RANGE: (u32, u32) = (24, 36);

/// Height range used when regeneration draws a new size.
pub const DRAWN_HEIGHT_RANGE: (u32, u32) = (16, 24);

/// What each stage produced, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Ocean layout that was drawn.
    pub layout: OceanLayout,
    /// Ocean cells after smoothing.
    pub ocean_cells: usize,
    /// Cells converted to rocks.
    pub rocks: usize,
    /// Cells converted to forest.
    pub forest: usize,
    /// Rivers actually carved.
    pub rivers: u32,
    /// River cells after carving.
    pub river_cells: usize,
    /// Cells converted to sand.
    pub sand: usize,
    /// Non-ocean cells.
    pub land_cells: usize,
    /// Zones in the partition.
    pub zone_count: u32,
    /// The player's zone.
    pub player_zone: Option<ZoneId>,
}

/// A freshly generated world.
#[derive(Debug, Clone)]
pub struct GeneratedWorld {
    /// The terrain grid and partition.
    pub grid: WorldGrid,
    /// Per-stage summary.
    pub report: GenerationReport,
}

/// Generate a world with the given configuration.
///
/// Dimensions are clamped to the supported range before any draw.
pub fn generate_world(config: &WorldConfig, rng: &mut SeededRng) -> GeneratedWorld {
    let (width, height) = config.clamped_size();
    let params = &config.params;

    // 1. Base fill
    let mut grid = WorldGrid::new(width, height);

    // 2. Ocean
    let layout = ocean::carve_ocean(&mut grid, params, rng);
    let ocean_cells = grid.count(Terrain::Ocean);
    tracing::debug!(?layout, ocean_cells, "Ocean carved");

    // 3. Biomes
    let (rocks, forest) = biomes::place_biomes(&mut grid, params, rng);
    tracing::debug!(rocks, forest, "Biomes placed");

    // 4. Rivers
    let rivers = rivers::carve_rivers(&mut grid, params, rng);
    let river_cells = grid.count(Terrain::River);
    tracing::debug!(rivers, river_cells, "Rivers carved");

    // 5. Sand
    let sand = sand::place_sand(&mut grid, params, rng);
    tracing::debug!(sand, "Sand placed");

    // 6. Zoning
    zoning::assign_zones(&mut grid, params, rng);
    let land_cells = grid.cell_count() - grid.count(Terrain::Ocean);

    let report = GenerationReport {
        layout,
        ocean_cells,
        rocks,
        forest,
        rivers,
        river_cells,
        sand,
        land_cells,
        zone_count: grid.zone_count(),
        player_zone: grid.player_zone(),
    };
    tracing::info!(
        width,
        height,
        ?layout,
        zones = report.zone_count,
        player_zone = ?report.player_zone,
        "World generated"
    );

    GeneratedWorld { grid, report }
}

/// Draw a world size for regeneration without explicit dimensions.
pub fn draw_dimensions(rng: &mut SeededRng) -> (u32, u32) {
    let width = rng.range_i64(
        i64::from(DRAWN_WIDTH_RANGE.0),
        i64::from(DRAWN_WIDTH_RANGE.1),
    );
    let height = rng.range_i64(
        i64::from(DRAWN_HEIGHT_RANGE.0),
        i64::from(DRAWN_HEIGHT_RANGE.1),
    );
    (width as u32, height as u32)
}
