//! Test fixtures and helpers.
//!
//! Hand-built grids and sessions for scenario tests. Grids are drawn as
//! ASCII using [`Terrain::glyph`] for terrain and digits for zones.

use fixed::types::I32F32;
use isle_core::catalog::StructureCatalog;
use isle_core::config::WorldConfig;
use isle_core::grid::{GridSnapshot, Terrain, WorldGrid, ZoneId};
use isle_core::placement::RegistrySnapshot;
use isle_core::session::{Session, SessionSnapshot, SNAPSHOT_VERSION};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Terrain for an ASCII glyph.
#[must_use]
pub fn terrain_from_glyph(glyph: char) -> Option<Terrain> {
    Terrain::ALL.into_iter().find(|t| t.glyph() == glyph)
}

/// Build a grid from terrain rows and zone rows.
///
/// Zone rows use `0`-`9` for zone ids and any other character for
/// "unassigned". The zone count is one more than the highest id used.
///
/// # Panics
///
/// Panics if rows are ragged, the two layers differ in shape, or a glyph
/// is unknown.
#[must_use]
pub fn grid_from_ascii(terrain: &[&str], zones: &[&str], player_zone: Option<ZoneId>) -> WorldGrid {
    assert_eq!(terrain.len(), zones.len(), "layer heights differ");
    let width = terrain.first().map_or(0, |row| row.chars().count());

    let mut cells = Vec::new();
    let mut zone_cells = Vec::new();
    for (t_row, z_row) in terrain.iter().zip(zones) {
        assert_eq!(t_row.chars().count(), width, "ragged terrain row");
        assert_eq!(z_row.chars().count(), width, "ragged zone row");
        for glyph in t_row.chars() {
            cells.push(terrain_from_glyph(glyph).unwrap_or_else(|| panic!("unknown glyph {glyph:?}")));
        }
        zone_cells.extend(z_row.chars().map(|c| c.to_digit(10)));
    }

    let zone_count = zone_cells.iter().flatten().max().map_or(0, |z| z + 1);
    WorldGrid::from_snapshot(&GridSnapshot {
        width: width as u32,
        height: terrain.len() as u32,
        terrain: cells,
        zones: zone_cells,
        zone_count,
        player_zone,
    })
}

/// Wrap a hand-built grid in a session with an empty registry.
///
/// # Panics
///
/// Panics if the snapshot is rejected.
#[must_use]
pub fn session_with_grid(grid: &WorldGrid, rng_state: i32) -> Session {
    let snapshot = SessionSnapshot {
        version: SNAPSHOT_VERSION,
        rng_state,
        config: WorldConfig::standard().with_size(grid.width(), grid.height()),
        grid: grid.snapshot(),
        registry: RegistrySnapshot::default(),
    };
    Session::from_snapshot(&snapshot, StructureCatalog::default()).expect("fixture snapshot")
}

/// 8x6 world whose player zone (left half) is all forest and rocks: no
/// plains or sand at all.
#[must_use]
pub fn forest_zone_grid() -> WorldGrid {
    grid_from_ascii(
        &[
            "TTTT....", //
            "TT^T....",
            "TTTT....",
            "T^^T....",
            "TTTT....",
            "TTTT....",
        ],
        &[
            "00001111", //
            "00001111",
            "00001111",
            "00001111",
            "00001111",
            "00001111",
        ],
        Some(0),
    )
}

/// 8x5 world with the player zone on the left and ocean directly east of
/// it; the zone already touches the west, north and south edges.
#[must_use]
pub fn ocean_locked_grid() -> WorldGrid {
    grid_from_ascii(
        &[
            "...##...", //
            "...##...",
            "...##...",
            "...##...",
            "...##...",
        ],
        &[
            "000--111", //
            "000--111",
            "000--111",
            "000--111",
            "000--111",
        ],
        Some(0),
    )
}

/// 6x6 plains world split into two zones, the player zone on top.
#[must_use]
pub fn two_zone_grid() -> WorldGrid {
    grid_from_ascii(
        &[
            "......", //
            "......",
            "......",
            "......",
            "......",
            "......",
        ],
        &[
            "000000", //
            "000000",
            "000000",
            "111111",
            "111111",
            "111111",
        ],
        Some(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_lookup() {
        assert_eq!(terrain_from_glyph('#'), Some(Terrain::Ocean));
        assert_eq!(terrain_from_glyph('T'), Some(Terrain::Forest));
        assert_eq!(terrain_from_glyph('?'), None);
    }

    #[test]
    fn test_grid_from_ascii() {
        let grid = ocean_locked_grid();
        assert_eq!(grid.width(), 8);
        assert_eq!(grid.height(), 5);
        assert_eq!(grid.zone_count(), 2);
        assert_eq!(grid.terrain(3, 2), Some(Terrain::Ocean));
        assert_eq!(grid.zone(3, 2), None);
        assert_eq!(grid.zone(6, 0), Some(1));
        assert_eq!(grid.player_zone_cells().len(), 15);
    }

    #[test]
    fn test_forest_zone_has_no_open_land() {
        let summary = forest_zone_grid().player_summary();
        assert_eq!(summary.plains_and_sand, 0);
        assert_eq!(summary.rocks, 3);
        assert_eq!(summary.forest, 21);
    }

    #[test]
    fn test_session_with_grid() {
        let grid = two_zone_grid();
        let session = session_with_grid(&grid, 11);
        assert_eq!(session.grid(), &grid);
        assert_eq!(session.rng_state(), 11);
        assert!(session.engine().structures().is_empty());
    }

    #[test]
    fn test_fixed_helpers() {
        assert_eq!(fixed(3), I32F32::from_num(3));
        assert_eq!(fixed_f(0.5) * fixed(2), fixed(1));
    }
}
