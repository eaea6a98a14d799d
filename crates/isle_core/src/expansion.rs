//! Border expansion: grow the player zone one cell in a cardinal direction.
//!
//! Candidates are the cells one step in the chosen direction from each
//! player-zone cell, excluding cells already in the player zone. Land
//! candidates are claimed from whichever zone held them; ocean candidates
//! are skipped. The grid's terrain is never touched.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::{Terrain, WorldGrid, ZoneId};

/// Cardinal expansion direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpansionDirection {
    /// Toward row 0.
    North,
    /// Toward the last row.
    South,
    /// Toward the last column.
    East,
    /// Toward column 0.
    West,
}

impl ExpansionDirection {
    /// All directions.
    pub const ALL: [ExpansionDirection; 4] = [
        ExpansionDirection::North,
        ExpansionDirection::South,
        ExpansionDirection::East,
        ExpansionDirection::West,
    ];

    /// Unit step as `(dx, dy)`.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            ExpansionDirection::North => (0, -1),
            ExpansionDirection::South => (0, 1),
            ExpansionDirection::East => (1, 0),
            ExpansionDirection::West => (-1, 0),
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ExpansionDirection::North => "north",
            ExpansionDirection::South => "south",
            ExpansionDirection::East => "east",
            ExpansionDirection::West => "west",
        }
    }
}

impl std::fmt::Display for ExpansionDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Why the border could not move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExpansionError {
    /// The world has no player zone.
    #[error("There is no player territory to expand")]
    NoPlayerZone,

    /// Every candidate cell in that direction is ocean.
    #[error("Expansion {0} is blocked by ocean")]
    BlockedByOcean(ExpansionDirection),

    /// The territory already touches the map edge along that whole side.
    #[error("Expansion {0} is blocked by the map edge")]
    BlockedByEdge(ExpansionDirection),
}

/// What an expansion claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionReport {
    /// Direction expanded.
    pub direction: ExpansionDirection,
    /// Land cells now in the player zone, row-major.
    pub claimed: Vec<(u32, u32)>,
    /// Zones that lost cells, with how many.
    pub taken_from: Vec<(ZoneId, u32)>,
    /// Ocean candidates left unclaimed.
    pub ocean_skipped: u32,
}

/// Move the player zone's border one cell outward.
///
/// # Errors
///
/// [`ExpansionError::BlockedByEdge`] when no candidate is on the map,
/// [`ExpansionError::BlockedByOcean`] when every candidate is ocean. The
/// zone grid is unchanged on error.
pub fn expand_border(
    grid: &mut WorldGrid,
    direction: ExpansionDirection,
) -> Result<ExpansionReport, ExpansionError> {
    let player = grid.player_zone().ok_or(ExpansionError::NoPlayerZone)?;
    let (dx, dy) = direction.delta();

    let candidates: BTreeSet<(u32, u32)> = grid
        .player_zone_cells()
        .into_iter()
        .filter_map(|(x, y)| grid.offset(x, y, dx, dy))
        .filter(|&(x, y)| !grid.is_player_zone(x, y))
        .map(|(x, y)| (y, x))
        .collect();

    if candidates.is_empty() {
        return Err(ExpansionError::BlockedByEdge(direction));
    }

    let land: Vec<(u32, u32)> = candidates
        .iter()
        .map(|&(y, x)| (x, y))
        .filter(|&(x, y)| grid.terrain(x, y).is_some_and(|t| t != Terrain::Ocean))
        .collect();

    if land.is_empty() {
        return Err(ExpansionError::BlockedByOcean(direction));
    }

    let mut taken_from: Vec<(ZoneId, u32)> = Vec::new();
    for &(x, y) in &land {
        if let Some(previous) = grid.zone(x, y) {
            match taken_from.iter_mut().find(|(z, _)| *z == previous) {
                Some((_, n)) => *n += 1,
                None => taken_from.push((previous, 1)),
            }
        }
        grid.set_zone(x, y, Some(player));
    }
    taken_from.sort_unstable();

    let ocean_skipped = (candidates.len() - land.len()) as u32;
    tracing::info!(
        %direction,
        claimed = land.len(),
        ocean_skipped,
        "Border expanded"
    );

    Ok(ExpansionReport {
        direction,
        claimed: land,
        taken_from,
        ocean_skipped,
    })
}
