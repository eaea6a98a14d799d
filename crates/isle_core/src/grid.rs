//! The world grid: per-cell terrain and territory zones.
//!
//! The grid's shape is fixed at creation. After generation it changes only
//! through the narrow writers [`WorldGrid::set_tile`] and
//! [`WorldGrid::set_zone`]; nothing regenerates it implicitly.

use serde::{Deserialize, Serialize};

use crate::config::MAX_DIMENSION;

/// Territory zone identifier.
pub type ZoneId = u32;

/// 8-neighborhood offsets in a fixed order (row-major around the cell).
pub const NEIGHBORS_8: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Terrain category of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Terrain {
    /// Open grassland, the default terrain.
    #[default]
    Plains,
    /// Woodland.
    Forest,
    /// Stone outcrops.
    Rocks,
    /// Beach and riverbank sand.
    Sand,
    /// Flowing fresh water.
    River,
    /// Open sea.
    Ocean,
    /// Cultivated, planted field.
    Field,
    /// Cultivated field awaiting planting.
    FieldEmpty,
}

impl Terrain {
    /// Every terrain tag, in declaration order.
    pub const ALL: [Terrain; 8] = [
        Terrain::Plains,
        Terrain::Forest,
        Terrain::Rocks,
        Terrain::Sand,
        Terrain::River,
        Terrain::Ocean,
        Terrain::Field,
        Terrain::FieldEmpty,
    ];

    /// Whether this terrain is open water.
    #[must_use]
    pub const fn is_water(self) -> bool {
        matches!(self, Terrain::Ocean | Terrain::River)
    }

    /// Single-character glyph for ASCII dumps.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Terrain::Plains => '.',
            Terrain::Forest => 'T',
            Terrain::Rocks => '^',
            Terrain::Sand => ':',
            Terrain::River => '~',
            Terrain::Ocean => '#',
            Terrain::Field => '"',
            Terrain::FieldEmpty => ',',
        }
    }

    /// Stable lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Terrain::Plains => "plains",
            Terrain::Forest => "forest",
            Terrain::Rocks => "rocks",
            Terrain::Sand => "sand",
            Terrain::River => "river",
            Terrain::Ocean => "ocean",
            Terrain::Field => "field",
            Terrain::FieldEmpty => "field-empty",
        }
    }
}

impl std::fmt::Display for Terrain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Resource base visible to the turn layer.
///
/// Derived from the grid on demand; callers must re-derive it after any
/// tile or zone write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerSummary {
    /// Forest tiles in the player zone.
    pub forest: u32,
    /// Rock tiles in the player zone.
    pub rocks: u32,
    /// Plains and sand tiles in the player zone.
    pub plains_and_sand: u32,
    /// River tiles in the player zone.
    pub river: u32,
    /// Field tiles (planted or empty) in the player zone.
    pub fields: u32,
    /// Distinct ocean tiles touching the player zone (8-neighborhood).
    pub ocean_adjacent: u32,
}

/// Persisted form of a [`WorldGrid`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    /// Grid width in cells.
    pub width: u32,
    /// Grid height in cells.
    pub height: u32,
    /// Terrain per cell, row-major.
    pub terrain: Vec<Terrain>,
    /// Zone per cell, row-major.
    pub zones: Vec<Option<ZoneId>>,
    /// Number of zones in the partition.
    pub zone_count: u32,
    /// The player's zone.
    pub player_zone: Option<ZoneId>,
}

/// Rectangular terrain grid with a territory partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldGrid {
    width: u32,
    height: u32,
    terrain: Vec<Terrain>,
    zones: Vec<Option<ZoneId>>,
    zone_count: u32,
    player_zone: Option<ZoneId>,
}

impl WorldGrid {
    /// Create a grid filled with plains and no zones.
    ///
    /// Dimensions are clamped to `[1, MAX_DIMENSION]`.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.clamp(1, MAX_DIMENSION);
        let height = height.clamp(1, MAX_DIMENSION);
        let cell_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            terrain: vec![Terrain::Plains; cell_count],
            zones: vec![None; cell_count],
            zone_count: 0,
            player_zone: None,
        }
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.terrain.len()
    }

    /// Convert (x, y) coordinates to grid index.
    #[inline]
    fn coords_to_index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Convert a grid index back to coordinates.
    #[inline]
    #[must_use]
    pub fn index_to_coords(&self, index: usize) -> (u32, u32) {
        let w = self.width as usize;
        ((index % w) as u32, (index / w) as u32)
    }

    /// Check if coordinates are within grid bounds.
    #[must_use]
    pub fn in_bounds(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    /// Apply a signed offset, returning `None` when it leaves the grid.
    #[must_use]
    pub fn offset(&self, x: u32, y: u32, dx: i32, dy: i32) -> Option<(u32, u32)> {
        let nx = i64::from(x) + i64::from(dx);
        let ny = i64::from(y) + i64::from(dy);
        if nx < 0 || ny < 0 || nx >= i64::from(self.width) || ny >= i64::from(self.height) {
            None
        } else {
            Some((nx as u32, ny as u32))
        }
    }

    /// In-bounds 8-neighbors of a cell.
    pub fn neighbors8(&self, x: u32, y: u32) -> impl Iterator<Item = (u32, u32)> + '_ {
        NEIGHBORS_8
            .iter()
            .filter_map(move |&(dx, dy)| self.offset(x, y, dx, dy))
    }

    /// Terrain at coordinates, `None` if out of bounds.
    #[must_use]
    pub fn terrain(&self, x: u32, y: u32) -> Option<Terrain> {
        if self.in_bounds(x, y) {
            Some(self.terrain[self.coords_to_index(x, y)])
        } else {
            None
        }
    }

    /// Zone at coordinates, `None` if out of bounds or unassigned.
    #[must_use]
    pub fn zone(&self, x: u32, y: u32) -> Option<ZoneId> {
        if self.in_bounds(x, y) {
            self.zones[self.coords_to_index(x, y)]
        } else {
            None
        }
    }

    /// Write a single cell's terrain.
    ///
    /// Returns `false` if out of bounds.
    pub fn set_tile(&mut self, x: u32, y: u32, terrain: Terrain) -> bool {
        if self.in_bounds(x, y) {
            let index = self.coords_to_index(x, y);
            self.terrain[index] = terrain;
            true
        } else {
            false
        }
    }

    /// Write a single cell's zone.
    ///
    /// Returns `false` if out of bounds or the zone id does not exist.
    pub fn set_zone(&mut self, x: u32, y: u32, zone: Option<ZoneId>) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        if matches!(zone, Some(z) if z >= self.zone_count) {
            return false;
        }
        let index = self.coords_to_index(x, y);
        self.zones[index] = zone;
        true
    }

    /// Replace the whole partition. Used by the zoning pass.
    pub(crate) fn set_partition(
        &mut self,
        zones: Vec<Option<ZoneId>>,
        zone_count: u32,
        player_zone: Option<ZoneId>,
    ) {
        debug_assert_eq!(zones.len(), self.terrain.len());
        self.zones = zones;
        self.zone_count = zone_count;
        self.player_zone = player_zone;
    }

    /// Row-major terrain slice.
    #[must_use]
    pub fn terrain_cells(&self) -> &[Terrain] {
        &self.terrain
    }

    /// Row-major zone slice.
    #[must_use]
    pub fn zone_cells(&self) -> &[Option<ZoneId>] {
        &self.zones
    }

    /// Number of zones in the partition.
    #[must_use]
    pub const fn zone_count(&self) -> u32 {
        self.zone_count
    }

    /// The player's zone, if any land was generated.
    #[must_use]
    pub const fn player_zone(&self) -> Option<ZoneId> {
        self.player_zone
    }

    /// Whether a cell belongs to the player's zone.
    #[must_use]
    pub fn is_player_zone(&self, x: u32, y: u32) -> bool {
        match self.player_zone {
            Some(player) => self.zone(x, y) == Some(player),
            None => false,
        }
    }

    /// Coordinates of all cells in the player's zone, row-major.
    #[must_use]
    pub fn player_zone_cells(&self) -> Vec<(u32, u32)> {
        let Some(player) = self.player_zone else {
            return Vec::new();
        };
        self.zones
            .iter()
            .enumerate()
            .filter(|(_, z)| **z == Some(player))
            .map(|(i, _)| self.index_to_coords(i))
            .collect()
    }

    /// Number of cells with the given terrain.
    #[must_use]
    pub fn count(&self, terrain: Terrain) -> usize {
        self.terrain.iter().filter(|t| **t == terrain).count()
    }

    /// Derive the player's resource base.
    #[must_use]
    pub fn player_summary(&self) -> PlayerSummary {
        let mut summary = PlayerSummary::default();
        let Some(player) = self.player_zone else {
            return summary;
        };

        let mut ocean_seen = vec![false; self.terrain.len()];
        for (index, zone) in self.zones.iter().enumerate() {
            if *zone != Some(player) {
                continue;
            }
            match self.terrain[index] {
                Terrain::Forest => summary.forest += 1,
                Terrain::Rocks => summary.rocks += 1,
                Terrain::Plains | Terrain::Sand => summary.plains_and_sand += 1,
                Terrain::River => summary.river += 1,
                Terrain::Field | Terrain::FieldEmpty => summary.fields += 1,
                Terrain::Ocean => {}
            }

            let (x, y) = self.index_to_coords(index);
            for (nx, ny) in self.neighbors8(x, y) {
                let n = self.coords_to_index(nx, ny);
                if self.terrain[n] == Terrain::Ocean && !ocean_seen[n] {
                    ocean_seen[n] = true;
                    summary.ocean_adjacent += 1;
                }
            }
        }
        summary
    }

    /// Deep copy of the persisted fields.
    #[must_use]
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            width: self.width,
            height: self.height,
            terrain: self.terrain.clone(),
            zones: self.zones.clone(),
            zone_count: self.zone_count,
            player_zone: self.player_zone,
        }
    }

    /// Rebuild a grid verbatim from a snapshot.
    ///
    /// Corrupted snapshots are repaired rather than rejected: dimensions are
    /// clamped to `[1, MAX_DIMENSION]`, short arrays are padded (plains /
    /// unassigned), long arrays truncated, and zone ids outside the
    /// partition cleared.
    #[must_use]
    pub fn from_snapshot(snapshot: &GridSnapshot) -> Self {
        let mut grid = Self::new(snapshot.width, snapshot.height);
        if (grid.width, grid.height) != (snapshot.width, snapshot.height) {
            tracing::warn!(
                width = snapshot.width,
                height = snapshot.height,
                clamped_width = grid.width,
                clamped_height = grid.height,
                "Grid snapshot dimensions out of range; clamping"
            );
        }
        let cell_count = grid.cell_count();

        if snapshot.terrain.len() != cell_count || snapshot.zones.len() != cell_count {
            tracing::warn!(
                expected = cell_count,
                terrain = snapshot.terrain.len(),
                zones = snapshot.zones.len(),
                "Grid snapshot arrays do not match dimensions; padding/truncating"
            );
        }

        for (dst, src) in grid.terrain.iter_mut().zip(&snapshot.terrain) {
            *dst = *src;
        }

        grid.zone_count = snapshot.zone_count;
        let mut cleared = 0usize;
        for (dst, src) in grid.zones.iter_mut().zip(&snapshot.zones) {
            *dst = match *src {
                Some(z) if z < snapshot.zone_count => Some(z),
                Some(_) => {
                    cleared += 1;
                    None
                }
                None => None,
            };
        }
        if cleared > 0 {
            tracing::warn!(cleared, "Cleared out-of-range zone ids from grid snapshot");
        }

        grid.player_zone = match snapshot.player_zone {
            Some(z) if z < snapshot.zone_count => Some(z),
            Some(z) => {
                tracing::warn!(player_zone = z, "Dropped out-of-range player zone");
                None
            }
            None => None,
        };
        grid
    }

    /// Render the grid as ASCII, one line per row.
    ///
    /// Plains inside the player zone are drawn as `o` so the territory
    /// stands out.
    #[must_use]
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(self.terrain.len() + self.height as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                let t = self.terrain[self.coords_to_index(x, y)];
                let glyph = if self.is_player_zone(x, y) && t == Terrain::Plains {
                    'o'
                } else {
                    t.glyph()
                };
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }
}
