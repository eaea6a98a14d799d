//! Structure placement: legality search and the structure registry.
//!
//! A placement request either fully succeeds (terrain replaced, instance
//! registered, version bumped) or fails with a [`PlacementError`] and
//! leaves the grid and registry untouched.
//!
//! Candidates are legal when every footprint cell lies in the player zone,
//! is not occupied by another structure, and either has allowed terrain or
//! can be replaced (replacement enabled, a replacement terrain defined, and
//! the cell is not ocean). The best candidate minimizes, in order:
//!
//! 1. replacement cells
//! 2. squared distance from footprint center to the anchor
//! 3. row-major position (top, then left)

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{StructureCatalog, StructureDef, StructureKind};
use crate::grid::{Terrain, WorldGrid};
use crate::math::{Fixed, Vec2Fixed};

// ============================================================================
// Instances
// ============================================================================

/// Serial identifier of a structure instance. Never reused in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructureId(pub u64);

impl std::fmt::Display for StructureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructureInstance {
    /// Serial identifier.
    pub id: StructureId,
    /// Structure type.
    pub kind: StructureKind,
    /// Left column of the footprint.
    pub x: u32,
    /// Top row of the footprint.
    pub y: u32,
    /// Footprint width.
    pub width: u32,
    /// Footprint height.
    pub height: u32,
}

impl StructureInstance {
    /// Whether the footprint covers `(x, y)`.
    #[must_use]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x - self.x < self.width && y - self.y < self.height
    }

    /// Footprint cells, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        footprint_cells(self.x, self.y, self.width, self.height)
    }

    /// Footprint center in cell coordinates.
    #[must_use]
    pub fn center(&self) -> Vec2Fixed {
        Vec2Fixed::footprint_center(self.x, self.y, self.width, self.height)
    }

    /// Whether two footprints share a cell.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let (x0, y0, w0, h0) = self.bounds();
        let (x1, y1, w1, h1) = other.bounds();
        x0 < x1 + w1 && x1 < x0 + w0 && y0 < y1 + h1 && y1 < y0 + h0
    }

    /// Whether the footprint is non-empty and lies inside the grid.
    #[must_use]
    pub fn fits(&self, grid: &WorldGrid) -> bool {
        self.width > 0
            && self.height > 0
            && self.x.checked_add(self.width).is_some_and(|r| r <= grid.width())
            && self.y.checked_add(self.height).is_some_and(|b| b <= grid.height())
    }

    fn bounds(&self) -> (u64, u64, u64, u64) {
        (
            u64::from(self.x),
            u64::from(self.y),
            u64::from(self.width),
            u64::from(self.height),
        )
    }
}

/// Read-only projection of an instance for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureView {
    /// The instance.
    pub instance: StructureInstance,
    /// Display name from the catalog, or the kind key if the catalog has
    /// no entry.
    pub display_name: String,
}

impl StructureView {
    /// Pair an instance with its catalog display name.
    #[must_use]
    pub fn new(instance: &StructureInstance, catalog: &StructureCatalog) -> Self {
        let display_name = catalog
            .get(instance.kind)
            .map_or_else(|| instance.kind.key().to_string(), |def| def.display_name.clone());
        Self {
            instance: instance.clone(),
            display_name,
        }
    }
}

fn footprint_cells(x: u32, y: u32, width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    let right = x.saturating_add(width);
    (y..y.saturating_add(height)).flat_map(move |cy| (x..right).map(move |cx| (cx, cy)))
}

// ============================================================================
// Candidates and failures
// ============================================================================

/// A legal, scored placement proposal. Exists only during one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementCandidate {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Footprint width.
    pub width: u32,
    /// Footprint height.
    pub height: u32,
    /// Cells whose terrain must be overwritten, row-major.
    pub replacements: Vec<(u32, u32)>,
    /// Squared distance from the footprint center to the anchor.
    pub distance_sq: Fixed,
}

impl PlacementCandidate {
    /// Ordering key; lower is better. Row-major position breaks ties.
    fn rank(&self) -> (usize, Fixed, u32, u32) {
        (self.replacements.len(), self.distance_sq, self.y, self.x)
    }
}

/// Why a search found nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoPlacementReason {
    /// The footprint fits inside the player zone somewhere, but terrain or
    /// existing structures rule out every such position.
    Terrain,
    /// The footprint does not fit inside the player zone anywhere.
    Zone,
}

impl std::fmt::Display for NoPlacementReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoPlacementReason::Terrain => {
                f.write_str("no free spot with suitable terrain in your territory")
            }
            NoPlacementReason::Zone => f.write_str("the footprint does not fit inside your territory"),
        }
    }
}

/// Recoverable placement failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// The catalog has no definition for the kind.
    #[error("No definition for structure '{0}'")]
    UnknownKind(StructureKind),

    /// A unique structure already exists.
    #[error("A {0} already exists")]
    UniqueAlreadyBuilt(StructureKind),

    /// The world has no player zone.
    #[error("There is no player territory")]
    NoPlayerZone,

    /// The footprint leaves the grid.
    #[error("Footprint at ({x}, {y}) leaves the map")]
    OutOfBounds {
        /// Requested left column.
        x: u32,
        /// Requested top row.
        y: u32,
    },

    /// A footprint cell is outside the player zone.
    #[error("Cell ({x}, {y}) is outside your territory")]
    OutsideZone {
        /// Offending column.
        x: u32,
        /// Offending row.
        y: u32,
    },

    /// A footprint cell is taken by another structure.
    #[error("Cell ({x}, {y}) is already occupied")]
    Occupied {
        /// Offending column.
        x: u32,
        /// Offending row.
        y: u32,
    },

    /// A footprint cell has terrain the structure cannot use or replace.
    #[error("Cell ({x}, {y}) is {terrain}, which this structure cannot use")]
    TerrainMismatch {
        /// Offending column.
        x: u32,
        /// Offending row.
        y: u32,
        /// The cell's terrain.
        terrain: Terrain,
    },

    /// The search found no legal position.
    #[error("No placement available for {kind}: {reason}")]
    NoPlacementAvailable {
        /// Structure that was requested.
        kind: StructureKind,
        /// Zone or terrain failure.
        reason: NoPlacementReason,
    },
}

impl PlacementError {
    /// The no-placement reason, if this is a search failure.
    #[must_use]
    pub const fn no_placement_reason(&self) -> Option<NoPlacementReason> {
        match self {
            PlacementError::NoPlacementAvailable { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Persisted form of the structure registry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Every instance in registration order.
    pub instances: Vec<StructureInstance>,
    /// Highest serial handed out so far.
    pub highest_serial: u64,
    /// Instances registered per kind.
    pub counts: BTreeMap<StructureKind, u32>,
}

/// Finds legal footprints and owns the structure registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementEngine {
    instances: Vec<StructureInstance>,
    highest_serial: u64,
    counts: BTreeMap<StructureKind, u32>,
    version: u64,
}

impl PlacementEngine {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered instances in registration order.
    #[must_use]
    pub fn structures(&self) -> &[StructureInstance] {
        &self.instances
    }

    /// Instances registered for a kind.
    #[must_use]
    pub fn count(&self, kind: StructureKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Bumped on every successful registration and restore.
    ///
    /// Views compare this against the value they last rendered.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Highest serial handed out so far.
    #[must_use]
    pub const fn highest_serial(&self) -> u64 {
        self.highest_serial
    }

    /// Display projection of every instance.
    #[must_use]
    pub fn views(&self, catalog: &StructureCatalog) -> Vec<StructureView> {
        self.instances
            .iter()
            .map(|instance| StructureView::new(instance, catalog))
            .collect()
    }

    /// Every cell covered by a registered footprint, recomputed per call.
    #[must_use]
    pub fn occupied_cells(&self) -> HashSet<(u32, u32)> {
        self.instances.iter().flat_map(|s| s.cells()).collect()
    }

    /// The structure covering a cell, if any.
    #[must_use]
    pub fn structure_at(&self, x: u32, y: u32) -> Option<&StructureInstance> {
        self.instances.iter().find(|s| s.contains(x, y))
    }

    /// Reference point that placement distance is measured from: the
    /// capital's footprint center if one exists, else the player zone's
    /// centroid.
    #[must_use]
    pub fn anchor(&self, grid: &WorldGrid) -> Option<Vec2Fixed> {
        if let Some(capital) = self
            .instances
            .iter()
            .find(|s| s.kind == StructureKind::Capital)
        {
            return Some(capital.center());
        }
        Vec2Fixed::centroid(grid.player_zone_cells())
    }

    /// Search every top-left coordinate for the best legal candidate.
    ///
    /// Does not mutate anything.
    ///
    /// # Errors
    ///
    /// [`PlacementError::UniqueAlreadyBuilt`] and
    /// [`PlacementError::NoPlayerZone`] take precedence; otherwise
    /// [`PlacementError::NoPlacementAvailable`] when no candidate is legal.
    pub fn best_placement(
        &self,
        grid: &WorldGrid,
        def: &StructureDef,
        allow_replacement: bool,
    ) -> Result<PlacementCandidate, PlacementError> {
        let anchor = self.check_preconditions(grid, def)?;
        let occupied = self.occupied_cells();
        let (w, h) = (def.footprint.width, def.footprint.height);

        let mut best: Option<PlacementCandidate> = None;
        let mut fits_zone = false;

        if w <= grid.width() && h <= grid.height() {
            for y in 0..=grid.height() - h {
                for x in 0..=grid.width() - w {
                    if !fits_zone {
                        fits_zone = footprint_cells(x, y, w, h)
                            .all(|(cx, cy)| grid.is_player_zone(cx, cy));
                    }
                    let Ok(candidate) =
                        evaluate(grid, &occupied, def, allow_replacement, anchor, x, y)
                    else {
                        continue;
                    };
                    if best.as_ref().map_or(true, |b| candidate.rank() < b.rank()) {
                        best = Some(candidate);
                    }
                }
            }
        }

        best.ok_or(PlacementError::NoPlacementAvailable {
            kind: def.kind,
            reason: if fits_zone {
                NoPlacementReason::Terrain
            } else {
                NoPlacementReason::Zone
            },
        })
    }

    /// Run the legality check against one caller-chosen coordinate.
    ///
    /// # Errors
    ///
    /// Returns the precondition failure or the first failing cell, scanning
    /// the footprint row-major.
    pub fn placement_at(
        &self,
        grid: &WorldGrid,
        def: &StructureDef,
        x: u32,
        y: u32,
        allow_replacement: bool,
    ) -> Result<PlacementCandidate, PlacementError> {
        let anchor = self.check_preconditions(grid, def)?;
        let occupied = self.occupied_cells();
        evaluate(grid, &occupied, def, allow_replacement, anchor, x, y)
    }

    /// Every legal top-left coordinate, row-major. Empty when a
    /// precondition fails.
    #[must_use]
    pub fn available_placements(
        &self,
        grid: &WorldGrid,
        def: &StructureDef,
        allow_replacement: bool,
    ) -> Vec<(u32, u32)> {
        let Ok(anchor) = self.check_preconditions(grid, def) else {
            return Vec::new();
        };
        let occupied = self.occupied_cells();
        let (w, h) = (def.footprint.width, def.footprint.height);
        if w > grid.width() || h > grid.height() {
            return Vec::new();
        }

        let mut out = Vec::new();
        for y in 0..=grid.height() - h {
            for x in 0..=grid.width() - w {
                if evaluate(grid, &occupied, def, allow_replacement, anchor, x, y).is_ok() {
                    out.push((x, y));
                }
            }
        }
        out
    }

    /// Find the best placement and register it.
    ///
    /// # Errors
    ///
    /// See [`best_placement`](Self::best_placement). On error nothing is
    /// mutated.
    pub fn place_best(
        &mut self,
        grid: &mut WorldGrid,
        def: &StructureDef,
        allow_replacement: bool,
    ) -> Result<StructureInstance, PlacementError> {
        let candidate = self.best_placement(grid, def, allow_replacement)?;
        Ok(self.register(grid, def, &candidate))
    }

    /// Check one coordinate and register it.
    ///
    /// # Errors
    ///
    /// See [`placement_at`](Self::placement_at). On error nothing is
    /// mutated.
    pub fn place_at(
        &mut self,
        grid: &mut WorldGrid,
        def: &StructureDef,
        x: u32,
        y: u32,
        allow_replacement: bool,
    ) -> Result<StructureInstance, PlacementError> {
        let candidate = self.placement_at(grid, def, x, y, allow_replacement)?;
        Ok(self.register(grid, def, &candidate))
    }

    /// Commit a candidate: replace terrain, assign a serial, append, count.
    fn register(
        &mut self,
        grid: &mut WorldGrid,
        def: &StructureDef,
        candidate: &PlacementCandidate,
    ) -> StructureInstance {
        if let Some(replacement) = def.replacement_terrain {
            for &(x, y) in &candidate.replacements {
                grid.set_tile(x, y, replacement);
            }
        }

        self.highest_serial += 1;
        let instance = StructureInstance {
            id: StructureId(self.highest_serial),
            kind: def.kind,
            x: candidate.x,
            y: candidate.y,
            width: candidate.width,
            height: candidate.height,
        };

        #[cfg(feature = "debug-validation")]
        {
            for other in &self.instances {
                assert!(
                    !other.overlaps(&instance),
                    "structure {} overlaps {}",
                    instance.id,
                    other.id
                );
            }
        }

        self.instances.push(instance.clone());
        *self.counts.entry(def.kind).or_insert(0) += 1;
        self.version += 1;

        tracing::info!(
            id = instance.id.0,
            kind = %def.kind,
            x = instance.x,
            y = instance.y,
            replaced = candidate.replacements.len(),
            "Structure registered"
        );
        instance
    }

    /// Unique check, player zone check, anchor lookup.
    fn check_preconditions(
        &self,
        grid: &WorldGrid,
        def: &StructureDef,
    ) -> Result<Vec2Fixed, PlacementError> {
        if def.unique && self.instances.iter().any(|s| s.kind == def.kind) {
            return Err(PlacementError::UniqueAlreadyBuilt(def.kind));
        }
        if grid.player_zone().is_none() {
            return Err(PlacementError::NoPlayerZone);
        }
        self.anchor(grid).ok_or(PlacementError::NoPlayerZone)
    }

    /// Deep copy of the registry.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            instances: self.instances.clone(),
            highest_serial: self.highest_serial,
            counts: self.counts.clone(),
        }
    }

    /// Replace the registry from a snapshot.
    ///
    /// Instances are kept in order unless their footprint is empty, leaves
    /// `grid`, overlaps an earlier instance, or repeats a kind the catalog
    /// marks unique; dropped instances are logged. Per-kind counts are
    /// rebuilt from the kept instances. The serial counter resumes from the
    /// larger of the persisted serial and the highest instance id, so new
    /// ids never collide with restored ones.
    pub fn restore(
        &mut self,
        snapshot: &RegistrySnapshot,
        grid: &WorldGrid,
        catalog: &StructureCatalog,
    ) {
        let max_id = snapshot.instances.iter().map(|s| s.id.0).max().unwrap_or(0);
        if max_id > snapshot.highest_serial {
            tracing::warn!(
                persisted = snapshot.highest_serial,
                max_id,
                "Registry serial behind instance ids; advancing"
            );
        }

        let mut kept: Vec<StructureInstance> = Vec::with_capacity(snapshot.instances.len());
        for instance in &snapshot.instances {
            let problem = if !instance.fits(grid) {
                Some("footprint outside the grid")
            } else if kept.iter().any(|other| other.overlaps(instance)) {
                Some("footprint overlaps an earlier structure")
            } else if catalog.get(instance.kind).is_some_and(|def| def.unique)
                && kept.iter().any(|other| other.kind == instance.kind)
            {
                Some("second instance of a unique structure")
            } else {
                None
            };
            match problem {
                Some(problem) => tracing::warn!(
                    id = instance.id.0,
                    kind = %instance.kind,
                    x = instance.x,
                    y = instance.y,
                    problem,
                    "Dropped structure from registry snapshot"
                ),
                None => kept.push(instance.clone()),
            }
        }

        let mut counts = BTreeMap::new();
        for instance in &kept {
            *counts.entry(instance.kind).or_insert(0) += 1;
        }
        if counts != snapshot.counts {
            tracing::warn!("Registry counts disagree with instances; rebuilt");
        }

        self.instances = kept;
        self.highest_serial = snapshot.highest_serial.max(max_id);
        self.counts = counts;
        self.version += 1;
    }

    /// Drop every instance, keeping the serial counter so ids stay unique
    /// across regenerations.
    pub fn clear(&mut self) {
        self.instances.clear();
        self.counts.clear();
        self.version += 1;
    }
}

/// Legality check for one top-left coordinate.
fn evaluate(
    grid: &WorldGrid,
    occupied: &HashSet<(u32, u32)>,
    def: &StructureDef,
    allow_replacement: bool,
    anchor: Vec2Fixed,
    x: u32,
    y: u32,
) -> Result<PlacementCandidate, PlacementError> {
    let (w, h) = (def.footprint.width, def.footprint.height);
    let fits = x
        .checked_add(w)
        .zip(y.checked_add(h))
        .is_some_and(|(right, bottom)| right <= grid.width() && bottom <= grid.height());
    if !fits {
        return Err(PlacementError::OutOfBounds { x, y });
    }

    let can_replace = allow_replacement && def.replacement_terrain.is_some();
    let mut replacements = Vec::new();

    for (cx, cy) in footprint_cells(x, y, w, h) {
        if !grid.is_player_zone(cx, cy) {
            return Err(PlacementError::OutsideZone { x: cx, y: cy });
        }
        if occupied.contains(&(cx, cy)) {
            return Err(PlacementError::Occupied { x: cx, y: cy });
        }
        let terrain = grid.terrain(cx, cy).unwrap_or(Terrain::Ocean);
        if def.allows(terrain) {
            continue;
        }
        if can_replace && terrain != Terrain::Ocean {
            replacements.push((cx, cy));
        } else {
            return Err(PlacementError::TerrainMismatch {
                x: cx,
                y: cy,
                terrain,
            });
        }
    }

    Ok(PlacementCandidate {
        x,
        y,
        width: w,
        height: h,
        replacements,
        distance_sq: Vec2Fixed::footprint_center(x, y, w, h).distance_squared(anchor),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Footprint;

    /// 8x6 grid; columns 0..6 are the player zone (zone 0), columns 6..8
    /// are zone 1.
    fn test_grid() -> WorldGrid {
        let mut grid = WorldGrid::new(8, 6);
        let mut zones = Vec::new();
        for _ in 0..6 {
            for x in 0..8 {
                zones.push(Some(if x < 6 { 0 } else { 1 }));
            }
        }
        grid.set_partition(zones, 2, Some(0));
        grid
    }

    fn plains_2x2() -> StructureDef {
        StructureDef::new(
            StructureKind::Farm,
            "Farm",
            Footprint::square(2),
            &[Terrain::Plains],
        )
    }

    fn capital() -> StructureDef {
        StructureDef::new(
            StructureKind::Capital,
            "Hall",
            Footprint::square(2),
            &[Terrain::Plains],
        )
        .with_replacement(Terrain::Plains)
        .unique()
    }

    #[test]
    fn test_instance_geometry() {
        let s = StructureInstance {
            id: StructureId(1),
            kind: StructureKind::Farm,
            x: 2,
            y: 3,
            width: 2,
            height: 2,
        };
        assert!(s.contains(2, 3));
        assert!(s.contains(3, 4));
        assert!(!s.contains(4, 3));
        assert!(!s.contains(1, 3));
        assert_eq!(s.cells().collect::<Vec<_>>(), vec![(2, 3), (3, 3), (2, 4), (3, 4)]);
        assert_eq!(s.center(), Vec2Fixed::new(Fixed::from_num(2.5), Fixed::from_num(3.5)));

        let other = StructureInstance {
            x: 4,
            ..s.clone()
        };
        assert!(!s.overlaps(&other));
        let touching = StructureInstance {
            x: 3,
            y: 4,
            ..s.clone()
        };
        assert!(s.overlaps(&touching));
    }

    #[test]
    fn test_best_placement_nearest_zone_centroid() {
        let grid = test_grid();
        let engine = PlacementEngine::new();
        // Zone centroid is (2.5, 2.5); a 2x2 at (2, 2) is centered there.
        let candidate = engine.best_placement(&grid, &plains_2x2(), false).unwrap();
        assert_eq!((candidate.x, candidate.y), (2, 2));
        assert_eq!(candidate.distance_sq, Fixed::ZERO);
        assert!(candidate.replacements.is_empty());
    }

    #[test]
    fn test_prefers_fewer_replacements_over_distance() {
        let mut grid = test_grid();
        for y in 0..6 {
            for x in 1..5 {
                grid.set_tile(x, y, Terrain::Forest);
            }
        }
        let engine = PlacementEngine::new();
        let def = capital();
        let candidate = engine.best_placement(&grid, &def, true).unwrap();
        // Only columns 0 and 5 are plains; no 2x2 avoids forest, so the
        // best needs 2 replacements, touching column 0 or 5.
        assert_eq!(candidate.replacements.len(), 2);
        // Tie between left and right edge distance resolves row-major:
        // (0, 2) centered at (0.5, 2.5) and (4, 2) at (4.5, 2.5) are both
        // 4.0 from the centroid; (0, 2) comes first.
        assert_eq!((candidate.x, candidate.y), (0, 2));
    }

    #[test]
    fn test_row_major_tie_break() {
        // 4x4 player zone, 1x1 building: centroid (1.5, 1.5), four cells
        // at equal distance.
        let mut grid = WorldGrid::new(4, 4);
        grid.set_partition(vec![Some(0); 16], 1, Some(0));
        let def = StructureDef::new(
            StructureKind::House,
            "House",
            Footprint::square(1),
            &[Terrain::Plains],
        );
        let candidate = PlacementEngine::new().best_placement(&grid, &def, false).unwrap();
        assert_eq!((candidate.x, candidate.y), (1, 1));
    }

    #[test]
    fn test_place_registers_and_replaces() {
        let mut grid = test_grid();
        grid.set_tile(2, 2, Terrain::Forest);
        let mut engine = PlacementEngine::new();
        let def = capital();

        let placed = engine.place_best(&mut grid, &def, true).unwrap();
        assert_eq!(placed.id, StructureId(1));
        assert_eq!(engine.count(StructureKind::Capital), 1);
        assert_eq!(engine.version(), 1);
        assert_eq!(engine.highest_serial(), 1);
        // (2, 2) needs one replacement; a clean 2x2 elsewhere is preferred.
        assert!(!placed.contains(2, 2));
        assert_eq!(grid.terrain(2, 2), Some(Terrain::Forest));
    }

    #[test]
    fn test_replacement_applied_when_needed() {
        let mut grid = test_grid();
        for y in 0..6 {
            for x in 0..6 {
                grid.set_tile(x, y, Terrain::Forest);
            }
        }
        let mut engine = PlacementEngine::new();
        let placed = engine.place_best(&mut grid, &capital(), true).unwrap();
        for (x, y) in placed.cells() {
            assert_eq!(grid.terrain(x, y), Some(Terrain::Plains));
        }
    }

    #[test]
    fn test_never_replaces_ocean() {
        let mut grid = test_grid();
        grid.set_tile(0, 0, Terrain::Ocean);
        let engine = PlacementEngine::new();
        let err = engine.placement_at(&grid, &capital(), 0, 0, true).unwrap_err();
        assert_eq!(
            err,
            PlacementError::TerrainMismatch {
                x: 0,
                y: 0,
                terrain: Terrain::Ocean
            }
        );
    }

    #[test]
    fn test_replacement_disabled() {
        let mut grid = test_grid();
        grid.set_tile(1, 1, Terrain::Forest);
        let engine = PlacementEngine::new();
        assert!(engine.placement_at(&grid, &capital(), 0, 0, false).is_err());
        let candidate = engine.placement_at(&grid, &capital(), 0, 0, true).unwrap();
        assert_eq!(candidate.replacements, vec![(1, 1)]);
    }

    #[test]
    fn test_unique_checked_first() {
        let mut grid = test_grid();
        let mut engine = PlacementEngine::new();
        engine.place_best(&mut grid, &capital(), true).unwrap();
        let before = engine.snapshot();

        let err = engine.place_at(&mut grid, &capital(), 0, 0, true).unwrap_err();
        assert_eq!(err, PlacementError::UniqueAlreadyBuilt(StructureKind::Capital));
        let err = engine.place_best(&mut grid, &capital(), true).unwrap_err();
        assert_eq!(err, PlacementError::UniqueAlreadyBuilt(StructureKind::Capital));
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn test_placement_at_failures() {
        let mut grid = test_grid();
        grid.set_tile(1, 0, Terrain::Rocks);
        let mut engine = PlacementEngine::new();
        let def = plains_2x2();

        assert_eq!(
            engine.placement_at(&grid, &def, 7, 0, false),
            Err(PlacementError::OutOfBounds { x: 7, y: 0 })
        );
        assert_eq!(
            engine.placement_at(&grid, &def, 5, 0, false),
            Err(PlacementError::OutsideZone { x: 6, y: 0 })
        );
        assert_eq!(
            engine.placement_at(&grid, &def, 0, 0, false),
            Err(PlacementError::TerrainMismatch {
                x: 1,
                y: 0,
                terrain: Terrain::Rocks
            })
        );

        engine.place_at(&mut grid, &def, 2, 2, false).unwrap();
        assert_eq!(
            engine.placement_at(&grid, &def, 3, 3, false),
            Err(PlacementError::Occupied { x: 3, y: 3 })
        );
    }

    #[test]
    fn test_no_player_zone() {
        let grid = WorldGrid::new(5, 5);
        let engine = PlacementEngine::new();
        assert_eq!(
            engine.best_placement(&grid, &plains_2x2(), false),
            Err(PlacementError::NoPlayerZone)
        );
        assert!(engine.available_placements(&grid, &plains_2x2(), false).is_empty());
    }

    #[test]
    fn test_terrain_reason_when_zone_has_no_plains() {
        let mut grid = test_grid();
        for y in 0..6 {
            for x in 0..6 {
                grid.set_tile(x, y, Terrain::Forest);
            }
        }
        let mut engine = PlacementEngine::new();
        let err = engine.place_best(&mut grid, &plains_2x2(), true).unwrap_err();
        assert_eq!(err.no_placement_reason(), Some(NoPlacementReason::Terrain));
        assert!(engine.structures().is_empty());
        assert_eq!(engine.version(), 0);
    }

    #[test]
    fn test_zone_reason_when_footprint_cannot_fit() {
        // Player zone is a single column.
        let mut grid = WorldGrid::new(4, 4);
        let zones = (0..16).map(|i| Some(u32::from(i % 4 != 0))).collect();
        grid.set_partition(zones, 2, Some(0));
        let err = PlacementEngine::new()
            .best_placement(&grid, &plains_2x2(), false)
            .unwrap_err();
        assert_eq!(err.no_placement_reason(), Some(NoPlacementReason::Zone));
    }

    #[test]
    fn test_anchor_follows_capital() {
        let mut grid = test_grid();
        let mut engine = PlacementEngine::new();
        let zone_centroid = engine.anchor(&grid).unwrap();
        assert_eq!(zone_centroid, Vec2Fixed::new(Fixed::from_num(2.5), Fixed::from_num(2.5)));

        engine.place_at(&mut grid, &capital(), 0, 0, true).unwrap();
        assert_eq!(
            engine.anchor(&grid).unwrap(),
            Vec2Fixed::new(Fixed::from_num(0.5), Fixed::from_num(0.5))
        );
    }

    #[test]
    fn test_best_placement_avoids_occupied() {
        let mut grid = test_grid();
        let mut engine = PlacementEngine::new();
        let def = plains_2x2();
        for _ in 0..4 {
            let placed = engine.place_best(&mut grid, &def, false).unwrap();
            let occupied_elsewhere = engine
                .structures()
                .iter()
                .filter(|s| s.id != placed.id)
                .any(|s| s.overlaps(&placed));
            assert!(!occupied_elsewhere);
        }
        assert_eq!(engine.count(StructureKind::Farm), 4);
        assert_eq!(engine.occupied_cells().len(), 16);
    }

    #[test]
    fn test_available_placements_row_major() {
        let mut grid = test_grid();
        let def = plains_2x2();
        let engine = PlacementEngine::new();
        let all = engine.available_placements(&grid, &def, false);
        // 5 x 5 top-left positions inside the 6x6 zone.
        assert_eq!(all.len(), 25);
        assert_eq!(all[0], (0, 0));
        assert_eq!(all[1], (1, 0));
        assert_eq!(all[24], (4, 4));

        grid.set_tile(0, 0, Terrain::Rocks);
        let fewer = engine.available_placements(&grid, &def, false);
        assert_eq!(fewer.len(), 24);
        assert_eq!(fewer[0], (1, 0));
    }

    #[test]
    fn test_restore_serial_never_collides() {
        let mut engine = PlacementEngine::new();
        let snapshot = RegistrySnapshot {
            instances: vec![StructureInstance {
                id: StructureId(9),
                kind: StructureKind::House,
                x: 0,
                y: 0,
                width: 1,
                height: 1,
            }],
            highest_serial: 4,
            counts: BTreeMap::from([(StructureKind::House, 1)]),
        };
        let mut grid = test_grid();
        engine.restore(&snapshot, &grid, &StructureCatalog::default());
        assert_eq!(engine.highest_serial(), 9);
        assert_eq!(engine.version(), 1);

        let placed = engine.place_best(&mut grid, &plains_2x2(), false).unwrap();
        assert_eq!(placed.id, StructureId(10));
    }

    fn instance(id: u64, kind: StructureKind, x: u32, y: u32, size: u32) -> StructureInstance {
        StructureInstance {
            id: StructureId(id),
            kind,
            x,
            y,
            width: size,
            height: size,
        }
    }

    #[test]
    fn test_restore_drops_footprints_outside_grid() {
        let mut grid = test_grid();
        let mut engine = PlacementEngine::new();
        let snapshot = RegistrySnapshot {
            instances: vec![
                instance(1, StructureKind::House, 0, 0, 1),
                StructureInstance {
                    x: u32::MAX,
                    width: 2,
                    ..instance(2, StructureKind::House, 0, 1, 1)
                },
                instance(3, StructureKind::Farm, 7, 5, 2),
                instance(4, StructureKind::House, 1, 0, 0),
            ],
            highest_serial: 4,
            counts: BTreeMap::from([(StructureKind::House, 3), (StructureKind::Farm, 1)]),
        };
        engine.restore(&snapshot, &grid, &StructureCatalog::default());

        assert_eq!(engine.structures(), &[instance(1, StructureKind::House, 0, 0, 1)]);
        assert_eq!(engine.count(StructureKind::House), 1);
        assert_eq!(engine.count(StructureKind::Farm), 0);
        assert_eq!(engine.highest_serial(), 4);

        let placed = engine.place_best(&mut grid, &plains_2x2(), false).unwrap();
        assert_eq!(placed.id, StructureId(5));
        assert!(!placed.contains(0, 0));
    }

    #[test]
    fn test_restore_drops_overlaps_and_duplicate_uniques() {
        let mut grid = test_grid();
        let mut engine = PlacementEngine::new();
        let snapshot = RegistrySnapshot {
            instances: vec![
                instance(1, StructureKind::Capital, 0, 0, 2),
                instance(2, StructureKind::House, 1, 1, 1),
                instance(3, StructureKind::Capital, 3, 3, 2),
            ],
            highest_serial: 3,
            counts: BTreeMap::new(),
        };
        engine.restore(&snapshot, &grid, &StructureCatalog::default());

        assert_eq!(engine.structures(), &[instance(1, StructureKind::Capital, 0, 0, 2)]);
        assert_eq!(engine.count(StructureKind::Capital), 1);
        assert_eq!(
            engine.anchor(&grid),
            Some(Vec2Fixed::new(Fixed::from_num(0.5), Fixed::from_num(0.5)))
        );
        assert_eq!(
            engine.place_best(&mut grid, &capital(), true),
            Err(PlacementError::UniqueAlreadyBuilt(StructureKind::Capital))
        );
    }

    #[test]
    fn test_unique_check_reads_instances() {
        // A registry whose counts were lost still refuses a second capital.
        let mut grid = test_grid();
        let mut engine = PlacementEngine::new();
        engine.place_best(&mut grid, &capital(), true).unwrap();
        engine.counts.clear();
        assert_eq!(
            engine.best_placement(&grid, &capital(), true),
            Err(PlacementError::UniqueAlreadyBuilt(StructureKind::Capital))
        );
    }

    #[test]
    fn test_overlaps_near_u32_max() {
        let a = StructureInstance {
            x: u32::MAX - 1,
            width: 2,
            ..instance(1, StructureKind::House, 0, 0, 1)
        };
        let b = StructureInstance {
            x: u32::MAX,
            width: u32::MAX,
            ..instance(2, StructureKind::House, 0, 0, 1)
        };
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&instance(3, StructureKind::House, 0, 0, 1)));
        assert!(!b.fits(&test_grid()));
    }

    #[test]
    fn test_clear_keeps_serial() {
        let mut grid = test_grid();
        let mut engine = PlacementEngine::new();
        engine.place_best(&mut grid, &plains_2x2(), false).unwrap();
        engine.clear();
        assert!(engine.structures().is_empty());
        assert_eq!(engine.count(StructureKind::Farm), 0);
        let placed = engine.place_best(&mut grid, &plains_2x2(), false).unwrap();
        assert_eq!(placed.id, StructureId(2));
    }

    #[test]
    fn test_views_use_display_name() {
        let mut grid = test_grid();
        let catalog = StructureCatalog::default();
        let mut engine = PlacementEngine::new();
        let def = catalog.get(StructureKind::Capital).unwrap();
        engine.place_best(&mut grid, def, true).unwrap();
        let views = engine.views(&catalog);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].display_name, "Town Hall");
    }
}
