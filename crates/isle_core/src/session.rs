//! Game session: owns the random source, world grid and structure registry.
//!
//! All mutation goes through the session's entry points so draw order on
//! the shared [`SeededRng`] stays fixed: generation draws first, placement
//! and expansion draw nothing. A snapshot captures the raw RNG state, the
//! grid and the registry verbatim; restoring never regenerates from the
//! seed.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::{StructureCatalog, StructureDef, StructureKind};
use crate::config::WorldConfig;
use crate::error::{IsleError, Result};
use crate::expansion::{self, ExpansionDirection, ExpansionError, ExpansionReport};
use crate::grid::{GridSnapshot, PlayerSummary, Terrain, WorldGrid};
use crate::placement::{
    PlacementCandidate, PlacementEngine, PlacementError, RegistrySnapshot, StructureInstance,
    StructureView,
};
use crate::rng::SeededRng;
use crate::worldgen::{self, GenerationReport};

/// Snapshot format version for compatibility.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to resume a session exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Format version.
    pub version: u32,
    /// Raw random source state.
    pub rng_state: i32,
    /// Configuration the world was generated with.
    pub config: WorldConfig,
    /// Terrain and partition.
    pub grid: GridSnapshot,
    /// Structure registry.
    pub registry: RegistrySnapshot,
}

/// A single player's world.
#[derive(Debug, Clone)]
pub struct Session {
    rng: SeededRng,
    config: WorldConfig,
    grid: WorldGrid,
    catalog: StructureCatalog,
    engine: PlacementEngine,
    report: Option<GenerationReport>,
    allow_replacement: bool,
}

impl Session {
    /// Generate a new world from a seed with the built-in catalog.
    #[must_use]
    pub fn new(seed: i32, config: WorldConfig) -> Self {
        Self::with_catalog(seed, config, StructureCatalog::default())
    }

    /// Generate a new world from a seed with a custom catalog.
    #[must_use]
    pub fn with_catalog(seed: i32, config: WorldConfig, catalog: StructureCatalog) -> Self {
        let mut rng = SeededRng::new(seed);
        let world = worldgen::generate_world(&config, &mut rng);
        tracing::info!(seed, layout = ?world.report.layout, "Session started");
        Self {
            rng,
            config,
            grid: world.grid,
            catalog,
            engine: PlacementEngine::new(),
            report: Some(world.report),
            allow_replacement: true,
        }
    }

    /// The world grid.
    #[must_use]
    pub const fn grid(&self) -> &WorldGrid {
        &self.grid
    }

    /// The structure catalog.
    #[must_use]
    pub const fn catalog(&self) -> &StructureCatalog {
        &self.catalog
    }

    /// The structure registry.
    #[must_use]
    pub const fn engine(&self) -> &PlacementEngine {
        &self.engine
    }

    /// The generation configuration.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Report of the last generation. `None` after a restore.
    #[must_use]
    pub const fn report(&self) -> Option<&GenerationReport> {
        self.report.as_ref()
    }

    /// The shared random source, for the turn layer.
    ///
    /// Draws taken here are part of the save state.
    pub fn rng_mut(&mut self) -> &mut SeededRng {
        &mut self.rng
    }

    /// Raw random source state.
    #[must_use]
    pub const fn rng_state(&self) -> i32 {
        self.rng.state()
    }

    /// Whether placement may overwrite disallowed terrain (never ocean).
    #[must_use]
    pub const fn terrain_replacement(&self) -> bool {
        self.allow_replacement
    }

    /// Enable or disable terrain replacement for later requests.
    pub fn set_terrain_replacement(&mut self, allow: bool) {
        self.allow_replacement = allow;
    }

    /// Replace the world wholesale.
    ///
    /// With `None` a new size is drawn from the random source first. The
    /// registry is emptied; serials keep counting.
    pub fn regenerate(&mut self, size: Option<(u32, u32)>) -> &GenerationReport {
        let (width, height) = size.unwrap_or_else(|| worldgen::draw_dimensions(&mut self.rng));
        self.config = self.config.clone().with_size(width, height);
        let world = worldgen::generate_world(&self.config, &mut self.rng);
        self.grid = world.grid;
        self.engine.clear();
        tracing::info!(width, height, "World regenerated");
        self.report.insert(world.report)
    }

    fn def(&self, kind: StructureKind) -> std::result::Result<&StructureDef, PlacementError> {
        self.catalog.get(kind).ok_or(PlacementError::UnknownKind(kind))
    }

    /// Place the capital at the best spot near the zone centroid.
    ///
    /// # Errors
    ///
    /// Any [`PlacementError`]; nothing is mutated on error.
    pub fn place_capital(&mut self) -> std::result::Result<StructureInstance, PlacementError> {
        self.place_best(StructureKind::Capital)
    }

    /// Place a structure at the best legal spot.
    ///
    /// # Errors
    ///
    /// Any [`PlacementError`]; nothing is mutated on error.
    pub fn place_best(
        &mut self,
        kind: StructureKind,
    ) -> std::result::Result<StructureInstance, PlacementError> {
        let def = self.catalog.get(kind).ok_or(PlacementError::UnknownKind(kind))?;
        self.engine
            .place_best(&mut self.grid, def, self.allow_replacement)
    }

    /// Place a structure with its top-left corner at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Any [`PlacementError`]; nothing is mutated on error.
    pub fn place_at(
        &mut self,
        kind: StructureKind,
        x: u32,
        y: u32,
    ) -> std::result::Result<StructureInstance, PlacementError> {
        let def = self.catalog.get(kind).ok_or(PlacementError::UnknownKind(kind))?;
        self.engine
            .place_at(&mut self.grid, def, x, y, self.allow_replacement)
    }

    /// Preview the best placement without registering it.
    ///
    /// # Errors
    ///
    /// Any [`PlacementError`].
    pub fn best_placement(
        &self,
        kind: StructureKind,
    ) -> std::result::Result<PlacementCandidate, PlacementError> {
        let def = self.def(kind)?;
        self.engine.best_placement(&self.grid, def, self.allow_replacement)
    }

    /// Every legal top-left coordinate for a structure, row-major.
    #[must_use]
    pub fn available_placements(&self, kind: StructureKind) -> Vec<(u32, u32)> {
        self.def(kind).map_or_else(
            |_| Vec::new(),
            |def| {
                self.engine
                    .available_placements(&self.grid, def, self.allow_replacement)
            },
        )
    }

    /// Display projection of every structure.
    #[must_use]
    pub fn structures(&self) -> Vec<StructureView> {
        self.engine.views(&self.catalog)
    }

    /// Registry version; changes whenever the structure list changes.
    #[must_use]
    pub const fn structures_version(&self) -> u64 {
        self.engine.version()
    }

    /// Grow the player zone one cell in a direction.
    ///
    /// # Errors
    ///
    /// Any [`ExpansionError`]; the zone grid is unchanged on error.
    pub fn expand_border(
        &mut self,
        direction: ExpansionDirection,
    ) -> std::result::Result<ExpansionReport, ExpansionError> {
        expansion::expand_border(&mut self.grid, direction)
    }

    /// Write one cell's terrain. Returns `false` if out of bounds.
    pub fn set_tile(&mut self, x: u32, y: u32, terrain: Terrain) -> bool {
        self.grid.set_tile(x, y, terrain)
    }

    /// Turn a player-zone plains or sand tile into an empty field.
    ///
    /// Refused for other terrain, cells outside the zone, and cells under a
    /// structure.
    pub fn convert_to_field(&mut self, x: u32, y: u32) -> bool {
        let convertible = matches!(self.grid.terrain(x, y), Some(Terrain::Plains | Terrain::Sand));
        if !convertible
            || !self.grid.is_player_zone(x, y)
            || self.engine.structure_at(x, y).is_some()
        {
            return false;
        }
        self.grid.set_tile(x, y, Terrain::FieldEmpty)
    }

    /// The player's resource base, derived from the current grid.
    #[must_use]
    pub fn player_summary(&self) -> PlayerSummary {
        self.grid.player_summary()
    }

    /// Deep copy of the persisted state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: SNAPSHOT_VERSION,
            rng_state: self.rng.state(),
            config: self.config.clone(),
            grid: self.grid.snapshot(),
            registry: self.engine.snapshot(),
        }
    }

    /// Rebuild a session from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`IsleError::VersionMismatch`] for an incompatible snapshot.
    pub fn from_snapshot(snapshot: &SessionSnapshot, catalog: StructureCatalog) -> Result<Self> {
        let mut session = Self {
            rng: SeededRng::default(),
            config: snapshot.config.clone(),
            grid: WorldGrid::new(1, 1),
            catalog,
            engine: PlacementEngine::new(),
            report: None,
            allow_replacement: true,
        };
        session.restore(snapshot)?;
        Ok(session)
    }

    /// Replace this session's state with a snapshot.
    ///
    /// Grid and registry are repaired rather than rejected when corrupted;
    /// see [`WorldGrid::from_snapshot`] and [`PlacementEngine::restore`].
    ///
    /// # Errors
    ///
    /// Returns [`IsleError::VersionMismatch`] for an incompatible snapshot;
    /// the session is unchanged in that case.
    pub fn restore(&mut self, snapshot: &SessionSnapshot) -> Result<()> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(IsleError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found: snapshot.version,
            });
        }
        self.rng.set_state(snapshot.rng_state);
        self.config = snapshot.config.clone();
        self.grid = WorldGrid::from_snapshot(&snapshot.grid);
        self.engine.restore(&snapshot.registry, &self.grid, &self.catalog);
        self.report = None;
        tracing::info!(
            width = self.grid.width(),
            height = self.grid.height(),
            structures = self.engine.structures().len(),
            "Session restored"
        );
        Ok(())
    }

    /// Encode the snapshot as bytes.
    ///
    /// # Errors
    ///
    /// Returns [`IsleError::Serialization`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(&self.snapshot())
            .map_err(|e| IsleError::Serialization(format!("Failed to encode session: {e}")))
    }

    /// Decode a session from snapshot bytes.
    ///
    /// # Errors
    ///
    /// Returns [`IsleError::Serialization`] for undecodable bytes and
    /// [`IsleError::VersionMismatch`] for an incompatible snapshot.
    pub fn from_bytes(bytes: &[u8], catalog: StructureCatalog) -> Result<Self> {
        let snapshot: SessionSnapshot = bincode::deserialize(bytes)
            .map_err(|e| IsleError::Serialization(format!("Failed to decode session: {e}")))?;
        Self::from_snapshot(&snapshot, catalog)
    }

    /// Save the session to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes)?;
        tracing::debug!(path = %path.as_ref().display(), "Session saved");
        Ok(())
    }

    /// Load a session from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or decoding fails.
    pub fn load<P: AsRef<Path>>(path: P, catalog: StructureCatalog) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes, catalog)
    }

    /// Hash of the persisted state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.rng.state().hash(&mut hasher);
        self.grid.width().hash(&mut hasher);
        self.grid.height().hash(&mut hasher);
        self.grid.terrain_cells().hash(&mut hasher);
        self.grid.zone_cells().hash(&mut hasher);
        self.grid.zone_count().hash(&mut hasher);
        self.grid.player_zone().hash(&mut hasher);
        self.engine.structures().hash(&mut hasher);
        self.engine.highest_serial().hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(42, WorldConfig::standard())
    }

    #[test]
    fn test_new_session_has_player_zone() {
        let s = session();
        assert!(s.grid().player_zone().is_some());
        assert!(s.report().is_some());
        assert_eq!(s.structures_version(), 0);
    }

    #[test]
    fn test_place_capital_then_unique_fails() {
        let mut s = session();
        let capital = s.place_capital().unwrap();
        assert_eq!(capital.kind, StructureKind::Capital);
        assert_eq!(
            s.place_capital(),
            Err(PlacementError::UniqueAlreadyBuilt(StructureKind::Capital))
        );
        assert_eq!(s.structures().len(), 1);
        assert_eq!(s.structures()[0].display_name, "Town Hall");
    }

    #[test]
    fn test_unknown_kind() {
        let catalog = StructureCatalog::new(Vec::new()).unwrap();
        let mut s = Session::with_catalog(42, WorldConfig::standard(), catalog);
        assert_eq!(
            s.place_best(StructureKind::House),
            Err(PlacementError::UnknownKind(StructureKind::House))
        );
        assert!(s.available_placements(StructureKind::House).is_empty());
    }

    #[test]
    fn test_place_at_uses_available_placement() {
        let mut s = session();
        let spots = s.available_placements(StructureKind::House);
        let &(x, y) = spots.first().expect("some spot for a house");
        let house = s.place_at(StructureKind::House, x, y).unwrap();
        assert_eq!((house.x, house.y), (x, y));
        assert!(!s.available_placements(StructureKind::House).contains(&(x, y)));
    }

    #[test]
    fn test_convert_to_field() {
        let mut s = session();
        let cells = s.grid().player_zone_cells();
        let &(x, y) = cells
            .iter()
            .find(|&&(x, y)| matches!(s.grid().terrain(x, y), Some(Terrain::Plains | Terrain::Sand)))
            .expect("player zone has open land");
        let before = s.player_summary();
        assert!(s.convert_to_field(x, y));
        assert_eq!(s.grid().terrain(x, y), Some(Terrain::FieldEmpty));
        let after = s.player_summary();
        assert_eq!(after.fields, before.fields + 1);
        assert_eq!(after.plains_and_sand, before.plains_and_sand - 1);
        // Already a field.
        assert!(!s.convert_to_field(x, y));
    }

    #[test]
    fn test_convert_to_field_refuses_outside_zone() {
        let mut s = session();
        let outside = (0..s.grid().cell_count())
            .map(|i| s.grid().index_to_coords(i))
            .find(|&(x, y)| {
                !s.grid().is_player_zone(x, y) && s.grid().terrain(x, y) == Some(Terrain::Plains)
            });
        if let Some((x, y)) = outside {
            assert!(!s.convert_to_field(x, y));
            assert_eq!(s.grid().terrain(x, y), Some(Terrain::Plains));
        }
    }

    #[test]
    fn test_convert_to_field_refuses_structure_cells() {
        let mut s = session();
        let capital = s.place_capital().unwrap();
        assert!(!s.convert_to_field(capital.x, capital.y));
    }

    #[test]
    fn test_regenerate_with_size_clears_registry() {
        let mut s = session();
        s.place_capital().unwrap();
        let report = s.regenerate(Some((24, 18))).clone();
        assert_eq!(s.grid().width(), 24);
        assert_eq!(s.grid().height(), 18);
        assert_eq!(report.player_zone, s.grid().player_zone());
        assert!(s.structures().is_empty());
        // Serials keep counting across worlds.
        let capital = s.place_capital().unwrap();
        assert_eq!(capital.id.0, 2);
    }

    #[test]
    fn test_regenerate_draws_size() {
        let mut s = session();
        s.regenerate(None);
        let (w, h) = (s.grid().width(), s.grid().height());
        assert!((worldgen::DRAWN_WIDTH_RANGE.0..=worldgen::DRAWN_WIDTH_RANGE.1).contains(&w));
        assert!((worldgen::DRAWN_HEIGHT_RANGE.0..=worldgen::DRAWN_HEIGHT_RANGE.1).contains(&h));
    }

    #[test]
    fn test_snapshot_round_trip_bytes() {
        let mut s = session();
        s.place_capital().unwrap();
        let _ = s.place_best(StructureKind::House);

        let bytes = s.to_bytes().unwrap();
        let mut restored = Session::from_bytes(&bytes, StructureCatalog::default()).unwrap();
        assert_eq!(restored.grid(), s.grid());
        assert_eq!(restored.engine().structures(), s.engine().structures());
        assert_eq!(restored.state_hash(), s.state_hash());

        for _ in 0..5 {
            assert_eq!(restored.rng_mut().next(), s.rng_mut().next());
        }
    }

    #[test]
    fn test_restore_rejects_version() {
        let mut s = session();
        let mut snapshot = s.snapshot();
        snapshot.version = SNAPSHOT_VERSION + 1;
        let hash = s.state_hash();
        let err = s.restore(&snapshot).unwrap_err();
        assert!(matches!(err, IsleError::VersionMismatch { .. }));
        assert_eq!(s.state_hash(), hash);
    }

    #[test]
    fn test_restore_clamps_oversized_grid() {
        let s = session();
        let mut snapshot = s.snapshot();
        snapshot.grid.width = u32::MAX;
        snapshot.grid.height = u32::MAX;

        let mut restored = Session::from_snapshot(&snapshot, StructureCatalog::default()).unwrap();
        assert_eq!(restored.grid().width(), crate::config::MAX_DIMENSION);
        assert_eq!(restored.grid().height(), crate::config::MAX_DIMENSION);
        let _ = restored.place_best(StructureKind::House);
        for st in restored.engine().structures() {
            assert!(st.fits(restored.grid()));
        }
    }

    #[test]
    fn test_restore_repairs_registry() {
        let mut s = session();
        let capital = s.place_capital().unwrap();
        let mut snapshot = s.snapshot();
        snapshot.registry.instances.push(StructureInstance {
            id: crate::placement::StructureId(2),
            kind: StructureKind::House,
            x: u32::MAX,
            y: 0,
            width: 2,
            height: 1,
        });
        snapshot.registry.instances.push(StructureInstance {
            id: crate::placement::StructureId(3),
            kind: StructureKind::House,
            ..capital.clone()
        });
        snapshot.registry.counts.clear();

        let mut restored = Session::from_snapshot(&snapshot, StructureCatalog::default()).unwrap();
        assert_eq!(restored.engine().structures(), &[capital]);
        assert_eq!(restored.engine().count(StructureKind::Capital), 1);
        assert_eq!(restored.engine().highest_serial(), 3);
        assert_eq!(
            restored.place_capital(),
            Err(PlacementError::UniqueAlreadyBuilt(StructureKind::Capital))
        );
        if let Ok(house) = restored.place_best(StructureKind::House) {
            assert_eq!(house.id.0, 4);
        }
    }

    #[test]
    fn test_from_bytes_garbage() {
        let err = Session::from_bytes(&[1, 2, 3], StructureCatalog::default()).unwrap_err();
        assert!(matches!(err, IsleError::Serialization(_)));
    }

    #[test]
    fn test_save_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("island.sav");
        let mut s = session();
        s.place_capital().unwrap();
        s.save(&path).unwrap();

        let loaded = Session::load(&path, StructureCatalog::default()).unwrap();
        assert_eq!(loaded.snapshot(), s.snapshot());
    }

    #[test]
    fn test_state_hash_tracks_mutation() {
        let mut s = session();
        let before = s.state_hash();
        s.place_capital().unwrap();
        assert_ne!(s.state_hash(), before);
    }
}
