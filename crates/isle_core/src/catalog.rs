//! Data-driven structure definitions.
//!
//! Structure types form a closed enumeration; each has one [`StructureDef`]
//! record describing its footprint and terrain rules. Catalogs are loaded
//! from RON and validated before use.
//!
//! # Example RON
//!
//! ```ron
//! StructureCatalog(
//!     structures: [
//!         StructureDef(
//!             kind: Capital,
//!             display_name: "Town Hall",
//!             footprint: (width: 2, height: 2),
//!             allowed_terrain: [Plains, Sand],
//!             replacement_terrain: Some(Plains),
//!             unique: true,
//!         ),
//!     ],
//! )
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{IsleError, Result};
use crate::grid::Terrain;

/// Structure type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StructureKind {
    /// Seat of the settlement. Always unique.
    Capital,
    /// Dwelling.
    House,
    /// Crop farm.
    Farm,
    /// Woodcutters' camp.
    LumberCamp,
    /// Stone quarry.
    Quarry,
    /// Fishing hut.
    FishingHut,
    /// Crafting workshop.
    Workshop,
    /// Market square.
    Market,
    /// Grain store.
    Granary,
    /// Shrine.
    Shrine,
}

impl StructureKind {
    /// Every structure kind, in declaration order.
    pub const ALL: [StructureKind; 10] = [
        StructureKind::Capital,
        StructureKind::House,
        StructureKind::Farm,
        StructureKind::LumberCamp,
        StructureKind::Quarry,
        StructureKind::FishingHut,
        StructureKind::Workshop,
        StructureKind::Market,
        StructureKind::Granary,
        StructureKind::Shrine,
    ];

    /// Stable snake_case key used on the command line and in logs.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            StructureKind::Capital => "capital",
            StructureKind::House => "house",
            StructureKind::Farm => "farm",
            StructureKind::LumberCamp => "lumber_camp",
            StructureKind::Quarry => "quarry",
            StructureKind::FishingHut => "fishing_hut",
            StructureKind::Workshop => "workshop",
            StructureKind::Market => "market",
            StructureKind::Granary => "granary",
            StructureKind::Shrine => "shrine",
        }
    }

    /// Look up a kind by its [`key`](Self::key).
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

impl std::fmt::Display for StructureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Footprint dimensions in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    /// Width in cells.
    pub width: u32,
    /// Height in cells.
    pub height: u32,
}

impl Footprint {
    /// Create a new footprint.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Create a square footprint.
    #[must_use]
    pub const fn square(size: u32) -> Self {
        Self {
            width: size,
            height: size,
        }
    }

    /// Total number of cells in footprint.
    #[must_use]
    pub const fn cell_count(&self) -> u32 {
        self.width * self.height
    }
}

impl Default for Footprint {
    fn default() -> Self {
        Self::square(1)
    }
}

/// Footprint and terrain rules for one structure kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureDef {
    /// Which structure this record describes.
    pub kind: StructureKind,

    /// Name shown to players.
    pub display_name: String,

    /// Rectangle of cells the structure occupies.
    #[serde(default)]
    pub footprint: Footprint,

    /// Terrain every footprint cell must have, unless replaced.
    pub allowed_terrain: Vec<Terrain>,

    /// Terrain written over disallowed cells when replacement is enabled.
    /// `None` means the structure never replaces terrain.
    #[serde(default)]
    pub replacement_terrain: Option<Terrain>,

    /// At most one instance may exist.
    #[serde(default)]
    pub unique: bool,
}

impl StructureDef {
    /// Create a definition with no replacement terrain.
    #[must_use]
    pub fn new(
        kind: StructureKind,
        display_name: &str,
        footprint: Footprint,
        allowed_terrain: &[Terrain],
    ) -> Self {
        Self {
            kind,
            display_name: display_name.to_string(),
            footprint,
            allowed_terrain: allowed_terrain.to_vec(),
            replacement_terrain: None,
            unique: false,
        }
    }

    /// Set the replacement terrain.
    #[must_use]
    pub fn with_replacement(mut self, terrain: Terrain) -> Self {
        self.replacement_terrain = Some(terrain);
        self
    }

    /// Mark as unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Whether the structure may stand on `terrain` without replacement.
    #[must_use]
    pub fn allows(&self, terrain: Terrain) -> bool {
        self.allowed_terrain.contains(&terrain)
    }

    /// Check the record on its own.
    ///
    /// # Errors
    ///
    /// Returns [`IsleError::InvalidStructureDef`] for an empty footprint,
    /// empty allowed-terrain list, ocean replacement, or a non-unique
    /// capital.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| IsleError::InvalidStructureDef {
            kind: self.kind.key().to_string(),
            message: message.to_string(),
        };

        if self.footprint.width == 0 || self.footprint.height == 0 {
            return Err(invalid("footprint must be at least 1x1"));
        }
        if self.allowed_terrain.is_empty() {
            return Err(invalid("allowed_terrain is empty"));
        }
        if self.replacement_terrain == Some(Terrain::Ocean) {
            return Err(invalid("replacement terrain cannot be ocean"));
        }
        if self.kind == StructureKind::Capital && !self.unique {
            return Err(invalid("capital must be unique"));
        }
        Ok(())
    }
}

/// Validated set of structure definitions, at most one per kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureCatalog {
    structures: Vec<StructureDef>,
}

impl StructureCatalog {
    /// Build a catalog from definitions, validating each and rejecting
    /// duplicate kinds.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn new(structures: Vec<StructureDef>) -> Result<Self> {
        let catalog = Self { structures };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse and validate a RON catalog document.
    ///
    /// # Errors
    ///
    /// Returns [`IsleError::DataParseError`] if the document does not parse
    /// and [`IsleError::InvalidStructureDef`] if any record is invalid.
    pub fn from_ron(source_name: &str, text: &str) -> Result<Self> {
        let catalog: Self = ron::from_str(text).map_err(|e| IsleError::DataParseError {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;
        catalog.validate()?;
        tracing::debug!(
            source = source_name,
            structures = catalog.structures.len(),
            "Structure catalog loaded"
        );
        Ok(catalog)
    }

    /// Serialize to pretty RON.
    ///
    /// # Errors
    ///
    /// Returns [`IsleError::Serialization`] if encoding fails.
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| IsleError::Serialization(format!("Failed to encode catalog: {e}")))
    }

    /// Validate every record and the set as a whole.
    ///
    /// # Errors
    ///
    /// Returns the first invalid record, or a duplicate kind.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for def in &self.structures {
            def.validate()?;
            if !seen.insert(def.kind) {
                return Err(IsleError::InvalidStructureDef {
                    kind: def.kind.key().to_string(),
                    message: "defined more than once".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Definition for a kind, if the catalog has one.
    #[must_use]
    pub fn get(&self, kind: StructureKind) -> Option<&StructureDef> {
        self.structures.iter().find(|def| def.kind == kind)
    }

    /// All definitions in document order.
    pub fn iter(&self) -> impl Iterator<Item = &StructureDef> {
        self.structures.iter()
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.structures.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }
}

impl Default for StructureCatalog {
    /// The built-in catalog covering every kind.
    fn default() -> Self {
        use StructureKind as K;
        use Terrain as T;

        let open = [T::Plains, T::Sand];
        Self {
            structures: vec![
                StructureDef::new(K::Capital, "Town Hall", Footprint::square(2), &open)
                    .with_replacement(T::Plains)
                    .unique(),
                StructureDef::new(K::House, "House", Footprint::square(1), &open)
                    .with_replacement(T::Plains),
                StructureDef::new(K::Farm, "Farm", Footprint::square(2), &[T::Plains]),
                StructureDef::new(K::LumberCamp, "Lumber Camp", Footprint::square(1), &[T::Forest]),
                StructureDef::new(K::Quarry, "Quarry", Footprint::square(1), &[T::Rocks]),
                StructureDef::new(K::FishingHut, "Fishing Hut", Footprint::square(1), &[T::Sand]),
                StructureDef::new(K::Workshop, "Workshop", Footprint::new(2, 1), &open)
                    .with_replacement(T::Plains),
                StructureDef::new(K::Market, "Market", Footprint::square(2), &open)
                    .with_replacement(T::Plains),
                StructureDef::new(K::Granary, "Granary", Footprint::new(1, 2), &open)
                    .with_replacement(T::Plains),
                StructureDef::new(
                    K::Shrine,
                    "Shrine",
                    Footprint::square(1),
                    &[T::Plains, T::Sand, T::Forest, T::Rocks],
                )
                .unique(),
            ],
        }
    }
}
