//! Human and machine readable world reports.

use serde::Serialize;

use isle_core::catalog::StructureKind;
use isle_core::grid::PlayerSummary;
use isle_core::placement::StructureView;
use isle_core::session::Session;
use isle_core::worldgen::OceanLayout;

use crate::{Result, ToolError};

/// Snapshot of a session for printing.
#[derive(Debug, Clone, Serialize)]
pub struct WorldReport {
    /// Seed the session started from, if known.
    pub seed: Option<i32>,
    /// Grid width.
    pub width: u32,
    /// Grid height.
    pub height: u32,
    /// Ocean layout, if the world was generated in this process.
    pub layout: Option<OceanLayout>,
    /// Zones in the partition.
    pub zone_count: u32,
    /// The player's zone.
    pub player_zone: Option<u32>,
    /// Player resource base.
    pub summary: PlayerSummary,
    /// Registered structures.
    pub structures: Vec<StructureView>,
    /// Requests that failed, with their reasons.
    pub failures: Vec<String>,
    /// ASCII map, one line per row.
    pub map: Vec<String>,
}

impl WorldReport {
    /// Collect a report from a session.
    #[must_use]
    pub fn from_session(session: &Session, seed: Option<i32>) -> Self {
        let grid = session.grid();
        Self {
            seed,
            width: grid.width(),
            height: grid.height(),
            layout: session.report().map(|r| r.layout),
            zone_count: grid.zone_count(),
            player_zone: grid.player_zone(),
            summary: session.player_summary(),
            structures: session.structures(),
            failures: Vec::new(),
            map: render_map(session),
        }
    }

    /// Encode as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Json`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(ToolError::from)
    }

    /// Render as plain text.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for line in &self.map {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
        if let Some(seed) = self.seed {
            out.push_str(&format!("seed: {seed}\n"));
        }
        out.push_str(&format!("size: {}x{}\n", self.width, self.height));
        if let Some(layout) = self.layout {
            out.push_str(&format!("ocean: {layout:?}\n"));
        }
        out.push_str(&format!(
            "zones: {} (player: {})\n",
            self.zone_count,
            self.player_zone
                .map_or_else(|| "none".to_string(), |z| z.to_string())
        ));
        let s = &self.summary;
        out.push_str(&format!(
            "territory: forest {} rocks {} open {} river {} fields {} coast {}\n",
            s.forest, s.rocks, s.plains_and_sand, s.river, s.fields, s.ocean_adjacent
        ));
        for view in &self.structures {
            let i = &view.instance;
            out.push_str(&format!(
                "  {} {} at ({}, {}) {}x{}\n",
                i.id, view.display_name, i.x, i.y, i.width, i.height
            ));
        }
        for failure in &self.failures {
            out.push_str(&format!("  failed: {failure}\n"));
        }
        out
    }
}

/// ASCII map with structures overlaid by the first letter of their kind
/// key, upper-cased.
#[must_use]
pub fn render_map(session: &Session) -> Vec<String> {
    let mut rows: Vec<Vec<char>> = session
        .grid()
        .to_ascii()
        .lines()
        .map(|line| line.chars().collect())
        .collect();
    for s in session.engine().structures() {
        let glyph = structure_glyph(s.kind);
        for (x, y) in s.cells() {
            if let Some(cell) = rows.get_mut(y as usize).and_then(|r| r.get_mut(x as usize)) {
                *cell = glyph;
            }
        }
    }
    rows.into_iter().map(|r| r.into_iter().collect()).collect()
}

fn structure_glyph(kind: StructureKind) -> char {
    kind.key()
        .chars()
        .next()
        .map_or('?', |c| c.to_ascii_uppercase())
}

/// Parse a structure kind from its command-line key.
///
/// # Errors
///
/// Returns [`ToolError::UnknownStructure`] for an unknown key.
pub fn parse_kind(key: &str) -> Result<StructureKind> {
    StructureKind::from_key(key).ok_or_else(|| ToolError::UnknownStructure(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use isle_core::config::WorldConfig;

    #[test]
    fn test_report_from_session() {
        let mut session = Session::new(42, WorldConfig::small());
        let capital = session.place_capital().unwrap();
        let report = WorldReport::from_session(&session, Some(42));

        assert_eq!(report.map.len(), 14);
        assert!(report.map.iter().all(|row| row.chars().count() == 20));
        let row = &report.map[capital.y as usize];
        assert_eq!(row.chars().nth(capital.x as usize), Some('C'));
        assert_eq!(report.structures.len(), 1);

        let text = report.to_text();
        assert!(text.contains("seed: 42"));
        assert!(text.contains("Town Hall"));
    }

    #[test]
    fn test_report_json() {
        let session = Session::new(3, WorldConfig::small());
        let json = WorldReport::from_session(&session, None).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["width"], 20);
        assert_eq!(value["height"], 14);
        assert!(value["summary"]["forest"].is_number());
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("lumber_camp").unwrap(), StructureKind::LumberCamp);
        assert!(matches!(
            parse_kind("castle"),
            Err(ToolError::UnknownStructure(_))
        ));
    }
}
