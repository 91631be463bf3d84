use crate::fov::{calculate_hex_fov, FovError, HexTile, TileCover, ViewCone};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to access scenario file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed scenario: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Fov(#[from] FovError),
    #[error("unexpected {found:?} at row {row}, column {column} of the map")]
    MapChar { row: usize, column: usize, found: char },
}

/// Cover a scenario expects for one tile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedCover {
    pub x: i32,
    pub y: i32,
    pub cover: f64,
}

/// A tile whose computed cover disagrees with the expectation
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    pub x: i32,
    pub y: i32,
    pub expected: f64,
    /// `None` when the sweep produced no cover for the tile
    pub actual: Option<f64>,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.actual {
            Some(actual) => write!(
                f,
                "({}, {}): expected {:.6}, got {:.6}",
                self.x, self.y, self.expected, actual
            ),
            None => write!(f, "({}, {}): expected {:.6}, tile missing", self.x, self.y, self.expected),
        }
    }
}

/// Input snapshot for one sweep, with optional expected covers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer: Option<(i32, i32)>,
    pub tiles: Vec<HexTile>,
    /// View cone width in radians
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fov: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facing: Option<(i32, i32)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expected: Vec<ExpectedCover>,
}

impl Scenario {
    /// Build a scenario from a text map
    ///
    /// Each row is one axial `y`, each character one axial `x`: `#` blocks
    /// line of sight, `.` is open and `@` is the (open) viewer tile. Spaces
    /// are skipped without advancing `x`, so maps may be indented.
    pub fn from_rows(name: &str, rows: &[&str]) -> Result<Self, ScenarioError> {
        let mut tiles = Vec::new();
        let mut viewer = None;
        for (row, line) in rows.iter().enumerate() {
            let mut x = 0;
            for (column, c) in line.chars().enumerate() {
                let blocks_los = match c {
                    ' ' => continue,
                    '#' => true,
                    '.' => false,
                    '@' => {
                        viewer = Some((x, row as i32));
                        false
                    }
                    found => return Err(ScenarioError::MapChar { row, column, found }),
                };
                tiles.push(HexTile::new(x, row as i32, blocks_los));
                x += 1;
            }
        }
        Ok(Scenario {
            name: name.to_string(),
            viewer,
            tiles,
            fov: None,
            facing: None,
            expected: Vec::new(),
        })
    }

    /// Save to file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ScenarioError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load from file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// The viewer, defaulting to the origin
    pub fn viewer(&self) -> (i32, i32) {
        self.viewer.unwrap_or((0, 0))
    }

    /// The view cone, when the scenario limits the view; facing defaults to +x
    pub fn view_cone(&self) -> Option<ViewCone> {
        self.fov
            .map(|fov| ViewCone::new(self.facing.unwrap_or((1, 0)), fov))
    }

    pub fn run(&self) -> Result<Vec<TileCover>, ScenarioError> {
        self.run_with(self.viewer(), self.view_cone())
    }

    /// Sweep the scenario's tiles from another viewer or view cone
    pub fn run_with(
        &self,
        viewer: (i32, i32),
        view: Option<ViewCone>,
    ) -> Result<Vec<TileCover>, ScenarioError> {
        Ok(calculate_hex_fov(viewer, &self.tiles, view)?)
    }

    /// Compare computed covers against the expectations
    pub fn check(&self, covers: &[TileCover], tolerance: f64) -> Vec<Mismatch> {
        let actual: HashMap<(i32, i32), f64> =
            covers.iter().map(|c| ((c.x, c.y), c.cover)).collect();
        self.expected
            .iter()
            .filter_map(|e| match actual.get(&(e.x, e.y)) {
                Some(&cover) if (cover - e.cover).abs() <= tolerance => None,
                found => Some(Mismatch {
                    x: e.x,
                    y: e.y,
                    expected: e.cover,
                    actual: found.copied(),
                }),
            })
            .collect()
    }
}
