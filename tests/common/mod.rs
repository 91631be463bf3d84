#![allow(dead_code)]

use hexcover::{HexTile, Scenario, TileCover};
use std::collections::HashMap;
use std::path::Path;

/// Absolute tolerance for fractional covers
pub const TOLERANCE: f64 = 1e-9;

/// Cover of a tile whose edge is just grazed by a neighbouring shadow
pub fn almost() -> f64 {
    1.0 - 0.75_f64.sqrt()
}

/// All tiles of a `size × size` map, with the given walls
pub fn square_world(size: i32, walls: &[(i32, i32)]) -> Vec<HexTile> {
    let mut tiles = Vec::new();
    for y in 0..size {
        for x in 0..size {
            tiles.push(HexTile::new(x, y, walls.contains(&(x, y))));
        }
    }
    tiles
}

/// Every tile within `radius` of the origin
pub fn hex_disc(radius: i32) -> Vec<HexTile> {
    let mut tiles = Vec::new();
    for x in -radius..=radius {
        for y in -radius..=radius {
            if x * x + y * y - x * y <= radius * radius {
                tiles.push(HexTile::new(x, y, false));
            }
        }
    }
    tiles
}

pub fn cover_map(covers: &[TileCover]) -> HashMap<(i32, i32), f64> {
    covers.iter().map(|c| ((c.x, c.y), c.cover)).collect()
}

/// Assert every tile's cover: listed tiles take their group's value, all
/// others `default`
pub fn assert_covers(
    name: &str,
    covers: &[TileCover],
    default: f64,
    groups: &[(&[(i32, i32)], f64)],
) {
    let mut failures = Vec::new();
    for c in covers {
        let expected = groups
            .iter()
            .find(|(tiles, _)| tiles.contains(&(c.x, c.y)))
            .map_or(default, |&(_, value)| value);
        if (c.cover - expected).abs() > TOLERANCE {
            failures.push(format!("({}, {}): expected {:.6}, got {:.6}", c.x, c.y, expected, c.cover));
        }
    }
    assert!(failures.is_empty(), "{} failed:\n  {}", name, failures.join("\n  "));
}

/// Load a scenario fixture
pub fn load_scenario(path: &Path) -> Result<Scenario, Box<dyn std::error::Error>> {
    Ok(Scenario::load_from_file(path)?)
}

/// Run a scenario and describe every mismatch against its expectations
pub fn run_scenario(scenario: &Scenario) -> Result<(), String> {
    let covers = scenario.run().map_err(|e| e.to_string())?;
    let mismatches = scenario.check(&covers, TOLERANCE);
    if mismatches.is_empty() {
        Ok(())
    } else {
        let lines: Vec<String> = mismatches.iter().map(|m| m.to_string()).collect();
        Err(lines.join("; "))
    }
}

/// Shift a scenario's viewer, tiles and expectations by an offset
pub fn translate(scenario: &Scenario, dx: i32, dy: i32) -> Scenario {
    let mut moved = scenario.clone();
    moved.name = format!("{}_shifted", scenario.name);
    moved.viewer = Some((scenario.viewer().0 + dx, scenario.viewer().1 + dy));
    for t in moved.tiles.iter_mut() {
        t.x += dx;
        t.y += dy;
    }
    for e in moved.expected.iter_mut() {
        e.x += dx;
        e.y += dy;
    }
    moved
}
