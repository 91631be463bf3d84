use crate::fov::{calculate_hex_fov, HexTile, TileCover};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;
use tracing::{debug, info, warn};

/// Random-map regression run
#[derive(Debug, Clone)]
pub struct RegressionSettings {
    pub seeds: RangeInclusive<u64>,
    pub width: i32,
    pub height: i32,
    /// Probability of each tile blocking line of sight, clamped to [0, 1]
    pub wall_chance: f64,
    /// Cave smoothing passes run over the noise; 0 keeps it raw
    pub smoothing_passes: u32,
}

impl Default for RegressionSettings {
    fn default() -> Self {
        Self {
            seeds: 0..=255,
            width: 25,
            height: 25,
            wall_chance: 0.4,
            smoothing_passes: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionFailure {
    pub seed: u64,
    pub viewer: (i32, i32),
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct RegressionReport {
    pub successes: usize,
    pub failures: Vec<RegressionFailure>,
}

impl RegressionReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Generate a `width × height` map, row by row, from a seed
///
/// Each tile blocks independently with `wall_chance`, so the raw map is
/// noise. Run `smooth_map` over it to get caves with long walls.
pub fn generate_map(seed: u64, width: i32, height: i32, wall_chance: f64) -> Vec<HexTile> {
    let mut rng = StdRng::seed_from_u64(seed);
    let chance = wall_chance.clamp(0.0, 1.0);
    let mut tiles = Vec::with_capacity((width.max(0) * height.max(0)) as usize);
    for y in 0..height {
        for x in 0..width {
            tiles.push(HexTile::new(x, y, rng.gen_bool(chance)));
        }
    }
    tiles
}

/// A tile becomes floor below the first count and a wall at or above the second
const SMOOTHING_RULE: (usize, usize) = (4, 5);

const NEIGHBOURS: [(i32, i32); 6] = [(1, 0), (0, 1), (1, 1), (-1, 0), (0, -1), (-1, -1)];

/// Cellular-automaton cave smoothing over a map laid out by `generate_map`
///
/// Each pass counts the walls among a tile and its six hex neighbours, with
/// tiles off the map counting as walls. Counts between the rule's bounds keep
/// the tile as it is, and a tile with no walls around it is filled in.
pub fn smooth_map(tiles: &mut [HexTile], width: i32, height: i32, passes: u32) {
    let index = |x: i32, y: i32| {
        ((0..width).contains(&x) && (0..height).contains(&y)).then(|| (y * width + x) as usize)
    };
    for _ in 0..passes {
        let walls: Vec<bool> = tiles.iter().map(|t| t.blocks_los).collect();
        for tile in tiles.iter_mut() {
            let around = NEIGHBOURS
                .iter()
                .filter(|(dx, dy)| match index(tile.x + dx, tile.y + dy) {
                    Some(i) => walls.get(i) == Some(&true),
                    None => true,
                })
                .count();
            let count = around + usize::from(tile.blocks_los);
            if count == 0 || count >= SMOOTHING_RULE.1 {
                tile.blocks_los = true;
            } else if count < SMOOTHING_RULE.0 {
                tile.blocks_los = false;
            }
        }
    }
}

/// Pick the open tile nearest the map centre
///
/// Ties go to the earlier tile. When every tile blocks, the centre is opened.
pub fn pick_viewer(tiles: &mut [HexTile], width: i32, height: i32) -> Option<(i32, i32)> {
    let centre = (width / 2, height / 2);
    let distance = |t: &HexTile| {
        let (dx, dy) = (t.x - centre.0, t.y - centre.1);
        dx * dx + dy * dy - dx * dy
    };
    if let Some(open) = tiles
        .iter()
        .filter(|t| !t.blocks_los)
        .min_by_key(|t| distance(*t))
    {
        return Some((open.x, open.y));
    }
    let tile = tiles.iter_mut().find(|t| (t.x, t.y) == centre)?;
    tile.blocks_los = false;
    Some(centre)
}

/// Sweep the map generated for one seed and sanity-check the result
pub fn check_seed(seed: u64, settings: &RegressionSettings) -> Result<(), RegressionFailure> {
    let mut tiles = generate_map(seed, settings.width, settings.height, settings.wall_chance);
    smooth_map(&mut tiles, settings.width, settings.height, settings.smoothing_passes);
    let fail = |viewer, reason: String| RegressionFailure { seed, viewer, reason };
    let viewer = pick_viewer(&mut tiles, settings.width, settings.height)
        .ok_or_else(|| fail((0, 0), "map has no tiles".to_string()))?;

    let covers = calculate_hex_fov(viewer, &tiles, None).map_err(|e| fail(viewer, e.to_string()))?;
    if covers.len() != tiles.len() {
        return Err(fail(
            viewer,
            format!("{} tiles in, {} covers out", tiles.len(), covers.len()),
        ));
    }
    if let Some(bad) = covers.iter().find(|c| !(0.0..=1.0).contains(&c.cover)) {
        return Err(fail(viewer, format!("cover {} at ({}, {})", bad.cover, bad.x, bad.y)));
    }
    match covers.iter().find(|c| (c.x, c.y) == viewer) {
        Some(TileCover { cover, .. }) if *cover == 0.0 => Ok(()),
        Some(TileCover { cover, .. }) => Err(fail(viewer, format!("viewer's own tile has cover {}", cover))),
        None => Err(fail(viewer, "viewer's tile missing from the output".to_string())),
    }
}

/// Run every seed in the settings
pub fn run_regression(settings: &RegressionSettings) -> RegressionReport {
    let mut report = RegressionReport::default();
    for seed in settings.seeds.clone() {
        debug!(seed, "processing world");
        match check_seed(seed, settings) {
            Ok(()) => report.successes += 1,
            Err(failure) => {
                warn!(seed, viewer = ?failure.viewer, reason = %failure.reason, "regression failure");
                report.failures.push(failure);
            }
        }
    }
    info!(
        successes = report.successes,
        failures = report.failures.len(),
        "regression finished"
    );
    report
}
