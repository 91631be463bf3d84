use crate::active::{ActiveSectors, Freshness, RingScan};
use crate::locus::{Locus, MAX_OFFSET};
use crate::sector::{Boundary, Cover, Sector, Side};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// View-cone cover above this counts as entirely out of view (about cos 30°)
pub const VIEW_CERTAINTY: f64 = 0.866;

/// A tile handed to the sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexTile {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub blocks_los: bool,
}

impl HexTile {
    pub fn new(x: i32, y: i32, blocks_los: bool) -> Self {
        HexTile { x, y, blocks_los }
    }
}

/// Visibility result for one tile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileCover {
    pub x: i32,
    pub y: i32,
    /// Fraction of the tile hidden from the viewer, 0 = fully visible
    pub cover: f64,
    /// Squared hex distance from the viewer
    pub d2: i32,
}

/// Limited field of view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewCone {
    /// Axial direction the viewer faces
    pub facing: (i32, i32),
    /// Width of the visible cone in radians; 0 means no restriction
    pub fov: f64,
}

impl ViewCone {
    pub fn new(facing: (i32, i32), fov: f64) -> Self {
        ViewCone { facing, fov }
    }

    pub fn is_restricted(&self) -> bool {
        self.fov != 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FovError {
    #[error("tile ({x}, {y}) appears more than once")]
    DuplicateTile { x: i32, y: i32 },
    #[error("tile ({x}, {y}) is more than {} steps from the viewer along an axis", MAX_OFFSET)]
    OutOfRange { x: i32, y: i32 },
    #[error("shadow sectors around tile ({x}, {y}) disagree: {detail}")]
    InconsistentSplit { x: i32, y: i32, detail: String },
}

/// One classified tile, with everything classified so far
#[derive(Debug, Clone)]
pub struct SweepStep {
    pub tile: TileCover,
    pub covers: Vec<TileCover>,
    /// Absolute coordinate of the tile the next step classifies
    pub next: Option<(i32, i32)>,
}

/// Which way a scan walks the sector ring once the first miss picks a side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Heading {
    Undecided,
    Backward,
    Forward,
}

impl Heading {
    fn offset(self) -> isize {
        match self {
            Heading::Undecided => 0,
            Heading::Backward => -1,
            Heading::Forward => 1,
        }
    }
}

/// Compute the cover of every tile in `world` as seen from `viewer`
///
/// Tiles are classified nearest first, clockwise within each distance ring,
/// and returned in that order.
pub fn calculate_hex_fov(
    viewer: (i32, i32),
    world: &[HexTile],
    view: Option<ViewCone>,
) -> Result<Vec<TileCover>, FovError> {
    Sweep::new(viewer, world, view)?.finish()
}

/// Stepwise shadow sweep over one snapshot of tiles
#[derive(Debug)]
pub struct Sweep {
    viewer: (i32, i32),
    /// Farthest first, so the nearest tile pops off the end
    pending: Vec<Locus>,
    processed: Vec<Locus>,
    active: ActiveSectors,
    ring: RingScan,
    view: Option<ViewCone>,
}

impl Sweep {
    pub fn new(
        viewer: (i32, i32),
        world: &[HexTile],
        view: Option<ViewCone>,
    ) -> Result<Self, FovError> {
        let mut seen = HashSet::with_capacity(world.len());
        for tile in world {
            if !seen.insert((tile.x, tile.y)) {
                return Err(FovError::DuplicateTile { x: tile.x, y: tile.y });
            }
        }

        let mut pending = world
            .iter()
            .map(|t| offset_locus(viewer, t))
            .collect::<Result<Vec<_>, _>>()?;
        pending.sort_by(|a, b| b.compare(a));

        // The viewer always sees their own tile
        let mut processed = Vec::with_capacity(pending.len());
        while let Some(mut locus) = pending.pop() {
            if !locus.is_origin() {
                pending.push(locus);
                break;
            }
            locus.clear_cover();
            processed.push(locus);
        }

        debug!(viewer = ?viewer, tiles = world.len(), "starting hex fov sweep");
        Ok(Sweep {
            viewer,
            pending,
            processed,
            active: ActiveSectors::new(),
            ring: RingScan::new(),
            view,
        })
    }

    /// Classify the next tile; `None` once every tile is done
    ///
    /// The view cone is not applied here, only by `finish`.
    pub fn step(&mut self) -> Result<Option<TileCover>, FovError> {
        let Some(mut locus) = self.pending.pop() else {
            return Ok(None);
        };
        self.ring = self.ring.enter(locus.d2, &mut self.active);

        let touched = self.classify(&mut locus)?;
        if !touched && locus.blocks_los {
            let id = self.active.insert(locus.to_sector(), Freshness::BOTH);
            debug!(sector = id, x = locus.x, y = locus.y, "new shadow sector");
        }
        self.check_shape();

        trace!(
            x = locus.x,
            y = locus.y,
            d2 = locus.d2,
            left = locus.cover_left(),
            right = locus.cover_right(),
            sectors = self.active.len(),
            "classified tile"
        );
        let tile = self.tile_cover(&locus);
        self.processed.push(locus);
        Ok(Some(tile))
    }

    /// Covers of every tile classified so far
    pub fn snapshot(&self) -> Vec<TileCover> {
        self.processed.iter().map(|l| self.tile_cover(l)).collect()
    }

    /// Absolute coordinate of the next tile to classify
    pub fn next_offset(&self) -> Option<(i32, i32)> {
        self.pending
            .last()
            .map(|l| (l.x + self.viewer.0, l.y + self.viewer.1))
    }

    pub fn active_sectors(&self) -> &ActiveSectors {
        &self.active
    }

    /// Classify the remaining tiles, apply the view cone and return every cover
    pub fn finish(mut self) -> Result<Vec<TileCover>, FovError> {
        while self.step()?.is_some() {}
        if let Some(view) = self.view.filter(ViewCone::is_restricted) {
            overlay_view_cone(&mut self.processed, &view);
        }
        debug!(
            tiles = self.processed.len(),
            sectors = self.active.len(),
            "hex fov sweep finished"
        );
        Ok(self.snapshot())
    }

    fn tile_cover(&self, locus: &Locus) -> TileCover {
        TileCover {
            x: locus.x + self.viewer.0,
            y: locus.y + self.viewer.1,
            cover: locus.cover(),
            d2: locus.d2,
        }
    }

    /// Scan the active sectors for the one shadowing `locus`
    ///
    /// Returns whether any sector touched the locus.
    fn classify(&mut self, locus: &mut Locus) -> Result<bool, FovError> {
        let mut heading = Heading::Undecided;
        for _ in 0..self.active.len() {
            let index = self.ring.cursor;
            let entry = self.active.get(index);
            let (id, fresh, reflex) = (entry.id, entry.fresh, entry.sector.reflex);
            match entry.sector.calculate_cover(locus) {
                Cover::Both { left, right } => {
                    locus.raise_cover(Side::Right, fresh.credit(left, Side::Left.bit()));
                    locus.raise_cover(Side::Left, fresh.credit(right, Side::Right.bit()));
                    if locus.blocks_los && reflex {
                        self.active
                            .get_mut(index)
                            .sector
                            .merge_locus(locus, Boundary::Both);
                        debug!(sector = id, x = locus.x, y = locus.y, "shadow closed around viewer");
                    }
                    return Ok(true);
                }
                Cover::Full => {
                    locus.raise_cover(Side::Right, 1.0);
                    return Ok(true);
                }
                Cover::Partial(side, value) if value == 1.0 => {
                    let credited = match side {
                        Side::Left => Side::Right,
                        Side::Right => Side::Left,
                    };
                    locus.raise_cover(credited, 1.0);
                    return Ok(true);
                }
                Cover::Partial(side, value) => {
                    self.split(locus, index, side, value, heading)?;
                    return Ok(true);
                }
                Cover::Outside(side) => {
                    match (heading, side) {
                        (Heading::Undecided, Side::Left) => heading = Heading::Backward,
                        (Heading::Undecided, Side::Right) => heading = Heading::Forward,
                        (Heading::Backward, Side::Right) | (Heading::Forward, Side::Left) => break,
                        _ => {}
                    }
                    self.ring.cursor = self.active.wrap(index as isize + heading.offset());
                }
            }
        }
        Ok(false)
    }

    /// Credit a locus straddling one boundary of the sector at `index`
    ///
    /// The neighbouring sector on that side supplies the cover of the other
    /// boundary. A blocking locus widens the sector, or joins it with the
    /// neighbour when both reach it.
    fn split(
        &mut self,
        locus: &mut Locus,
        index: usize,
        side: Side,
        value: f64,
        heading: Heading,
    ) -> Result<(), FovError> {
        let neighbour = if self.active.len() > 1 {
            match (side, heading) {
                (Side::Left, h) if h != Heading::Forward => Some(self.active.wrap(index as isize - 1)),
                (_, h) if h != Heading::Backward => Some(self.active.wrap(index as isize + 1)),
                _ => None,
            }
        } else {
            None
        };

        let mut other = 0.0;
        let mut joinable = None;
        if let Some(n) = neighbour {
            let entry = self.active.get(n);
            let (theirs, bits, touches) = match entry.sector.calculate_cover(locus) {
                Cover::Full => (1.0, 0, true),
                Cover::Partial(s, v) if s == side => {
                    return Err(inconsistent(locus, format!("both sectors claim the {:?} boundary ({})", s, v)));
                }
                Cover::Partial(s, v) => (v, s.bit(), true),
                Cover::Outside(s) => (0.0, s.bit(), false),
                Cover::Both { .. } => {
                    return Err(inconsistent(locus, "neighbouring sector covers both boundaries".to_string()));
                }
            };
            other = entry.fresh.credit(theirs, bits);
            if touches {
                joinable = Some(n);
            }
        }

        let fresh = self.active.get(index).fresh;
        let own = fresh.credit(value, side.bit());
        match side {
            Side::Right => {
                locus.raise_cover(Side::Right, own);
                locus.raise_cover(Side::Left, other);
            }
            Side::Left => {
                locus.raise_cover(Side::Left, own);
                locus.raise_cover(Side::Right, other);
            }
        }

        if !locus.blocks_los {
            return Ok(());
        }
        match joinable {
            Some(n) => self.join(index, side, n),
            None => {
                let entry = self.active.get_mut(index);
                entry.sector.merge_locus(locus, side.into());
                entry.fresh.mark(side);
                debug!(sector = entry.id, x = locus.x, y = locus.y, side = ?side, "shadow widened");
            }
        }
        Ok(())
    }

    /// Replace the sectors at `index` and `n` with their union
    fn join(&mut self, index: usize, side: Side, n: usize) {
        let first = self.active.get(index);
        let second = self.active.get(n);
        let merged = Sector::merge_pair(&first.sector, side, &second.sector);
        let fresh = first.fresh.union(second.fresh);
        let (first_id, second_id) = (first.id, second.id);

        let id = self.active.replace(index, merged, fresh);
        self.active.remove(n);
        // The scan resumes one slot before the merged one, counted before the removal
        let resume = self.active.get(self.active.wrap(index as isize - 1)).id;
        self.ring.cursor = self.active.sort_tracking(resume).unwrap_or(0);
        debug!(sector = id, from = first_id, with = second_id, "shadows joined");
    }

    fn check_shape(&self) {
        let reflex = self.active.reflex_count();
        if reflex > 1 {
            warn!(reflex, sectors = self.active.len(), "more than one reflex shadow");
        }
        if self.active.has_world() && self.active.len() != 1 {
            warn!(sectors = self.active.len(), "world shadow shares the ring with other sectors");
        }
        if !self.active.has_distinct_keys() {
            warn!(sectors = self.active.len(), "two shadows share a right boundary");
        }
    }
}

impl Iterator for Sweep {
    type Item = Result<SweepStep, FovError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.step() {
            Ok(Some(tile)) => Some(Ok(SweepStep {
                tile,
                covers: self.snapshot(),
                next: self.next_offset(),
            })),
            Ok(None) => None,
            Err(e) => {
                // A failed sweep cannot continue
                self.pending.clear();
                Some(Err(e))
            }
        }
    }
}

/// Locus for `tile` relative to `viewer`, rejecting tiles too far away
fn offset_locus(viewer: (i32, i32), tile: &HexTile) -> Result<Locus, FovError> {
    let offset = |a: i32, b: i32| {
        i32::try_from(i64::from(a) - i64::from(b))
            .ok()
            .filter(|d| d.abs() <= MAX_OFFSET)
    };
    match (offset(tile.x, viewer.0), offset(tile.y, viewer.1)) {
        (Some(x), Some(y)) => Ok(Locus::new(x, y, tile.blocks_los)),
        _ => Err(FovError::OutOfRange { x: tile.x, y: tile.y }),
    }
}

fn inconsistent(locus: &Locus, detail: String) -> FovError {
    FovError::InconsistentSplit {
        x: locus.x,
        y: locus.y,
        detail,
    }
}

/// Snap view-cone cover that is almost certain to fully hidden
fn view_certainty(value: f64) -> f64 {
    if value > VIEW_CERTAINTY {
        1.0
    } else {
        value.max(0.0)
    }
}

/// Hide whatever lies outside the view cone, never lowering existing cover
fn overlay_view_cone(loci: &mut [Locus], view: &ViewCone) {
    let sector = Sector::from_facing(view.facing, view.fov);
    for locus in loci.iter_mut().filter(|l| !l.is_origin()) {
        let (left, right) = match sector.calculate_cover(locus) {
            Cover::Both { left, right } => (left, right),
            Cover::Full => (1.0, 1.0),
            Cover::Partial(Side::Left, v) => (v, 0.0),
            Cover::Partial(Side::Right, v) => (0.0, v),
            Cover::Outside(_) => (0.0, 0.0),
        };
        locus.raise_cover(Side::Left, view_certainty(left));
        locus.raise_cover(Side::Right, view_certainty(right));
    }
}
