use crate::locus::Locus;
use crate::ray::Ray;
use crate::vector::{clockwise_compare, cross, cross_vectors, hex_to_rectangular, rotate, Point, EPSILON};
use std::cmp::Ordering;
use std::f64::consts::PI;

/// One boundary of a sector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Bit used for this side in freshness masks
    pub fn bit(self) -> u8 {
        match self {
            Side::Left => 1,
            Side::Right => 2,
        }
    }
}

/// Which boundary a merge extends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Left,
    Right,
    /// The locus closes the sector on both sides
    Both,
}

impl From<Side> for Boundary {
    fn from(side: Side) -> Self {
        match side {
            Side::Left => Boundary::Left,
            Side::Right => Boundary::Right,
        }
    }
}

/// How much of a locus' footprint falls inside a sector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cover {
    /// The whole footprint is inside; no boundary in particular
    Full,
    /// The footprint lies wholly outside, past the given boundary
    Outside(Side),
    /// The footprint straddles one boundary; the value is the covered fraction
    Partial(Side, f64),
    /// A reflex sector reaches the footprint across both boundaries
    Both { left: f64, right: f64 },
}

impl Cover {
    /// One-sided cover, reported as outside when the fraction is negative
    fn edge(side: Side, value: f64) -> Self {
        if value < 0.0 {
            Cover::Outside(side)
        } else {
            Cover::Partial(side, value)
        }
    }
}

/// Snap a boundary value to exactly 0 or 1 when it is within EPSILON of them
fn snap(value: f64) -> f64 {
    if value > -EPSILON && value < EPSILON {
        0.0
    } else if value > 1.0 - EPSILON {
        1.0
    } else {
        value
    }
}

/// Angular wedge bounded by a left and a right ray
/// Used both for shadows cast by blocking tiles and for the view cone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sector {
    pub left: Ray,
    pub right: Ray,
    /// The wedge spans more than a half turn
    pub reflex: bool,
    /// The wedge covers every direction
    pub world: bool,
}

impl Sector {
    pub fn new(left: Ray, right: Ray, reflex: bool) -> Self {
        Sector {
            left,
            right,
            reflex,
            world: false,
        }
    }

    /// The region outside a view cone of `fov` radians centred on `facing`
    ///
    /// The excluded wedge is `2π - fov` wide and centred on the direction
    /// opposite `facing`; its boundaries are that direction rotated by half
    /// the excluded angle each way.
    pub fn from_facing(facing: (i32, i32), fov: f64) -> Self {
        let excluded = 2.0 * PI - fov;
        let reflex = excluded >= PI;
        let backward = -hex_to_rectangular(facing.0, facing.1);
        let half = excluded / 2.0;
        let left = Ray::from_vector(Point::zeros(), rotate(&backward, half));
        let right = Ray::from_vector(Point::zeros(), rotate(&backward, -half));
        Sector::new(left, right, reflex)
    }

    /// Order sectors clockwise by the direction of their right boundary
    pub fn compare(&self, other: &Sector) -> Ordering {
        clockwise_compare(&self.right.direction, &other.right.direction)
    }

    /// Extend one boundary so that it also runs past `locus`
    ///
    /// The locus must lie on that boundary. Closing both sides turns the
    /// sector into the whole world.
    pub fn merge_locus(&mut self, locus: &Locus, boundary: Boundary) {
        match boundary {
            Boundary::Both => self.world = true,
            Boundary::Left => {
                if cross(&self.right.point, &self.left.point, &locus.normal) <= EPSILON {
                    self.reflex = true;
                }
                self.left = Ray::from_segment(locus.normal, locus.coord + locus.normal);
            }
            Boundary::Right => {
                if cross(&self.left.point, &self.right.point, &-locus.normal) >= -EPSILON {
                    self.reflex = true;
                }
                self.right = Ray::from_segment(-locus.normal, locus.coord - locus.normal);
            }
        }
    }

    /// Join two adjacent sectors that both touch the same locus
    ///
    /// `first_side` is the boundary of `first` the locus straddles; the merged
    /// sector keeps the outer boundary of each.
    pub fn merge_pair(first: &Sector, first_side: Side, second: &Sector) -> Sector {
        let mut reflex = first.reflex || second.reflex;
        let (left, right) = match first_side {
            Side::Left => {
                if !reflex && cross(&first.right.point, &first.left.point, &second.left.point) <= EPSILON {
                    reflex = true;
                }
                (second.left, first.right)
            }
            Side::Right => {
                if !reflex && cross(&second.right.point, &second.left.point, &first.left.point) <= EPSILON {
                    reflex = true;
                }
                (first.left, second.right)
            }
        };
        Sector::new(left, right, reflex)
    }

    /// How much of the locus' footprint lies inside this sector
    pub fn calculate_cover(&self, locus: &Locus) -> Cover {
        if self.world {
            return Cover::Full;
        }
        if !self.reflex {
            // Anything behind the apex line cannot be shadowed
            let n = -(self.right.point + self.left.point) / 2.0;
            if cross(&self.left.point, &self.right.point, &(locus.coord + n)) < 0.0 {
                return Cover::Outside(Side::Right);
            }
        }
        let right = snap(cross_vectors(
            &self.right.direction,
            &(locus.coord - self.right.point * 2.0),
        ));
        if !self.reflex && right < 0.0 {
            return Cover::Outside(Side::Right);
        }
        let left = snap(-cross_vectors(
            &self.left.direction,
            &(locus.coord - self.left.point * 2.0),
        ));

        if !self.reflex {
            if left < 0.0 {
                return Cover::Outside(Side::Left);
            }
            if left < right {
                return Cover::Partial(Side::Left, left);
            }
            if right < 1.0 {
                return Cover::Partial(Side::Right, right);
            }
            return Cover::Full;
        }

        if left < 0.0 && right < 0.0 {
            return Cover::Outside(Side::Right);
        }
        // Boundaries a half turn apart may both touch the footprint
        if self.left.direction.dot(&self.right.direction) < 0.0 {
            if left == 1.0 && right == 1.0 {
                return Cover::Full;
            }
            if left - EPSILON > right {
                return Cover::edge(Side::Left, left);
            }
            if left + EPSILON > right {
                let left_normal = Point::new(-self.left.direction.y, self.left.direction.x);
                if cross(&Point::zeros(), &left_normal, &locus.coord) < 0.0 {
                    return Cover::edge(Side::Left, left);
                }
            }
            return Cover::edge(Side::Right, right);
        }
        if left == 1.0 || right == 1.0 {
            return Cover::Full;
        }
        if left >= 0.0 {
            if right >= 0.0 {
                return Cover::Both { left, right };
            }
            return Cover::Partial(Side::Left, left);
        }
        Cover::Partial(Side::Right, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partial(cover: Cover, side: Side, expected: f64) {
        match cover {
            Cover::Partial(s, v) => {
                assert_eq!(s, side);
                assert!((v - expected).abs() < 1e-9, "expected {}, got {}", expected, v);
            }
            other => panic!("expected partial {:?} cover, got {:?}", side, other),
        }
    }

    #[test]
    fn test_shadow_fully_covers_tile_behind() {
        let blocker = Locus::new(1, 0, true);
        let sector = blocker.to_sector();
        assert_eq!(sector.calculate_cover(&Locus::new(2, 0, false)), Cover::Full);
        assert_eq!(sector.calculate_cover(&Locus::new(3, 0, false)), Cover::Full);
    }

    #[test]
    fn test_shadow_edge_shaves_diagonal_tiles() {
        let sector = Locus::new(1, 0, true).to_sector();
        let shaved = 1.0 - (0.75_f64).sqrt();
        // (1, -1) sits to the right of the shadow, (2, 1) to the left
        assert_partial(sector.calculate_cover(&Locus::new(1, -1, false)), Side::Right, shaved);
        assert_partial(sector.calculate_cover(&Locus::new(2, 1, false)), Side::Left, shaved);
    }

    #[test]
    fn test_shadow_misses_tiles_behind_the_viewer() {
        let sector = Locus::new(1, 0, true).to_sector();
        assert_eq!(
            sector.calculate_cover(&Locus::new(-1, 0, false)),
            Cover::Outside(Side::Right)
        );
    }

    #[test]
    fn test_shadow_misses_tiles_well_to_the_side() {
        let sector = Locus::new(1, 0, true).to_sector();
        assert!(matches!(
            sector.calculate_cover(&Locus::new(0, 2, false)),
            Cover::Outside(_)
        ));
    }

    #[test]
    fn test_world_sector_covers_everything() {
        let mut sector = Locus::new(1, 0, true).to_sector();
        sector.merge_locus(&Locus::new(0, 1, true), Boundary::Both);
        assert!(sector.world);
        assert_eq!(sector.calculate_cover(&Locus::new(-3, 2, false)), Cover::Full);
    }

    #[test]
    fn test_merge_locus_widens_left_boundary() {
        let mut sector = Locus::new(1, 0, true).to_sector();
        let neighbour = Locus::new(1, 1, true);
        let before = sector.calculate_cover(&Locus::new(2, 2, false));
        assert!(matches!(before, Cover::Outside(_)));
        sector.merge_locus(&neighbour, Boundary::Left);
        assert_eq!(sector.left.point, neighbour.normal);
        assert!(!sector.reflex);
        assert_eq!(sector.calculate_cover(&Locus::new(2, 2, false)), Cover::Full);
    }

    #[test]
    fn test_merge_pair_keeps_outer_boundaries() {
        let first = Locus::new(1, 0, true).to_sector();
        let second = Locus::new(0, -1, true).to_sector();
        let merged = Sector::merge_pair(&first, Side::Right, &second);
        assert_eq!(merged.left, first.left);
        assert_eq!(merged.right, second.right);
        let merged = Sector::merge_pair(&first, Side::Left, &second);
        assert_eq!(merged.left, second.left);
        assert_eq!(merged.right, first.right);
    }

    #[test]
    fn test_compare_by_right_direction() {
        let a = Locus::new(1, 0, true).to_sector();
        let b = Locus::new(0, 1, true).to_sector();
        assert_eq!(a.compare(&a), Ordering::Equal);
        assert_eq!(a.compare(&b), b.compare(&a).reverse());
    }

    #[test]
    fn test_half_turn_view_cone_hides_the_back() {
        let sector = Sector::from_facing((1, 0), PI);
        assert!(sector.reflex);
        assert_eq!(sector.calculate_cover(&Locus::new(-1, 0, false)), Cover::Full);
        assert_eq!(sector.calculate_cover(&Locus::new(-2, 0, false)), Cover::Full);
        assert!(matches!(
            sector.calculate_cover(&Locus::new(1, 0, false)),
            Cover::Outside(_)
        ));
    }

    #[test]
    fn test_narrow_view_cone_is_not_reflex() {
        // A wide cone leaves less than a half turn excluded
        let sector = Sector::from_facing((0, 1), 1.5 * PI);
        assert!(!sector.reflex);
        let sector = Sector::from_facing((0, 1), 0.5 * PI);
        assert!(sector.reflex);
    }
}
