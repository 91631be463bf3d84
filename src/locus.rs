use crate::ray::Ray;
use crate::sector::{Sector, Side};
use crate::vector::{clockwise_compare, hex_to_rectangular, Point};
use std::cmp::Ordering;

/// Largest axial offset from the viewer, on either axis
///
/// Keeps `d2` and `distance_2` between any two loci inside `i32`.
pub const MAX_OFFSET: i32 = 1 << 13;

/// A tile seen from the viewer, treated as a circle of diameter 1
/// centred on its Cartesian position
#[derive(Debug, Clone)]
pub struct Locus {
    /// Axial offset from the viewer
    pub x: i32,
    pub y: i32,
    /// Squared hex distance from the viewer
    pub d2: i32,
    /// Cartesian position relative to the viewer
    pub coord: Point,
    /// Half-length vector perpendicular to `coord`, pointing counter-clockwise.
    /// `coord ± normal` are the tangent points of the tile's footprint.
    pub normal: Point,
    pub blocks_los: bool,
    cover_left: f64,
    cover_right: f64,
}

impl Locus {
    /// Create a locus from its offset relative to the viewer
    ///
    /// Both offsets must lie within `±MAX_OFFSET`.
    pub fn new(x: i32, y: i32, blocks_los: bool) -> Self {
        let coord = hex_to_rectangular(x, y);
        let factor = coord.norm() * 2.0;
        // The viewer's own tile has no direction
        let normal = if factor > 0.0 {
            Point::new(-coord.y / factor, coord.x / factor)
        } else {
            Point::zeros()
        };
        Locus {
            x,
            y,
            d2: x * x + y * y - x * y,
            coord,
            normal,
            blocks_los,
            cover_left: 0.0,
            cover_right: 0.0,
        }
    }

    /// Whether this is the viewer's own tile
    pub fn is_origin(&self) -> bool {
        self.d2 == 0
    }

    /// Order by distance, then clockwise among tiles at the same distance
    pub fn compare(&self, other: &Locus) -> Ordering {
        self.d2
            .cmp(&other.d2)
            .then_with(|| clockwise_compare(&self.coord, &other.coord))
    }

    /// Squared hex distance between two loci
    pub fn distance_2(&self, other: &Locus) -> i32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy - dx * dy
    }

    /// The shadow this locus casts when it blocks line of sight
    pub fn to_sector(&self) -> Sector {
        let left = Ray::from_segment(self.normal, self.coord + self.normal);
        let right = Ray::from_segment(-self.normal, self.coord - self.normal);
        Sector::new(left, right, false)
    }

    pub fn cover_left(&self) -> f64 {
        self.cover_left
    }

    pub fn cover_right(&self) -> f64 {
        self.cover_right
    }

    /// Raise the cover accumulated on one side; cover never decreases
    pub fn raise_cover(&mut self, side: Side, value: f64) {
        let slot = match side {
            Side::Left => &mut self.cover_left,
            Side::Right => &mut self.cover_right,
        };
        *slot = slot.max(value.clamp(0.0, 1.0));
    }

    /// Clear accumulated cover (the viewer's own tile)
    pub fn clear_cover(&mut self) {
        self.cover_left = 0.0;
        self.cover_right = 0.0;
    }

    /// Final cover fraction reported for this tile
    pub fn cover(&self) -> f64 {
        (self.cover_right + self.cover_left).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locus_distance() {
        let l = Locus::new(2, -1, false);
        // 4 + 1 + 2
        assert_eq!(l.d2, 7);
        assert_eq!(Locus::new(0, 0, false).distance_2(&l), 7);
        assert!((l.coord.norm_squared() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_distances_fit_at_the_offset_limit() {
        let a = Locus::new(MAX_OFFSET, -MAX_OFFSET, false);
        let b = Locus::new(-MAX_OFFSET, MAX_OFFSET, false);
        assert_eq!(a.d2, 3 * MAX_OFFSET * MAX_OFFSET);
        assert_eq!(a.distance_2(&b), 12 * MAX_OFFSET * MAX_OFFSET);
    }

    #[test]
    fn test_locus_normal_is_perpendicular_half_unit() {
        let l = Locus::new(3, 1, true);
        assert!((l.normal.norm() - 0.5).abs() < 1e-12);
        assert!(l.normal.dot(&l.coord).abs() < 1e-12);
        // counter-clockwise of coord
        assert!(crate::vector::cross_vectors(&l.coord, &l.normal) > 0.0);
    }

    #[test]
    fn test_origin_locus() {
        let l = Locus::new(0, 0, false);
        assert!(l.is_origin());
        assert_eq!(l.normal, Point::zeros());
        assert_eq!(l.cover(), 0.0);
    }

    #[test]
    fn test_locus_compare_distance_first() {
        let near = Locus::new(1, 0, false);
        let far = Locus::new(2, 0, false);
        assert_eq!(near.compare(&far), Ordering::Less);
        assert_eq!(far.compare(&near), Ordering::Greater);
        assert_eq!(near.compare(&Locus::new(1, 0, true)), Ordering::Equal);
    }

    #[test]
    fn test_cover_is_monotonic_and_capped() {
        let mut l = Locus::new(1, 0, false);
        l.raise_cover(Side::Left, 0.4);
        l.raise_cover(Side::Left, 0.2);
        assert_eq!(l.cover_left(), 0.4);
        l.raise_cover(Side::Right, 0.9);
        assert_eq!(l.cover(), 1.0);
    }

    #[test]
    fn test_to_sector_rays_run_parallel_to_coord() {
        let l = Locus::new(1, 0, true);
        let sector = l.to_sector();
        let dir = l.coord / l.coord.norm();
        assert!((sector.left.direction - dir).norm() < 1e-12);
        assert!((sector.right.direction - dir).norm() < 1e-12);
        assert_eq!(sector.left.point, l.normal);
        assert_eq!(sector.right.point, -l.normal);
        assert!(!sector.reflex);
    }
}
