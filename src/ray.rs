use crate::vector::Point;

/// Half-line used as a sector boundary
/// Starts at `point` and runs along the unit vector `direction`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Apex of the ray
    pub point: Point,
    /// Unit direction of the ray
    pub direction: Point,
}

impl Ray {
    /// Create a ray starting at p1 and passing through p2
    ///
    /// The direction is `p2 - p1` scaled to unit length. A zero-length segment
    /// has no direction and is rejected.
    pub fn from_segment(p1: Point, p2: Point) -> Self {
        let diff = p2 - p1;
        let length = diff.norm();
        assert!(
            length > 0.0,
            "ray segment from {:?} to {:?} has zero length",
            p1,
            p2
        );
        Ray {
            point: p1,
            direction: diff / length,
        }
    }

    /// Create a ray from an apex and an already normalized direction
    pub fn from_vector(point: Point, direction: Point) -> Self {
        Ray { point, direction }
    }
}
