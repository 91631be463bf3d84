use nalgebra::{Matrix2, Vector2};
use std::cmp::Ordering;

/// A Cartesian position or a free direction
pub type Point = Vector2<f64>;

/// Tolerance used when snapping boundary covers to exactly 0 or 1
pub const EPSILON: f64 = 0.000_000_1;

/// Basis that skews axial hex coordinates into the Cartesian plane
///
/// Rows are `(-sqrt(3/4), sqrt(3/4))` and `(-0.5, -0.5)`. Every tile centre is
/// `hex_basis() * (x, y)`, which puts neighbouring tiles exactly one unit apart.
pub fn hex_basis() -> Matrix2<f64> {
    let sqrt3_4 = (3.0_f64 / 4.0).sqrt();
    Matrix2::new(-sqrt3_4, sqrt3_4, -0.5, -0.5)
}

/// Convert an axial hex coordinate into its Cartesian position
pub fn hex_to_rectangular(x: i32, y: i32) -> Point {
    hex_basis() * Point::new(f64::from(x), f64::from(y))
}

/// Signed doubled area of the triangle (p1, p2, p3)
///
/// Positive when p3 lies to the left of the line running from p1 to p2,
/// negative when it lies to the right, zero when the three are collinear.
pub fn cross(p1: &Point, p2: &Point, p3: &Point) -> f64 {
    (p2.x - p1.x) * (p3.y - p1.y) - (p2.y - p1.y) * (p3.x - p1.x)
}

/// 2D cross product of two free vectors
///
/// Positive when v2 is counter-clockwise of v1.
pub fn cross_vectors(v1: &Point, v2: &Point) -> f64 {
    v1.x * v2.y - v1.y * v2.x
}

/// Rotate `v` counter-clockwise by `theta` radians
pub fn rotate(v: &Point, theta: f64) -> Point {
    let (sin, cos) = (theta.sin(), theta.cos());
    Matrix2::new(cos, -sin, sin, cos) * v
}

/// Order two directions clockwise around the origin
///
/// The right half-plane (`x > 0`) comes first, ordered by descending `y`,
/// followed by everything else ordered by ascending `y`. Two points compare
/// equal only when they fall in the same half and share the same `y`, so the
/// comparison is an angular order only for vectors of equal length.
pub fn clockwise_compare(p1: &Point, p2: &Point) -> Ordering {
    if p1.x > 0.0 {
        if p2.x <= 0.0 {
            return Ordering::Less;
        }
        if p1.y > p2.y {
            return Ordering::Less;
        }
        if p1.y == p2.y {
            return Ordering::Equal;
        }
        return Ordering::Greater;
    }
    if p2.x > 0.0 {
        return Ordering::Greater;
    }
    if p2.y > p1.y {
        return Ordering::Less;
    }
    if p2.y == p1.y {
        return Ordering::Equal;
    }
    Ordering::Greater
}
